//! Hand-off of signed records to the outside world.
//!
//! Delivery and retry belong to the submitter; the engine calls `submit`
//! exactly once per successful attempt and never waits on it.

use tokio::sync::mpsc;

use crate::signing::SignedAttendanceRecord;

pub trait AttendanceSubmitter: Send + Sync {
    fn submit(&self, record: SignedAttendanceRecord);
}

/// Forwards records to an async consumer
pub struct ChannelSubmitter {
    tx: mpsc::UnboundedSender<SignedAttendanceRecord>,
}

impl ChannelSubmitter {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<SignedAttendanceRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl AttendanceSubmitter for ChannelSubmitter {
    fn submit(&self, record: SignedAttendanceRecord) {
        let record_id = record.record.record_id().to_string();
        if self.tx.send(record).is_err() {
            tracing::error!(record_id = %record_id, "Attendance consumer is gone, record dropped");
        }
    }
}

/// Writes the record JSON to the log
pub struct LogSubmitter;

impl AttendanceSubmitter for LogSubmitter {
    fn submit(&self, record: SignedAttendanceRecord) {
        match serde_json::to_string(&record) {
            Ok(json) => tracing::info!(
                record_id = record.record.record_id(),
                record = %json,
                "Attendance record ready"
            ),
            Err(e) => tracing::error!(error = %e, "Failed to encode attendance record"),
        }
    }
}
