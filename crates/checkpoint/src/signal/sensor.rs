//! Sensor-backed face presence.

use tokio::sync::mpsc::Receiver;
use tokio::sync::mpsc::error::TryRecvError;

use super::{FaceGuide, FaceObservation, FaceSample, FaceSignalSource, SignalKind, SourcePoll};

/// Adapts an external detector feed. Each poll drains the channel and keeps
/// only the newest observation.
pub struct SensorSource {
    feed: Receiver<FaceObservation>,
    guide: Option<FaceGuide>,
    closed: bool,
}

impl SensorSource {
    pub fn new(feed: Receiver<FaceObservation>) -> Self {
        Self {
            feed,
            guide: None,
            closed: false,
        }
    }

    /// Require reported regions to sit inside the capture guide
    pub fn with_guide(mut self, guide: FaceGuide) -> Self {
        self.guide = Some(guide);
        self
    }

    fn to_sample(&self, observation: &FaceObservation) -> FaceSample {
        let aligned = match (&self.guide, &observation.region) {
            (Some(guide), Some(region)) => guide.assess(std::slice::from_ref(region)).is_aligned(),
            _ => true,
        };
        FaceSample {
            present: observation.present && aligned,
        }
    }
}

impl FaceSignalSource for SensorSource {
    fn next_sample(&mut self) -> SourcePoll {
        if self.closed {
            return SourcePoll::Lost;
        }

        let mut latest = None;
        loop {
            match self.feed.try_recv() {
                Ok(observation) => latest = Some(observation),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.closed = true;
                    break;
                }
            }
        }

        match latest {
            Some(observation) => SourcePoll::Sample(self.to_sample(&observation)),
            None if self.closed => SourcePoll::Lost,
            None => SourcePoll::Idle,
        }
    }

    fn kind(&self) -> SignalKind {
        SignalKind::Sensor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::FaceRegion;
    use tokio::sync::mpsc;

    #[test]
    fn newest_observation_wins() {
        let (tx, rx) = mpsc::channel(8);
        let mut source = SensorSource::new(rx);

        assert_eq!(source.next_sample(), SourcePoll::Idle);

        tx.try_send(FaceObservation::absent()).unwrap();
        tx.try_send(FaceObservation::present()).unwrap();
        assert_eq!(
            source.next_sample(),
            SourcePoll::Sample(FaceSample { present: true })
        );
        assert_eq!(source.next_sample(), SourcePoll::Idle);
    }

    #[test]
    fn closed_feed_is_lost_after_draining() {
        let (tx, rx) = mpsc::channel(8);
        let mut source = SensorSource::new(rx);

        tx.try_send(FaceObservation::present()).unwrap();
        drop(tx);

        assert!(matches!(source.next_sample(), SourcePoll::Sample(_)));
        assert_eq!(source.next_sample(), SourcePoll::Lost);
        assert_eq!(source.next_sample(), SourcePoll::Lost);
    }

    #[test]
    fn misaligned_region_counts_as_absent() {
        let (tx, rx) = mpsc::channel(8);
        let guide = FaceGuide::new(FaceRegion {
            x: 0.0,
            y: 0.0,
            width: 280.0,
            height: 360.0,
        });
        let mut source = SensorSource::new(rx).with_guide(guide);

        // Far too small: user is too far from the camera
        tx.try_send(FaceObservation {
            present: true,
            region: Some(FaceRegion {
                x: 120.0,
                y: 160.0,
                width: 40.0,
                height: 40.0,
            }),
        })
        .unwrap();
        assert_eq!(
            source.next_sample(),
            SourcePoll::Sample(FaceSample { present: false })
        );

        tx.try_send(FaceObservation {
            present: true,
            region: Some(FaceRegion {
                x: 40.0,
                y: 60.0,
                width: 200.0,
                height: 240.0,
            }),
        })
        .unwrap();
        assert_eq!(
            source.next_sample(),
            SourcePoll::Sample(FaceSample { present: true })
        );
    }
}
