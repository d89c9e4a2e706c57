//! Session scheduler.
//!
//! One tokio task per session owns the controller and drives it from two
//! intervals (200 ms face sampling, 1000 ms session ticks) plus the location
//! feed and user commands. Cancel pauses both timers until sampling is
//! resumed. Shutdown stops every timer and hands the controller back, so
//! nothing can touch the session afterwards.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use checkpoint_common::constants::{FACE_SAMPLE_INTERVAL_MS, SESSION_TICK_MS};
use checkpoint_common::{GeoPoint, LocationError, StartRejection};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};

use crate::controller::{AttendanceSessionController, SessionSnapshot};
use crate::location::LocationRequest;

/// Updates pushed by the location provider
pub type LocationUpdate = Result<GeoPoint, LocationError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("start rejected: {0}")]
    Rejected(#[from] StartRejection),

    #[error("session runtime has stopped")]
    Stopped,

    #[error("session task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

enum Command {
    Start(oneshot::Sender<Result<(), StartRejection>>),
    Cancel(oneshot::Sender<()>),
    Resume(oneshot::Sender<()>),
}

pub struct SessionRuntime;

impl SessionRuntime {
    /// Move `controller` into a new task. The initial precise location
    /// request, and any fallback the tracker asks for, go out on `requests`.
    pub fn spawn(
        controller: AttendanceSessionController,
        locations: mpsc::Receiver<LocationUpdate>,
        requests: mpsc::Sender<LocationRequest>,
    ) -> SessionHandle {
        let (command_tx, command_rx) = mpsc::channel(8);
        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let (snapshot_tx, snapshot_rx) = watch::channel(controller.snapshot());
        let stopped = Arc::new(AtomicBool::new(false));

        let task = tokio::spawn(session_loop(
            controller,
            command_rx,
            locations,
            requests,
            snapshot_tx,
            stopped.clone(),
            shutdown_rx,
        ));

        SessionHandle {
            commands: command_tx,
            snapshot: snapshot_rx,
            stopped,
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Caller side of a running session
pub struct SessionHandle {
    commands: mpsc::Sender<Command>,
    snapshot: watch::Receiver<SessionSnapshot>,
    stopped: Arc<AtomicBool>,
    shutdown: oneshot::Sender<()>,
    task: JoinHandle<AttendanceSessionController>,
}

impl SessionHandle {
    /// Begin an attempt. The first countdown step lands one full tick later.
    pub async fn start(&self) -> Result<(), RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Start(reply_tx))
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        reply_rx.await.map_err(|_| RuntimeError::Stopped)??;
        Ok(())
    }

    /// Abort the attempt and pause both timers. Stability stays frozen
    /// until `resume_sampling`.
    pub async fn cancel(&self) -> Result<(), RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Cancel(reply_tx))
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        reply_rx.await.map_err(|_| RuntimeError::Stopped)
    }

    /// Re-arm the timers after a cancel. The first sample lands one full
    /// period later.
    pub async fn resume_sampling(&self) -> Result<(), RuntimeError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Command::Resume(reply_tx))
            .await
            .map_err(|_| RuntimeError::Stopped)?;
        reply_rx.await.map_err(|_| RuntimeError::Stopped)
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that wakes on every state change
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Stop all timers and take the controller back
    pub async fn shutdown(self) -> Result<AttendanceSessionController, RuntimeError> {
        self.stopped.store(true, Ordering::SeqCst);
        let _ = self.shutdown.send(());
        let controller = self.task.await?;
        tracing::debug!("Session runtime stopped");
        Ok(controller)
    }
}

async fn session_loop(
    mut controller: AttendanceSessionController,
    mut commands: mpsc::Receiver<Command>,
    mut locations: mpsc::Receiver<LocationUpdate>,
    requests: mpsc::Sender<LocationRequest>,
    snapshot: watch::Sender<SessionSnapshot>,
    stopped: Arc<AtomicBool>,
    mut shutdown: oneshot::Receiver<()>,
) -> AttendanceSessionController {
    let face_period = Duration::from_millis(FACE_SAMPLE_INTERVAL_MS);
    let session_period = Duration::from_millis(SESSION_TICK_MS);
    let mut face_timer = interval_at(Instant::now() + face_period, face_period);
    let mut session_timer = interval_at(Instant::now() + session_period, session_period);
    face_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    session_timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut locations_open = true;
    let mut sampling = true;

    forward_request(&requests, controller.initial_location_request());
    tracing::info!(
        simulation_mode = controller.simulation_mode(),
        "🎬 Session runtime started"
    );

    loop {
        tokio::select! {
            biased;

            _ = &mut shutdown => break,

            command = commands.recv() => match command {
                Some(Command::Start(reply)) => {
                    let result = controller.start();
                    if result.is_ok() {
                        session_timer.reset();
                    }
                    let _ = reply.send(result);
                }
                Some(Command::Cancel(reply)) => {
                    sampling = false;
                    controller.cancel();
                    let _ = reply.send(());
                }
                Some(Command::Resume(reply)) => {
                    if !sampling {
                        face_timer.reset();
                        session_timer.reset();
                        sampling = true;
                        tracing::debug!("Sampling resumed");
                    }
                    let _ = reply.send(());
                }
                // Handle dropped without shutdown
                None => break,
            },

            update = locations.recv(), if locations_open => match update {
                Some(update) => {
                    if let Some(request) = controller.on_location(update) {
                        forward_request(&requests, request);
                    }
                }
                None => {
                    tracing::debug!("Location feed closed, keeping last fix");
                    locations_open = false;
                }
            },

            _ = face_timer.tick(), if sampling => {
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
                controller.on_face_tick();
            }

            _ = session_timer.tick(), if sampling => {
                if stopped.load(Ordering::SeqCst) {
                    break;
                }
                controller.on_session_tick();
            }
        }

        snapshot.send_if_modified(|current| {
            let next = controller.snapshot();
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    controller
}

fn forward_request(requests: &mpsc::Sender<LocationRequest>, request: LocationRequest) {
    if let Err(e) = requests.try_send(request) {
        tracing::warn!(
            high_accuracy = request.high_accuracy,
            error = %e,
            "Location request not delivered"
        );
    }
}
