//! # Checkpoint - attendance check-in driver
//!
//! Runs one check-in session from the command line: a fixed location fix,
//! the synthetic face signal, and the configured sites. Prints the signed
//! attendance record on success.

use anyhow::{Context, Result, bail};
use clap::Parser;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod config;

use checkpoint::challenge::ChallengeSelector;
use checkpoint::location::LocationRequest;
use checkpoint::session::LivenessSessionMachine;
use checkpoint::signal::SyntheticSource;
use checkpoint::submit::LogSubmitter;
use checkpoint::{
    AttendanceSessionController, LocationUpdate, RuntimeError, SessionHandle, SessionRuntime,
};
use checkpoint_common::constants::DEFAULT_CONFIG_PATH;
use checkpoint_common::{GeoPoint, SessionState};
use crate::config::AppConfig;

/// Checkpoint - geofenced liveness check-in
#[derive(Parser, Debug)]
#[command(name = "checkpoint")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: String,

    /// Latitude of the simulated fix (defaults to the first site's centre)
    #[arg(long, allow_negative_numbers = true, requires = "lon")]
    lat: Option<f64>,

    /// Longitude of the simulated fix
    #[arg(long, allow_negative_numbers = true, requires = "lat")]
    lon: Option<f64>,

    /// Reported accuracy of the simulated fix, in meters
    #[arg(long)]
    accuracy: Option<f64>,

    /// Attempts before giving up
    #[arg(short, long, default_value = "3")]
    attempts: u32,

    /// Seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Subject identifier (overrides config)
    #[arg(short, long, env = "CHECKPOINT_SUBJECT")]
    subject: Option<String>,

    /// Signing key file (overrides config)
    #[arg(long, env = "CHECKPOINT_SIGNING_KEY")]
    signing_key: Option<String>,

    /// Action pass rate (overrides config)
    #[arg(long)]
    pass_rate: Option<f64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: String,

    /// Enable JSON logging output
    #[arg(long, default_value = "false")]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    init_logging(&args.log_level, args.json_logs)?;

    info!("🛂 Starting Checkpoint v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::load(&args.config, &args)?;
    let settings = config.validate().context("Invalid configuration")?;
    info!(
        "📋 Configuration loaded from {} ({} sites)",
        args.config,
        settings.sites.sites().len()
    );

    let fix = match (args.lat, args.lon) {
        (Some(lat), Some(lon)) => GeoPoint::new(lat, lon),
        _ => {
            let site = &settings.sites.sites()[0];
            GeoPoint::new(site.center.latitude, site.center.longitude)
        }
    };
    let fix = match args.accuracy {
        Some(accuracy) => fix.with_accuracy(accuracy),
        None => fix,
    };

    let (source, rng): (SyntheticSource, Box<dyn RngCore + Send>) = match args.seed {
        Some(seed) => (
            SyntheticSource::seeded(seed),
            Box::new(StdRng::seed_from_u64(seed)),
        ),
        None => (SyntheticSource::new(), Box::new(StdRng::from_os_rng())),
    };

    let machine =
        LivenessSessionMachine::new(ChallengeSelector::standard(), Box::new(settings.verifier));
    let mut controller = AttendanceSessionController::new(
        settings.sites,
        machine,
        Box::new(source),
        settings.signer,
        Arc::new(LogSubmitter),
    )
    .with_rng(rng);
    if let Some(subject) = settings.subject_id {
        controller = controller.with_subject(subject);
    }
    info!("🔑 Signing as {}", controller.signer_public_key());
    tracing::warn!("No face sensor attached, running in simulation mode");

    let (location_tx, location_rx) = mpsc::channel(4);
    let (request_tx, request_rx) = mpsc::channel(4);
    let handle = SessionRuntime::spawn(controller, location_rx, request_tx);
    tokio::spawn(fixed_location(fix, request_rx, location_tx));

    let verified = tokio::select! {
        result = run_attempts(&handle, args.attempts) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("🛑 Shutdown signal received");
            Ok(false)
        }
    };

    let controller = handle.shutdown().await.context("Session runtime failed")?;
    match (verified?, controller.last_record()) {
        (true, Some(record)) => {
            let json =
                serde_json::to_string_pretty(record).context("Failed to encode attendance record")?;
            println!("{json}");
            info!("✅ Check-in complete");
        }
        _ => info!("👋 No attendance recorded"),
    }

    Ok(())
}

/// Answer every location request with the same fix
async fn fixed_location(
    fix: GeoPoint,
    mut requests: mpsc::Receiver<LocationRequest>,
    updates: mpsc::Sender<LocationUpdate>,
) {
    while let Some(request) = requests.recv().await {
        tracing::debug!(high_accuracy = request.high_accuracy, "Location requested");
        if updates.send(Ok(fix)).await.is_err() {
            break;
        }
    }
}

/// Start attempts as soon as the engine accepts them. Returns true once an
/// attempt succeeds, false when every attempt failed.
async fn run_attempts(handle: &SessionHandle, attempts: u32) -> Result<bool> {
    let mut changes = handle.subscribe();
    let mut started = 0;
    let mut last_prompt = String::new();
    let mut last_geofence = None;

    loop {
        let snapshot = changes.borrow_and_update().clone();
        if snapshot.geofence_message != last_geofence {
            if let Some(message) = &snapshot.geofence_message {
                info!("📍 {message}");
            }
            last_geofence = snapshot.geofence_message.clone();
        }
        if snapshot.prompt != last_prompt {
            info!("📣 {}", snapshot.prompt);
            last_prompt = snapshot.prompt.clone();
        }

        match snapshot.state {
            SessionState::Succeeded { .. } => return Ok(true),
            SessionState::Idle if started < attempts => match handle.start().await {
                Ok(()) => {
                    started += 1;
                    info!(attempt = started, of = attempts, "▶️ Attempt started");
                }
                Err(RuntimeError::Rejected(rejection)) if rejection.is_retryable() => {
                    tracing::debug!(rejection = %rejection, "Waiting before start");
                }
                Err(RuntimeError::Rejected(rejection)) => bail!("Cannot check in: {rejection}"),
                Err(e) => return Err(e.into()),
            },
            SessionState::Idle => {
                tracing::warn!(attempts = attempts, "All attempts failed");
                return Ok(false);
            }
            _ => {}
        }

        changes.changed().await.context("Session runtime stopped")?;
    }
}

/// Initialize structured logging with tracing
fn init_logging(level: &str, json: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_thread_ids(true))
            .init();
    }

    Ok(())
}
