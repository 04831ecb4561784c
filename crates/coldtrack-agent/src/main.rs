mod board;
mod config;
mod diagnostics;
mod downlink;
mod source;
mod worker;

use coldtrack_domain::TransportOption;
use coldtrack_mqtt::{MqttIngestClient, MqttTuning};
use coldtrack_runner::Runner;
use downlink::CommandDownlinkHandler;
use source::{DeviceProfile, ProfileSnapshotSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use worker::{TelemetryWorker, WorkerSettings};

fn banner() {
    println!();
    println!("     ****");
    println!(
        "    **  **     coldtrack telemetry agent, version {}",
        env!("CARGO_PKG_VERSION")
    );
    println!("   **    **    container tracking uplink with downlink commands");
    println!("  ** ==== **");
    println!();
}

/// Transport options derived from configuration. A missing or unreadable
/// certificate bundle only costs the option, not the worker.
fn transport_options(config: &config::AgentConfig) -> Vec<TransportOption> {
    let mut options = Vec::new();
    if let Some(path) = &config.trusted_certs_path {
        match std::fs::read(path) {
            Ok(pem) => options.push(TransportOption::TrustedCerts(pem)),
            Err(e) => warn!(path = %path, error = %e, "trusted certs not readable, continuing without"),
        }
    }
    if let Some(tag) = &config.product_info {
        options.push(TransportOption::ProductInfo(tag.clone()));
    }
    options.push(TransportOption::MinimumPollingTime(Duration::from_secs(
        config.minimum_polling_secs,
    )));
    options
}

#[tokio::main]
async fn main() {
    banner();

    let config = match config::AgentConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    let tuning = MqttTuning {
        pump_budget: Duration::from_millis(config.pump_budget_ms),
        ..MqttTuning::default()
    };
    let transport = match MqttIngestClient::connect(&config.connection_string, tuning) {
        Ok(transport) => transport,
        Err(e) => {
            error!(error = %e, "failed to create transport handle");
            std::process::exit(1);
        }
    };
    let device_id = transport.descriptor().device_id.clone();

    let board = match board::build_board(&config.board) {
        Ok(board) => board,
        Err(e) => {
            error!(error = %e, "failed to set up sensor board");
            std::process::exit(1);
        }
    };
    let profile = DeviceProfile {
        latitude: config.latitude,
        longitude: config.longitude,
        geofence_id: config.geofence_id,
        battery_voltage: config.battery_voltage,
        network: config.network.clone(),
        signal_strength: config.signal_strength,
        heater_bias_c: config.heater_bias_c,
    };
    let settings = WorkerSettings {
        device_id: device_id.clone(),
        cycle_interval: Duration::from_secs(config.cycle_interval_secs),
        options: transport_options(&config),
        diagnostics_enabled: config.diagnostics_enabled,
    };

    info!(device_id = %device_id, board = %config.board, "starting coldtrack agent");

    let mut worker = TelemetryWorker::new(
        ProfileSnapshotSource::new(board, profile),
        transport,
        Arc::new(CommandDownlinkHandler::new(config.max_downlink_copy_bytes)),
        settings,
    );

    Runner::new()
        .with_worker(move |ctx| async move { worker.run(ctx).await })
        .with_closer(|| async move {
            info!("agent shut down");
            Ok(())
        })
        .with_closer_timeout(Duration::from_secs(10))
        .run()
        .await;
}
