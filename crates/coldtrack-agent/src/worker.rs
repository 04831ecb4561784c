use crate::diagnostics;
use coldtrack_domain::{DownlinkSink, IngestTransport, SnapshotSource, TransportOption};
use coldtrack_payload::{UplinkEncoder, UplinkTimestamp};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct WorkerSettings {
    pub device_id: String,
    pub cycle_interval: Duration,
    /// Applied during initialization; individual failures are logged and the
    /// worker proceeds with transport defaults.
    pub options: Vec<TransportOption>,
    pub diagnostics_enabled: bool,
}

/// The agent's control loop.
///
/// One cycle: snapshot, encode, send, pump the transport (downlink dispatch
/// happens in there), optionally sample diagnostics, sleep. The worker is the
/// sole owner of the transport handle and the only execution context touching
/// any of this state; the sleep is the one intentional suspension point and
/// is interruptible by the cancellation token.
pub struct TelemetryWorker<S, T> {
    source: S,
    transport: T,
    sink: Arc<dyn DownlinkSink>,
    encoder: UplinkEncoder,
    settings: WorkerSettings,
    cycles_completed: u64,
    sends_queued: u64,
    sends_failed: u64,
    encodes_skipped: u64,
}

impl<S, T> TelemetryWorker<S, T>
where
    S: SnapshotSource,
    T: IngestTransport,
{
    pub fn new(source: S, transport: T, sink: Arc<dyn DownlinkSink>, settings: WorkerSettings) -> Self {
        Self {
            source,
            transport,
            sink,
            encoder: UplinkEncoder::new(),
            settings,
            cycles_completed: 0,
            sends_queued: 0,
            sends_failed: 0,
            encodes_skipped: 0,
        }
    }

    /// Cycles completed so far (success and skipped-send cycles alike).
    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn sends_queued(&self) -> u64 {
        self.sends_queued
    }

    pub fn sends_failed(&self) -> u64 {
        self.sends_failed
    }

    pub fn encodes_skipped(&self) -> u64 {
        self.encodes_skipped
    }

    /// Run until cancelled. Only initialization can fail; once the loop is
    /// running every per-cycle error is logged and absorbed.
    #[instrument(name = "telemetry_worker", skip_all, fields(device_id = %self.settings.device_id))]
    pub async fn run(&mut self, token: CancellationToken) -> anyhow::Result<()> {
        self.initialize();
        info!(
            interval_secs = self.settings.cycle_interval.as_secs(),
            "worker running"
        );

        loop {
            self.cycle().await;

            tokio::select! {
                _ = token.cancelled() => {
                    info!("shutdown requested, stopping after current cycle");
                    break;
                }
                _ = tokio::time::sleep(self.settings.cycle_interval) => {}
            }
        }

        if let Err(e) = self.transport.disconnect().await {
            warn!(error = %e, "transport release failed during shutdown");
        }
        info!(
            cycles = self.cycles_completed,
            sends_queued = self.sends_queued,
            sends_failed = self.sends_failed,
            encodes_skipped = self.encodes_skipped,
            "worker terminated"
        );
        Ok(())
    }

    fn initialize(&mut self) {
        for option in std::mem::take(&mut self.settings.options) {
            let name = option.name();
            if let Err(e) = self.transport.set_option(option) {
                warn!(option = name, error = %e, "transport option rejected, continuing with defaults");
            }
        }
        self.transport.register_downlink(Arc::clone(&self.sink));
    }

    async fn cycle(&mut self) {
        let cycle = self.cycles_completed + 1;
        let snapshot = self.source.snapshot();
        let rssi = snapshot.health.signal_strength;
        let timestamp = UplinkTimestamp::now();

        match self
            .encoder
            .encode(&self.settings.device_id, &timestamp, &snapshot)
        {
            Ok(payload) => {
                // The payload buffer is owned by this cycle; it is handed to
                // the transport (or dropped on failure) before the cycle ends.
                match self.transport.send_async(payload).await {
                    Ok(_receipt) => {
                        // Fire-and-forget: delivery is best-effort, the
                        // receipt is intentionally dropped.
                        self.sends_queued += 1;
                        info!(cycle, rssi, "uplink queued");
                    }
                    Err(e) => {
                        self.sends_failed += 1;
                        warn!(cycle, rssi, error = %e, "uplink send failed");
                    }
                }
            }
            Err(e) => {
                self.encodes_skipped += 1;
                warn!(cycle, error = %e, "uplink rejected by encoder, skipping send");
            }
        }

        match self.transport.pump_work().await {
            Ok(summary) => {
                if summary.downlinks > 0 || summary.acked > 0 {
                    debug!(
                        cycle,
                        downlinks = summary.downlinks,
                        acked = summary.acked,
                        "transport pump"
                    );
                }
            }
            Err(e) => warn!(cycle, error = %e, "transport pump failed"),
        }

        if self.settings.diagnostics_enabled {
            if let Some(d) = diagnostics::sample() {
                debug!(
                    cycle,
                    rss_kb = d.rss_kb,
                    rss_peak_kb = d.rss_peak_kb,
                    threads = d.threads,
                    "process diagnostics"
                );
            }
        }

        self.cycles_completed = cycle;
    }
}
