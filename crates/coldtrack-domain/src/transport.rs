use crate::downlink::DownlinkSink;
use crate::error::TransportResult;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

/// Transport behavior knobs, applied after handle creation and before the
/// session opens. Failures applying an option are non-fatal to the worker.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportOption {
    /// Root trust material (PEM bundle) for the TLS session.
    TrustedCerts(Vec<u8>),
    /// Client identification tag reported to the endpoint.
    ProductInfo(String),
    /// Lower bound on the downlink polling cadence.
    MinimumPollingTime(Duration),
}

impl TransportOption {
    pub fn name(&self) -> &'static str {
        match self {
            TransportOption::TrustedCerts(_) => "TrustedCerts",
            TransportOption::ProductInfo(_) => "product_info",
            TransportOption::MinimumPollingTime(_) => "MinimumPollingTime",
        }
    }
}

/// Resolver half of a [`SendReceipt`], held by the transport until it observes
/// the delivery acknowledgment for the corresponding message.
#[derive(Debug)]
pub struct SendAck(oneshot::Sender<()>);

impl SendAck {
    pub fn resolve(self) {
        let _ = self.0.send(());
    }
}

/// Completion signal for one queued uplink message.
///
/// `send_async` returns once the message is queued, not once it is delivered.
/// Callers that need a delivery guarantee can await the receipt; the default
/// usage drops it, keeping the send fire-and-forget.
#[derive(Debug)]
pub struct SendReceipt {
    delivered: oneshot::Receiver<()>,
}

impl SendReceipt {
    /// New receipt plus the resolver the transport keeps.
    pub fn pending() -> (SendAck, SendReceipt) {
        let (tx, rx) = oneshot::channel();
        (SendAck(tx), SendReceipt { delivered: rx })
    }

    /// Receipt that is already resolved; for transports (and test doubles)
    /// whose queue hand-off is the delivery point.
    pub fn already_delivered() -> SendReceipt {
        let (ack, receipt) = Self::pending();
        ack.resolve();
        receipt
    }

    /// Wait for the delivery acknowledgment. Returns `false` if the transport
    /// dropped the resolver without acknowledging (connection torn down).
    pub async fn delivered(self) -> bool {
        self.delivered.await.is_ok()
    }
}

/// What one pump pass observed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpSummary {
    /// Downlink messages dispatched to the registered sink.
    pub downlinks: u32,
    /// Uplink delivery acknowledgments observed.
    pub acked: u32,
}

/// Single logical connection to the remote ingestion endpoint.
///
/// The handle has exactly one owner (the worker) for its whole lifetime;
/// no operation is ever invoked concurrently.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait::async_trait]
pub trait IngestTransport: Send {
    /// Configure transport behavior. Only valid before the session opens.
    fn set_option(&mut self, option: TransportOption) -> TransportResult<()>;

    /// Register the receiver for messages pushed back from the endpoint.
    fn register_downlink(&mut self, sink: Arc<dyn DownlinkSink>);

    /// Queue one message for delivery. Returns once queued; the receipt
    /// resolves when delivery is acknowledged. No retry, no backoff.
    async fn send_async(&mut self, payload: Vec<u8>) -> TransportResult<SendReceipt>;

    /// Let the transport progress pending protocol work: keepalives,
    /// outstanding acknowledgments, downlink polling. Must be called once per
    /// cycle; without it no downlink message is ever delivered.
    async fn pump_work(&mut self) -> TransportResult<PumpSummary>;

    /// Release the session. Idempotent; called once at worker shutdown.
    async fn disconnect(&mut self) -> TransportResult<()>;
}
