/// Outcome a receiver reports for a downlink message.
///
/// `Abandoned` leaves the message unacknowledged so the transport may redeliver
/// it; `Rejected` acknowledges it as invalid so it will not come back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownlinkDisposition {
    Accepted,
    Rejected,
    Abandoned,
}

/// Receiver for messages pushed back from the ingestion endpoint.
///
/// Invoked synchronously from within the transport pump, on the worker's own
/// execution context. The payload is borrowed for the duration of the call
/// only; implementations must copy any bytes they need to retain.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait DownlinkSink: Send + Sync {
    fn handle(&self, payload: &[u8]) -> DownlinkDisposition;
}
