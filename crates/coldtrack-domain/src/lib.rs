pub mod board;
pub mod descriptor;
pub mod downlink;
pub mod error;
pub mod snapshot;
pub mod source;
pub mod transport;

pub use board::SensorBoard;
pub use descriptor::ConnectionDescriptor;
pub use downlink::{DownlinkDisposition, DownlinkSink};
pub use error::{TransportError, TransportResult};
pub use snapshot::{Health, Position, SensorSnapshot, Temperature};
pub use source::SnapshotSource;
pub use transport::{IngestTransport, PumpSummary, SendAck, SendReceipt, TransportOption};

#[cfg(any(test, feature = "testing"))]
pub use board::MockSensorBoard;
#[cfg(any(test, feature = "testing"))]
pub use downlink::MockDownlinkSink;
#[cfg(any(test, feature = "testing"))]
pub use source::MockSnapshotSource;
#[cfg(any(test, feature = "testing"))]
pub use transport::MockIngestTransport;
