mod error;
mod timestamp;
pub mod uplink;

pub use error::{PayloadError, Result};
pub use timestamp::UplinkTimestamp;
pub use uplink::{UplinkEncoder, MAX_UPLINK_BYTES};
