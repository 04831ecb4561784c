use crate::snapshot::SensorSnapshot;

/// Produces the per-cycle reading the worker encodes and sends.
///
/// Best-effort: a reading is always returned, sensor-level failure handling
/// lives behind this seam.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SnapshotSource: Send {
    fn snapshot(&mut self) -> SensorSnapshot;
}
