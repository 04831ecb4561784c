/// Capability surface of the environmental sensor board.
///
/// Concrete variants are selected at startup from configuration; the rest of
/// the agent only sees this trait.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SensorBoard: Send {
    /// Ambient temperature in degrees Celsius.
    fn read_temperature(&mut self) -> f32;

    /// Relative humidity in percent.
    fn read_humidity(&mut self) -> f32;

    /// Acceleration vector in g, one axis per component.
    fn read_motion(&mut self) -> [f32; 3];
}
