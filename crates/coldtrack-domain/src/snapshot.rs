/// Last known device position.
#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub latitude: f32,
    pub longitude: f32,
    pub geofence_id: i32,
}

/// Container and heater temperatures in degrees Celsius.
#[derive(Debug, Clone, PartialEq)]
pub struct Temperature {
    pub container_c: f32,
    pub heater_c: f32,
}

/// Device health: battery level and cellular link state.
///
/// `network` and the device id end up unescaped inside the uplink message, so
/// they must not contain `"` or control characters.
#[derive(Debug, Clone, PartialEq)]
pub struct Health {
    pub battery_voltage: f32,
    pub network: String,
    pub signal_strength: i32,
}

/// Point-in-time reading of device state, captured once per cycle and owned
/// by the cycle that captured it.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorSnapshot {
    pub position: Position,
    pub temperature: Temperature,
    pub health: Health,
}
