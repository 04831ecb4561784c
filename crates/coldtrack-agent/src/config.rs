use config::{Config, ConfigError, Environment};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AgentConfig {
    /// Opaque ingestion endpoint descriptor:
    /// `HostName=...;DeviceId=...;SharedAccessKey=...`
    #[serde(default = "default_connection_string")]
    pub connection_string: String,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Inter-cycle sleep in seconds
    #[serde(default = "default_cycle_interval")]
    pub cycle_interval_secs: u64,

    /// Lower bound, in seconds, on the downlink polling cadence
    #[serde(default = "default_minimum_polling")]
    pub minimum_polling_secs: u64,

    /// Per-cycle budget for driving transport protocol work, in milliseconds
    #[serde(default = "default_pump_budget_ms")]
    pub pump_budget_ms: u64,

    /// Sensor board variant: "static" or "drift"
    #[serde(default = "default_board")]
    pub board: String,

    /// Path to a PEM bundle of trusted root certificates
    #[serde(default)]
    pub trusted_certs_path: Option<String>,

    /// Client identification tag reported to the endpoint
    #[serde(default)]
    pub product_info: Option<String>,

    /// Sample and log process diagnostics at the end of each cycle
    #[serde(default)]
    pub diagnostics_enabled: bool,

    /// Copy budget for a single downlink message, in bytes
    #[serde(default = "default_max_downlink_copy_bytes")]
    pub max_downlink_copy_bytes: usize,

    // Device profile: the slow-moving state reported alongside live sensor
    // readings.
    #[serde(default = "default_latitude")]
    pub latitude: f32,

    #[serde(default = "default_longitude")]
    pub longitude: f32,

    #[serde(default)]
    pub geofence_id: i32,

    #[serde(default = "default_battery_voltage")]
    pub battery_voltage: f32,

    #[serde(default = "default_network")]
    pub network: String,

    #[serde(default = "default_signal_strength")]
    pub signal_strength: i32,

    /// Heater runs warmer than the container by this much
    #[serde(default = "default_heater_bias")]
    pub heater_bias_c: f32,
}

fn default_connection_string() -> String {
    "HostName=hub.example.net;DeviceId=TEST-DEVICE-1;SharedAccessKey=changeme".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_cycle_interval() -> u64 {
    5
}

fn default_minimum_polling() -> u64 {
    9
}

fn default_pump_budget_ms() -> u64 {
    250
}

fn default_board() -> String {
    "static".to_string()
}

fn default_max_downlink_copy_bytes() -> usize {
    1024
}

fn default_latitude() -> f32 {
    38.898_556
}

fn default_longitude() -> f32 {
    -77.037_852
}

fn default_battery_voltage() -> f32 {
    3.4
}

fn default_network() -> String {
    "Orange".to_string()
}

fn default_signal_strength() -> i32 {
    7
}

fn default_heater_bias() -> f32 {
    1.7
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(Environment::with_prefix("COLDTRACK"))
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Mutex to ensure tests run serially and don't interfere with each other
    static TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_default_config() {
        let _lock = TEST_LOCK.lock().unwrap();

        std::env::remove_var("COLDTRACK_CYCLE_INTERVAL_SECS");
        std::env::remove_var("COLDTRACK_BOARD");
        std::env::remove_var("COLDTRACK_NETWORK");

        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.cycle_interval_secs, 5);
        assert_eq!(config.minimum_polling_secs, 9);
        assert_eq!(config.board, "static");
        assert_eq!(config.network, "Orange");
        assert!(!config.diagnostics_enabled);
        assert!(config.trusted_certs_path.is_none());
    }

    #[test]
    fn test_custom_config() {
        let _lock = TEST_LOCK.lock().unwrap();

        std::env::set_var("COLDTRACK_CYCLE_INTERVAL_SECS", "30");
        std::env::set_var("COLDTRACK_BOARD", "drift");
        std::env::set_var("COLDTRACK_NETWORK", "Vodafone");

        let config = AgentConfig::from_env().unwrap();
        assert_eq!(config.cycle_interval_secs, 30);
        assert_eq!(config.board, "drift");
        assert_eq!(config.network, "Vodafone");

        // Clean up
        std::env::remove_var("COLDTRACK_CYCLE_INTERVAL_SECS");
        std::env::remove_var("COLDTRACK_BOARD");
        std::env::remove_var("COLDTRACK_NETWORK");
    }
}
