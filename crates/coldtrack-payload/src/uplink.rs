use crate::error::{PayloadError, Result};
use crate::timestamp::UplinkTimestamp;
use coldtrack_domain::SensorSnapshot;

/// Hard bound on the serialized uplink message. A message that would exceed
/// it is rejected outright, never truncated.
pub const MAX_UPLINK_BYTES: usize = 512;

/// Encodes a snapshot into the fixed-schema uplink message.
///
/// Field order and numeric precision are part of the wire contract:
/// latitude/longitude at 4 decimal places, temperatures at 1, battery voltage
/// at 2, integers plain. Output is deterministic for fixed inputs.
///
/// String fields (`device_id`, `network`) are written unescaped; values must
/// not contain `"` or control characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct UplinkEncoder;

impl UplinkEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn encode(
        &self,
        device_id: &str,
        timestamp: &UplinkTimestamp,
        snapshot: &SensorSnapshot,
    ) -> Result<Vec<u8>> {
        let message = format!(
            "{{\"timestamp\":\"{timestamp}\",\"device\":\"{device}\",\
             \"position\":{{\"latitude\":{latitude:.4},\"longitude\":{longitude:.4},\"geoFence\":{geofence}}},\
             \"temperature\":{{\"container\":{container:.1},\"heater\":{heater:.1}}},\
             \"health\":{{\"batteryVoltage\":{battery:.2},\"network\":\"{network}\",\"signalStrength\":{signal}}}}}",
            timestamp = timestamp,
            device = device_id,
            latitude = snapshot.position.latitude,
            longitude = snapshot.position.longitude,
            geofence = snapshot.position.geofence_id,
            container = snapshot.temperature.container_c,
            heater = snapshot.temperature.heater_c,
            battery = snapshot.health.battery_voltage,
            network = snapshot.health.network,
            signal = snapshot.health.signal_strength,
        );

        if message.len() > MAX_UPLINK_BYTES {
            return Err(PayloadError::Overflow {
                len: message.len(),
                max: MAX_UPLINK_BYTES,
            });
        }

        Ok(message.into_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coldtrack_domain::{Health, Position, SensorSnapshot, Temperature};

    fn reference_snapshot() -> SensorSnapshot {
        SensorSnapshot {
            position: Position {
                latitude: 38.898_556,
                longitude: -77.037_852,
                geofence_id: 0,
            },
            temperature: Temperature {
                container_c: 35.4,
                heater_c: 37.1,
            },
            health: Health {
                battery_voltage: 3.4,
                network: "Orange".to_string(),
                signal_strength: 7,
            },
        }
    }

    #[test]
    fn test_field_order_and_precision() {
        let encoder = UplinkEncoder::new();
        let timestamp = UplinkTimestamp::from_formatted("Mon 2024-01-01 12:00:00");
        let bytes = encoder
            .encode("TEST-DEVICE-1", &timestamp, &reference_snapshot())
            .unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\"timestamp\":\"Mon 2024-01-01 12:00:00\",\"device\":\"TEST-DEVICE-1\",\
             \"position\":{\"latitude\":38.8986,\"longitude\":-77.0379,\"geoFence\":0},\
             \"temperature\":{\"container\":35.4,\"heater\":37.1},\
             \"health\":{\"batteryVoltage\":3.40,\"network\":\"Orange\",\"signalStrength\":7}}"
        );
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let encoder = UplinkEncoder::new();
        let timestamp = UplinkTimestamp::from_formatted("Tue 2024-06-18 03:15:09");
        let snapshot = reference_snapshot();
        let first = encoder.encode("dev-7", &timestamp, &snapshot).unwrap();
        let second = encoder.encode("dev-7", &timestamp, &snapshot).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_overflow_rejected_not_truncated() {
        let encoder = UplinkEncoder::new();
        let timestamp = UplinkTimestamp::from_formatted("Mon 2024-01-01 12:00:00");
        let mut snapshot = reference_snapshot();
        snapshot.health.network = "x".repeat(MAX_UPLINK_BYTES);
        let err = encoder
            .encode("TEST-DEVICE-1", &timestamp, &snapshot)
            .unwrap_err();
        match err {
            PayloadError::Overflow { len, max } => {
                assert!(len > max);
                assert_eq!(max, MAX_UPLINK_BYTES);
            }
        }
    }

    #[test]
    fn test_message_near_bound_still_encodes() {
        let encoder = UplinkEncoder::new();
        let timestamp = UplinkTimestamp::from_formatted("Mon 2024-01-01 12:00:00");
        let mut snapshot = reference_snapshot();
        // Pad network so the message lands exactly on the bound.
        let base = encoder
            .encode("TEST-DEVICE-1", &timestamp, &snapshot)
            .unwrap()
            .len();
        let pad = MAX_UPLINK_BYTES - base + snapshot.health.network.len();
        snapshot.health.network = "x".repeat(pad);
        let bytes = encoder
            .encode("TEST-DEVICE-1", &timestamp, &snapshot)
            .unwrap();
        assert_eq!(bytes.len(), MAX_UPLINK_BYTES);
    }

    #[test]
    fn test_negative_and_rounded_values() {
        let encoder = UplinkEncoder::new();
        let timestamp = UplinkTimestamp::from_formatted("Wed 2024-03-06 23:59:59");
        let snapshot = SensorSnapshot {
            position: Position {
                latitude: -12.000_06,
                longitude: 0.000_04,
                geofence_id: -3,
            },
            temperature: Temperature {
                container_c: -1.25,
                heater_c: 0.0,
            },
            health: Health {
                battery_voltage: 12.005,
                network: "".to_string(),
                signal_strength: -113,
            },
        };
        let text = String::from_utf8(
            encoder.encode("d", &timestamp, &snapshot).unwrap(),
        )
        .unwrap();
        assert!(text.contains("\"latitude\":-12.0001"));
        assert!(text.contains("\"longitude\":0.0000"));
        assert!(text.contains("\"geoFence\":-3"));
        assert!(text.contains("\"heater\":0.0"));
        assert!(text.contains("\"signalStrength\":-113"));
    }
}
