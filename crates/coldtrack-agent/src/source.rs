use coldtrack_domain::{Health, Position, SensorBoard, SensorSnapshot, SnapshotSource, Temperature};
use tracing::debug;

/// Slow-moving device state reported alongside live sensor readings.
#[derive(Debug, Clone)]
pub struct DeviceProfile {
    pub latitude: f32,
    pub longitude: f32,
    pub geofence_id: i32,
    pub battery_voltage: f32,
    pub network: String,
    pub signal_strength: i32,
    pub heater_bias_c: f32,
}

/// Composes board readings with the device profile into the per-cycle
/// snapshot.
pub struct ProfileSnapshotSource {
    board: Box<dyn SensorBoard + Send>,
    profile: DeviceProfile,
}

impl ProfileSnapshotSource {
    pub fn new(board: Box<dyn SensorBoard + Send>, profile: DeviceProfile) -> Self {
        Self { board, profile }
    }
}

impl SnapshotSource for ProfileSnapshotSource {
    fn snapshot(&mut self) -> SensorSnapshot {
        let container_c = self.board.read_temperature();
        let humidity = self.board.read_humidity();
        let motion = self.board.read_motion();
        debug!(humidity, ?motion, "side observations from sensor board");

        SensorSnapshot {
            position: Position {
                latitude: self.profile.latitude,
                longitude: self.profile.longitude,
                geofence_id: self.profile.geofence_id,
            },
            temperature: Temperature {
                container_c,
                heater_c: container_c + self.profile.heater_bias_c,
            },
            health: Health {
                battery_voltage: self.profile.battery_voltage,
                network: self.profile.network.clone(),
                signal_strength: self.profile.signal_strength,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coldtrack_domain::MockSensorBoard;

    fn test_profile() -> DeviceProfile {
        DeviceProfile {
            latitude: 38.898_556,
            longitude: -77.037_852,
            geofence_id: 0,
            battery_voltage: 3.4,
            network: "Orange".to_string(),
            signal_strength: 7,
            heater_bias_c: 1.7,
        }
    }

    #[test]
    fn test_snapshot_composes_board_and_profile() {
        let mut board = MockSensorBoard::new();
        board.expect_read_temperature().times(1).returning(|| 35.4);
        board.expect_read_humidity().times(1).returning(|| 40.0);
        board
            .expect_read_motion()
            .times(1)
            .returning(|| [0.0, 0.0, 1.0]);

        let mut source = ProfileSnapshotSource::new(Box::new(board), test_profile());
        let snapshot = source.snapshot();

        assert_eq!(snapshot.temperature.container_c, 35.4);
        assert!((snapshot.temperature.heater_c - 37.1).abs() < 1e-4);
        assert_eq!(snapshot.health.network, "Orange");
        assert_eq!(snapshot.position.geofence_id, 0);
    }

    #[test]
    fn test_each_cycle_reads_the_board_again() {
        let mut board = MockSensorBoard::new();
        board.expect_read_temperature().times(3).returning(|| 20.0);
        board.expect_read_humidity().times(3).returning(|| 40.0);
        board
            .expect_read_motion()
            .times(3)
            .returning(|| [0.0, 0.0, 1.0]);

        let mut source = ProfileSnapshotSource::new(Box::new(board), test_profile());
        for _ in 0..3 {
            let _ = source.snapshot();
        }
    }
}
