use anyhow::bail;
use coldtrack_domain::SensorBoard;

/// Board whose readings never move; reports the bench-reference values.
#[derive(Debug, Default)]
pub struct StaticBoard;

impl StaticBoard {
    pub fn new() -> Self {
        Self
    }
}

impl SensorBoard for StaticBoard {
    fn read_temperature(&mut self) -> f32 {
        35.4
    }

    fn read_humidity(&mut self) -> f32 {
        41.0
    }

    fn read_motion(&mut self) -> [f32; 3] {
        [0.0, 0.0, 1.0]
    }
}

/// Board that oscillates deterministically around the reference values, for
/// soak runs where a flatline would hide encoding or cadence bugs.
#[derive(Debug, Default)]
pub struct DriftBoard {
    tick: u32,
}

impl DriftBoard {
    pub fn new() -> Self {
        Self { tick: 0 }
    }

    fn phase(&self) -> f32 {
        (self.tick as f32) * 0.1
    }
}

impl SensorBoard for DriftBoard {
    fn read_temperature(&mut self) -> f32 {
        self.tick = self.tick.wrapping_add(1);
        35.4 + 0.8 * self.phase().sin()
    }

    fn read_humidity(&mut self) -> f32 {
        41.0 + 2.5 * self.phase().cos()
    }

    fn read_motion(&mut self) -> [f32; 3] {
        let p = self.phase();
        [0.02 * p.sin(), 0.02 * p.cos(), 1.0]
    }
}

/// Select the board variant named in configuration. Unknown names are fatal;
/// the worker must not start half-configured.
pub fn build_board(name: &str) -> anyhow::Result<Box<dyn SensorBoard + Send>> {
    match name {
        "static" => Ok(Box::new(StaticBoard::new())),
        "drift" => Ok(Box::new(DriftBoard::new())),
        other => bail!("unknown sensor board variant: {other}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_board_is_flat() {
        let mut board = StaticBoard::new();
        assert_eq!(board.read_temperature(), board.read_temperature());
        assert_eq!(board.read_humidity(), 41.0);
    }

    #[test]
    fn test_drift_board_moves_but_stays_in_range() {
        let mut board = DriftBoard::new();
        let mut readings = Vec::new();
        for _ in 0..100 {
            readings.push(board.read_temperature());
        }
        assert!(readings.iter().any(|&t| t != readings[0]));
        assert!(readings.iter().all(|&t| (34.0..=37.0).contains(&t)));
    }

    #[test]
    fn test_build_board_variants() {
        assert!(build_board("static").is_ok());
        assert!(build_board("drift").is_ok());
        assert!(build_board("iks01a2").is_err());
    }
}
