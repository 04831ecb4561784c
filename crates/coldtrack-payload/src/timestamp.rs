use chrono::Utc;
use std::fmt;

/// Wall-clock timestamp in the uplink wire format: weekday, ISO date, 24h
/// time, e.g. `Mon 2024-01-01 12:00:00`. Non-decreasing across cycles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UplinkTimestamp(String);

impl UplinkTimestamp {
    pub fn now() -> Self {
        Self(Utc::now().format("%a %F %X").to_string())
    }

    /// Wrap an already-formatted timestamp. Used by tests to pin the clock.
    pub fn from_formatted(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UplinkTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_wire_format_shape() {
        let when = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let formatted = when.format("%a %F %X").to_string();
        assert_eq!(formatted, "Mon 2024-01-01 12:00:00");
    }

    #[test]
    fn test_now_matches_shape() {
        let ts = UplinkTimestamp::now();
        // "Mon 2024-01-01 12:00:00" — three space-separated fields
        assert_eq!(ts.as_str().split(' ').count(), 3);
        assert_eq!(ts.as_str().len(), "Mon 2024-01-01 12:00:00".len());
    }
}
