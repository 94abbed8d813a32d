//! Duration display helpers and serde adapters.

use std::time::Duration;

/// `MM:SS`, with minutes allowed to exceed 59.
pub fn format_clock(d: Duration) -> String {
    let secs = d.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// `MM:SS` below an hour, `Hh MMm` from an hour up.
pub fn format_total(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 3600 {
        format_clock(d)
    } else {
        format!("{}h {:02}m", secs / 3600, (secs % 3600) / 60)
    }
}

/// Serialize a [`Duration`] as whole seconds.
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_secs(u64::deserialize(d)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_format_pads_and_overflows_minutes() {
        assert_eq!(format_clock(Duration::from_secs(0)), "00:00");
        assert_eq!(format_clock(Duration::from_secs(25 * 60)), "25:00");
        assert_eq!(format_clock(Duration::from_secs(61)), "01:01");
        assert_eq!(format_clock(Duration::from_secs(75 * 60 + 9)), "75:09");
    }

    #[test]
    fn total_format_switches_at_one_hour() {
        assert_eq!(format_total(Duration::from_secs(59 * 60 + 59)), "59:59");
        assert_eq!(format_total(Duration::from_secs(3600)), "1h 00m");
        assert_eq!(format_total(Duration::from_secs(2 * 3600 + 5 * 60 + 30)), "2h 05m");
    }
}
