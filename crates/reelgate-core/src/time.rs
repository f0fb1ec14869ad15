//! Timestamp helpers. All persisted timestamps are UTC RFC 3339 with a `Z`
//! suffix and microsecond precision.

use chrono::{DateTime, SecondsFormat, Utc};

pub fn now() -> DateTime<Utc> {
    Utc::now()
}

pub fn to_rfc3339(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn now_rfc3339() -> String {
    to_rfc3339(&now())
}

/// Run identifier derived from a start time: `run_YYYYmmdd_HHMMSS`.
pub fn run_id_at(ts: &DateTime<Utc>) -> String {
    ts.format("run_%Y%m%d_%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn run_id_format() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(run_id_at(&ts), "run_20240309_070501");
    }

    #[test]
    fn rfc3339_uses_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_rfc3339(&ts), "2024-01-01T00:00:00.000000Z");
    }
}
