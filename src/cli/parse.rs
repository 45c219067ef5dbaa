use chrono::{DateTime, Utc};

use salience_core::note::parse_datetime;

/// Parse an RFC 3339, naive ISO or bare-date instant
pub fn parse_instant(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    parse_datetime(s).ok_or_else(|| format!("invalid date/time '{}'", s))
}

/// Parse a number in [0, 1]
pub fn parse_unit_interval(s: &str) -> std::result::Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(format!("{} is outside [0, 1]", value))
    }
}
