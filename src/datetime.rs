// memgate: RFC1123 parsing/formatting and datetime-string padding (§6)

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{MemgateError, MemgateResult};

pub const RFC1123_FMT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Parse an HTTP-date (RFC1123, e.g. "Sat, 01 Jan 2005 00:00:00 GMT").
pub fn parse_rfc1123(s: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(s.trim(), RFC1123_FMT)
        .ok()
        .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc))
}

pub fn format_rfc1123(dt: &DateTime<Utc>) -> String {
    dt.format(RFC1123_FMT).to_string()
}

/// Pad a possibly-truncated digit string `YYYY[MM[DD[hh[mm[ss]]]]]` with
/// defaults (month=01, day=01, hour=00, minute=00, second=00) and parse it
/// into an instant (§6 "Datetime padding").
pub fn parse_padded_datetime(raw: &str) -> MemgateResult<DateTime<Utc>> {
    if raw.len() < 4 || raw.len() > 14 || raw.len() % 2 != 0 || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MemgateError::MalformedDatetime(raw.to_string()));
    }
    let mut key = raw.to_string();
    let defaults = ["01", "01", "00", "00", "00"];
    // key already has the 4-digit year; each subsequent field is 2 digits.
    let fields_present = (key.len() - 4) / 2;
    for default in defaults.iter().skip(fields_present.min(5)) {
        key.push_str(default);
    }
    let naive = NaiveDateTime::parse_from_str(&key, "%Y%m%d%H%M%S")
        .map_err(|_| MemgateError::MalformedDatetime(raw.to_string()))?;
    Ok(DateTime::from_naive_utc_and_offset(naive, Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_year_only() {
        let dt = parse_padded_datetime("2007").unwrap();
        assert_eq!(dt.format("%Y%m%d%H%M%S").to_string(), "20070101000000");
    }

    #[test]
    fn pads_full_precision_unchanged() {
        let dt = parse_padded_datetime("20070615123045").unwrap();
        assert_eq!(dt.format("%Y%m%d%H%M%S").to_string(), "20070615123045");
    }

    #[test]
    fn rejects_odd_length() {
        assert!(parse_padded_datetime("200").is_err());
        assert!(parse_padded_datetime("200701156").is_err());
    }

    #[test]
    fn rfc1123_roundtrip() {
        let dt = parse_padded_datetime("20050101000000").unwrap();
        let s = format_rfc1123(&dt);
        let back = parse_rfc1123(&s).unwrap();
        assert_eq!(dt, back);
    }
}
