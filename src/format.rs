// Display formatters for provider wire values.
//
// All functions here are pure; anything that cannot be interpreted is
// handed back unchanged so a table cell never goes missing.

use chrono::{DateTime, FixedOffset, Local, TimeZone, Utc};
use serde_json::Value;

const BYTE_UNITS: [&str; 5] = ["bytes", "KB", "MB", "GB", "TB"];

/// Human readable byte size with two decimals, base 1024.
pub fn format_bytes(bytes: u64) -> String {
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < BYTE_UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", size, BYTE_UNITS[unit])
}

/// Dollar amount with thousands separators, e.g. `$1,234.50`.
///
/// Numbers and numeric strings are formatted; anything else is returned
/// unchanged.
pub fn format_currency(value: &Value) -> String {
    let amount = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match amount {
        Some(amount) if amount.is_finite() => {
            let sign = if amount < 0.0 { "-" } else { "" };
            format!("{}${}", sign, group_thousands(&format!("{:.2}", amount.abs())))
        }
        _ => value_to_string(value),
    }
}

fn group_thousands(fixed: &str) -> String {
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed, ""));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if frac_part.is_empty() {
        grouped
    } else {
        format!("{}.{}", grouped, frac_part)
    }
}

/// Parse a provider timestamp.
///
/// Accepts RFC 3339 (`2024-05-01T12:00:00.000Z`, `2024-05-01T12:00:00+00:00`)
/// and the compact offset form `2024-05-01T12:00:00+0000`.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z"))
        .or_else(|_| DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f%z"))
        .ok()
}

/// Convert a provider timestamp to wall-clock time in `tz`.
pub fn timestamp_in<Tz>(raw: &str, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    parse_timestamp(raw).map(|dt| {
        dt.with_timezone(tz)
            .format("%Y-%m-%d %H:%M:%S %Z")
            .to_string()
    })
}

/// Convert a provider timestamp to the local timezone. Unparseable input
/// is returned unchanged.
pub fn utc_str_to_local(raw: &str) -> String {
    timestamp_in(raw, &Local).unwrap_or_else(|| raw.to_string())
}

/// Elapsed time between `raw` and `now` as `Nd Nh Nm`.
pub fn elapsed_between(raw: &str, now: DateTime<Utc>) -> Option<String> {
    let started = parse_timestamp(raw)?.with_timezone(&Utc);
    let minutes = (now - started).num_minutes().max(0);
    let (days, rem) = (minutes / (24 * 60), minutes % (24 * 60));
    Some(format!("{}d {}h {}m", days, rem / 60, rem % 60))
}

/// Elapsed time since `raw` until now.
pub fn elapsed_since(raw: &str) -> String {
    elapsed_between(raw, Utc::now()).unwrap_or_else(|| raw.to_string())
}

/// Render a JSON value for a table cell: strings without quotes, arrays
/// joined with commas, null as empty.
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(500), "500.00 bytes");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1_048_576), "1.00 MB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(0), "0.00 bytes");
    }

    #[test]
    fn test_format_bytes_caps_at_terabytes() {
        let five_pb = 5 * 1024u64.pow(5);
        assert_eq!(format_bytes(five_pb), "5120.00 TB");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(&json!(1234.5)), "$1,234.50");
        assert_eq!(format_currency(&json!(0)), "$0.00");
        assert_eq!(format_currency(&json!(1_000_000)), "$1,000,000.00");
        assert_eq!(format_currency(&json!("-12.3")), "-$12.30");
        assert_eq!(format_currency(&json!(999.999)), "$1,000.00");
    }

    #[test]
    fn test_format_currency_passthrough() {
        assert_eq!(format_currency(&json!("n/a")), "n/a");
        assert_eq!(format_currency(&json!(null)), "");
        assert_eq!(format_currency(&json!(true)), "true");
    }

    #[test]
    fn test_timestamp_formats_agree() {
        let tz = FixedOffset::west_opt(5 * 3600).unwrap();
        let zulu = timestamp_in("2024-03-10T15:30:00.000Z", &tz).unwrap();
        let offset = timestamp_in("2024-03-10T15:30:00+00:00", &tz).unwrap();
        let compact = timestamp_in("2024-03-10T15:30:00+0000", &tz).unwrap();
        assert_eq!(zulu, offset);
        assert_eq!(zulu, compact);
        assert!(zulu.starts_with("2024-03-10 10:30:00"));
    }

    #[test]
    fn test_utc_str_to_local_passthrough() {
        assert_eq!(utc_str_to_local("not a date"), "not a date");
        assert_eq!(utc_str_to_local(""), "");
    }

    #[test]
    fn test_elapsed_between() {
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 5, 10, 0).unwrap();
        assert_eq!(
            elapsed_between("2024-01-01T02:00:00+00:00", now).as_deref(),
            Some("2d 3h 10m")
        );
        assert_eq!(
            elapsed_between("2024-02-01T00:00:00Z", now).as_deref(),
            Some("0d 0h 0m")
        );
        assert!(elapsed_between("garbage", now).is_none());
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&json!("abc")), "abc");
        assert_eq!(value_to_string(&json!(["a", "b"])), "a, b");
        assert_eq!(value_to_string(&json!(null)), "");
        assert_eq!(value_to_string(&json!(4)), "4");
    }
}
