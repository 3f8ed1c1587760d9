use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::decode::NormalizedRecord;
use super::normalize::normalize_key;

/// Returns the value of the first alias present in the record with a
/// non-empty cell. Alias keys are normalized at lookup time, so rule
/// tables may carry the exporter's own spellings.
pub fn resolve<'a>(record: &'a NormalizedRecord, aliases: &[String]) -> Option<&'a str> {
    aliases.iter().find_map(|alias| {
        record
            .get(&normalize_key(alias))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    })
}

/// Coerces locale-ambiguous numeric text to an exact integer.
///
/// Periods and spaces (including non-breaking spaces) are stripped as
/// thousands grouping, the first comma directly followed by a digit
/// becomes the decimal point, and the result is truncated toward zero.
/// Anything unparseable is "no value", never an error: one messy cell must
/// not abort the surrounding row.
pub fn coerce_int(raw: Option<&str>) -> Option<i64> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    let mut cleaned = String::with_capacity(raw.len());
    let mut decimal_seen = false;
    let mut chars = raw.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '.' | ' ' | '\u{a0}' => {}
            ',' if !decimal_seen && chars.peek().is_some_and(|c| c.is_ascii_digit()) => {
                cleaned.push('.');
                decimal_seen = true;
            }
            other => cleaned.push(other),
        }
    }

    let value: f64 = cleaned.parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    Some(value.trunc() as i64)
}

/// Coerces the external post identifier, falling back to a
/// millisecond-resolution timestamp when the cell is missing or not an
/// integer, so malformed exports still yield a persistable key. Fallback
/// identifiers from the same millisecond collide; rows carry their own
/// surrogate primary key, so a collision never fails ingestion.
pub fn coerce_post_id(raw: Option<&str>, fallback_at: DateTime<Utc>) -> i64 {
    raw.and_then(|value| value.trim().parse::<i64>().ok())
        .unwrap_or_else(|| fallback_at.timestamp_millis())
}

/// Attempts the date shapes seen across exporters, most specific first:
/// RFC 3339, `2024-01-31 15:04:05`, `2024-01-31`, then `31/01/2024`.
/// Date-only shapes land at midnight UTC. Unrecognized input is `None`;
/// the caller decides whether a default applies.
pub fn coerce_date(raw: Option<&str>) -> Option<DateTime<Utc>> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(parsed.and_utc());
    }
    for format in ["%Y-%m-%d", "%d/%m/%Y"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(raw, format) {
            return Some(parsed.and_time(NaiveTime::MIN).and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(pairs: &[(&str, &str)]) -> NormalizedRecord {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn aliases(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|k| k.to_string()).collect()
    }

    #[test]
    fn test_resolve_first_listed_alias_wins() {
        let rec = record(&[("impresiones", "10"), ("impressions", "20")]);
        assert_eq!(
            resolve(&rec, &aliases(&["impresiones", "impressions"])),
            Some("10")
        );
    }

    #[test]
    fn test_resolve_skips_empty_cells() {
        let rec = record(&[("impresiones", ""), ("impressions", "20")]);
        assert_eq!(
            resolve(&rec, &aliases(&["impresiones", "impressions"])),
            Some("20")
        );
    }

    #[test]
    fn test_resolve_normalizes_alias_spelling() {
        let rec = record(&[("impresion", "5")]);
        assert_eq!(resolve(&rec, &aliases(&[" Impresión "])), Some("5"));
    }

    #[test]
    fn test_resolve_absent_everywhere() {
        let rec = record(&[("fecha", "2024-01-01")]);
        assert_eq!(resolve(&rec, &aliases(&["impresiones", "impressions"])), None);
    }

    #[test]
    fn test_coerce_int_groupings_and_decimals() {
        assert_eq!(coerce_int(Some("1.234")), Some(1234));
        assert_eq!(coerce_int(Some("1 234,5")), Some(1234));
        assert_eq!(coerce_int(Some("1\u{a0}234")), Some(1234));
        assert_eq!(coerce_int(Some("7")), Some(7));
        assert_eq!(coerce_int(Some("1,5")), Some(1));
        assert_eq!(coerce_int(Some("-12")), Some(-12));
    }

    #[test]
    fn test_coerce_int_rejects_garbage() {
        assert_eq!(coerce_int(Some("")), None);
        assert_eq!(coerce_int(Some("   ")), None);
        assert_eq!(coerce_int(Some("abc")), None);
        assert_eq!(coerce_int(Some("12a")), None);
        assert_eq!(coerce_int(None), None);
    }

    #[test]
    fn test_coerce_int_comma_without_digit_is_not_a_decimal() {
        assert_eq!(coerce_int(Some("12,")), None);
    }

    #[test]
    fn test_coerce_post_id_parses_plain_integers() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(coerce_post_id(Some("12345"), at), 12345);
        assert_eq!(coerce_post_id(Some("  42 "), at), 42);
    }

    #[test]
    fn test_coerce_post_id_fallback_is_the_ingestion_millisecond() {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let expected = at.timestamp_millis();
        assert_eq!(coerce_post_id(None, at), expected);
        assert_eq!(coerce_post_id(Some("12.5"), at), expected);
        assert_eq!(coerce_post_id(Some("not-an-id"), at), expected);
        assert!(coerce_post_id(None, at) > 0);
    }

    #[test]
    fn test_coerce_post_id_fallbacks_differ_across_instants() {
        let first = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        let second = first + chrono::Duration::milliseconds(1);
        assert_ne!(coerce_post_id(None, first), coerce_post_id(None, second));
    }

    #[test]
    fn test_coerce_date_supported_shapes() {
        assert_eq!(
            coerce_date(Some("2024-03-05T10:30:00Z")),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap())
        );
        assert_eq!(
            coerce_date(Some("2024-03-05 10:30:00")),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 10, 30, 0).unwrap())
        );
        assert_eq!(
            coerce_date(Some("2024-03-05")),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(
            coerce_date(Some("05/03/2024")),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_coerce_date_rejects_unrecognized_shapes() {
        assert_eq!(coerce_date(Some("yesterday")), None);
        assert_eq!(coerce_date(Some("03-05-2024")), None);
        assert_eq!(coerce_date(Some("")), None);
        assert_eq!(coerce_date(None), None);
    }
}
