use crate::models::{Delta, LicenseValue};

/// Placeholder shown where a delta is not a number.
pub const NOT_NUMERIC: &str = "—";

/// Format a license count with thousands separators.
///
/// # Examples
///
/// ```
/// use billing_core::formatting::format_count;
///
/// assert_eq!(format_count(0), "0");
/// assert_eq!(format_count(1234567), "1,234,567");
/// assert_eq!(format_count(-9876), "-9,876");
/// ```
pub fn format_count(value: i64) -> String {
    let grouped = group_thousands(&value.unsigned_abs().to_string());
    if value < 0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Format a signed change: `+2`, `-3`, `0`, or [`NOT_NUMERIC`].
///
/// # Examples
///
/// ```
/// use billing_core::formatting::format_delta;
/// use billing_core::models::Delta;
///
/// assert_eq!(format_delta(&Delta::Count(1500)), "+1,500");
/// assert_eq!(format_delta(&Delta::Count(-3)), "-3");
/// assert_eq!(format_delta(&Delta::Count(0)), "0");
/// assert_eq!(format_delta(&Delta::NotNumeric), "—");
/// ```
pub fn format_delta(delta: &Delta) -> String {
    match delta {
        Delta::Count(n) if *n > 0 => format!("+{}", format_count(*n)),
        Delta::Count(n) => format_count(*n),
        Delta::NotNumeric => NOT_NUMERIC.to_string(),
    }
}

/// Format a license value for display: grouped counts, text verbatim.
pub fn format_value(value: &LicenseValue) -> String {
    match value {
        LicenseValue::Count(n) => format_count(*n),
        LicenseValue::Text(s) => s.clone(),
    }
}

/// CSS-style tone for a delta: `"positive"`, `"negative"` or `"neutral"`.
pub fn delta_tone(delta: &Delta) -> &'static str {
    match delta {
        Delta::Count(n) if *n > 0 => "positive",
        Delta::Count(n) if *n < 0 => "negative",
        _ => "neutral",
    }
}

/// Relative change from `older` to `newer` in percent, rounded to
/// `decimal_places`.
///
/// Returns `None` when `older` is zero.
///
/// # Examples
///
/// ```
/// use billing_core::formatting::percent_change;
///
/// assert_eq!(percent_change(200, 250, 1), Some(25.0));
/// assert_eq!(percent_change(0, 10, 1), None);
/// ```
pub fn percent_change(older: i64, newer: i64, decimal_places: u32) -> Option<f64> {
    if older == 0 {
        return None;
    }
    let raw = ((i128::from(newer) - i128::from(older)) as f64 / older as f64) * 100.0;
    let factor = 10_f64.powi(decimal_places as i32);
    Some((raw * factor).round() / factor)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// Insert commas every three digits from the right of an integer string.
fn group_thousands(s: &str) -> String {
    if s.len() <= 3 {
        return s.to_string();
    }
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    let remainder = chars.len() % 3;
    for (i, &c) in chars.iter().enumerate() {
        if i != 0 && (i % 3 == remainder) {
            result.push(',');
        }
        result.push(c);
    }
    result
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // ── format_count ─────────────────────────────────────────────────────────

    #[test]
    fn test_format_count_small() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(5), "5");
        assert_eq!(format_count(999), "999");
    }

    #[test]
    fn test_format_count_thousands() {
        assert_eq!(format_count(1_000), "1,000");
        assert_eq!(format_count(1_234), "1,234");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_count_negative() {
        assert_eq!(format_count(-12), "-12");
        assert_eq!(format_count(-9_876), "-9,876");
    }

    #[test]
    fn test_format_count_extremes() {
        assert_eq!(format_count(i64::MIN), "-9,223,372,036,854,775,808");
    }

    // ── format_delta / delta_tone ────────────────────────────────────────────

    #[test]
    fn test_format_delta_signs() {
        assert_eq!(format_delta(&Delta::Count(2)), "+2");
        assert_eq!(format_delta(&Delta::Count(-2)), "-2");
        assert_eq!(format_delta(&Delta::Count(0)), "0");
    }

    #[test]
    fn test_format_delta_not_numeric() {
        assert_eq!(format_delta(&Delta::NotNumeric), NOT_NUMERIC);
    }

    #[test]
    fn test_delta_tone() {
        assert_eq!(delta_tone(&Delta::Count(4)), "positive");
        assert_eq!(delta_tone(&Delta::Count(-1)), "negative");
        assert_eq!(delta_tone(&Delta::Count(0)), "neutral");
        assert_eq!(delta_tone(&Delta::NotNumeric), "neutral");
    }

    // ── format_value ─────────────────────────────────────────────────────────

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(&LicenseValue::Count(2500)), "2,500");
        assert_eq!(
            format_value(&LicenseValue::Text("E3, E5".to_string())),
            "E3, E5"
        );
    }

    // ── percent_change ───────────────────────────────────────────────────────

    #[test]
    fn test_percent_change_decrease() {
        assert_eq!(percent_change(40, 30, 1), Some(-25.0));
    }

    #[test]
    fn test_percent_change_rounding() {
        let p = percent_change(3, 4, 2).unwrap();
        assert!((p - 33.33).abs() < 1e-9, "percent = {p}");
    }

    #[test]
    fn test_percent_change_zero_base() {
        assert_eq!(percent_change(0, 0, 2), None);
    }

    #[test]
    fn test_percent_change_extreme_values() {
        assert_eq!(percent_change(-1, i64::MAX, 0).map(f64::is_finite), Some(true));
        assert_eq!(percent_change(i64::MIN, i64::MAX, 1).map(|p| p < 0.0), Some(true));
    }
}
