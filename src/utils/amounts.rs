//! Amount conversions between zatoshis and whole-ZEC values.
//!
//! The wallet engine reports every amount in zatoshis (integer minor units).
//! UI-facing balances are whole-ZEC floats, while transaction detail amounts
//! are 8-decimal fixed-point strings so that they can be re-parsed and summed
//! without floating point drift.

/// Number of zatoshis in one ZEC.
pub const ZATS_PER_ZEC: u64 = 100_000_000;

/// Convert a zatoshi amount to a whole-ZEC value.
pub fn zats_to_zec(zats: i64) -> f64 {
    zats as f64 / ZATS_PER_ZEC as f64
}

/// Format a zatoshi amount as an 8-decimal fixed-point string, e.g. `-1.50000000`.
pub fn format_zats(zats: i64) -> String {
    let sign = if zats < 0 { "-" } else { "" };
    let abs = zats.unsigned_abs();
    format!(
        "{}{}.{:08}",
        sign,
        abs / ZATS_PER_ZEC,
        abs % ZATS_PER_ZEC
    )
}

/// Parse an 8-decimal fixed-point string back into zatoshis.
///
/// Accepts fewer than 8 fractional digits (padded with zeros) and truncates
/// anything beyond 8. Returns `None` for strings that are not plain decimal
/// numbers.
pub fn parse_zats(s: &str) -> Option<i64> {
    let (negative, digits) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };

    let (whole, frac) = match digits.split_once('.') {
        Some((w, f)) => (w, f),
        None => (digits, ""),
    };

    if whole.is_empty() && frac.is_empty() {
        return None;
    }

    let whole_zats = if whole.is_empty() {
        0u64
    } else {
        if !whole.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        whole.parse::<u64>().ok()?
    };

    if !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let mut frac_digits: String = frac.chars().take(8).collect();
    while frac_digits.len() < 8 {
        frac_digits.push('0');
    }
    let frac_zats = frac_digits.parse::<u64>().ok()?;

    let magnitude = whole_zats.checked_mul(ZATS_PER_ZEC)?.checked_add(frac_zats)?;
    let magnitude = i64::try_from(magnitude).ok()?;
    Some(if negative { -magnitude } else { magnitude })
}
