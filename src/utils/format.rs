//! Number <-> text conversions that have to agree with the GrooveStats
//! tooling byte for byte. Rust's own float formatting rounds ties to even and
//! its parser accepts spellings (`inf`, `nan`) the ingestion side never
//! produced, so the chart hash and breakdown strings go through here instead.

// An f64 never has more than 1074 significant fractional digits.
const EXACT_FRACTION_DIGITS: usize = 1100;

/// Formats `value` with exactly `digits` fractional digits, rounding ties
/// away from zero (`Number.prototype.toFixed`).
pub fn to_fixed(value: f64, digits: usize) -> String {
    if let Some(special) = non_finite(value) {
        return special.to_owned();
    }
    // -0 prints without a sign.
    let value = if value == 0.0 { 0.0 } else { value };
    let value = if is_tie(value, digits) {
        // One ulp away from zero, so the tie resolves upward in magnitude.
        f64::from_bits(value.to_bits() + 1)
    } else {
        value
    };
    format!("{value:.digits$}")
}

/// Shortest round-trip rendering (`Number.prototype.toString` for the range
/// chart statistics live in).
pub fn to_display(value: f64) -> String {
    if let Some(special) = non_finite(value) {
        return special.to_owned();
    }
    let value = if value == 0.0 { 0.0 } else { value };
    format!("{value}")
}

/// Whitespace as the ingestion tooling trims it: Unicode spaces and line
/// breaks plus the byte-order mark, but not NEL (U+0085).
#[inline]
pub fn is_blank(c: char) -> bool {
    c == '\u{feff}' || (c.is_whitespace() && c != '\u{85}')
}

/// Parses numeric text the way `Number()` does: surrounding whitespace is
/// ignored, empty text is zero, and anything malformed becomes NaN.
pub fn parse_number(text: &str) -> f64 {
    let trimmed = text.trim_matches(is_blank);
    if trimmed.is_empty() {
        return 0.0;
    }
    match trimmed {
        "Infinity" | "+Infinity" => return f64::INFINITY,
        "-Infinity" => return f64::NEG_INFINITY,
        _ => {}
    }

    for (prefix, radix) in [("0x", 16), ("0X", 16), ("0o", 8), ("0O", 8), ("0b", 2), ("0B", 2)] {
        if let Some(digits) = trimmed.strip_prefix(prefix) {
            return parse_radix_digits(digits, radix);
        }
    }

    // `str::parse` also takes "inf", "nan" and "infinity" in any case.
    if trimmed
        .bytes()
        .any(|b| b.is_ascii_alphabetic() && !matches!(b, b'e' | b'E'))
    {
        return f64::NAN;
    }
    trimmed.parse().unwrap_or(f64::NAN)
}

// No sign allowed after the prefix. Values past u64 still come out as floats.
fn parse_radix_digits(digits: &str, radix: u32) -> f64 {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return f64::NAN;
    }
    match u64::from_str_radix(digits, radix) {
        Ok(v) => v as f64,
        Err(_) => digits
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d)),
    }
}

fn non_finite(value: f64) -> Option<&'static str> {
    if value.is_nan() {
        Some("NaN")
    } else if value.is_infinite() {
        Some(if value > 0.0 { "Infinity" } else { "-Infinity" })
    } else {
        None
    }
}

/// True when the exact binary value sits halfway between two `digits`-place
/// decimals.
fn is_tie(value: f64, digits: usize) -> bool {
    let exact = format!("{:.*}", EXACT_FRACTION_DIGITS, value.abs());
    let fraction = exact.split_once('.').map_or("", |(_, f)| f);
    fraction
        .get(digits..)
        .and_then(|rest| rest.strip_prefix('5'))
        .is_some_and(|rest| rest.bytes().all(|b| b == b'0'))
}
