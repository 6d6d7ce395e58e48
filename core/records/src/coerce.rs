//! FILENAME: core/records/src/coerce.rs
//! PURPOSE: Scripting-host compatible conversions between numbers and text.
//! CONTEXT: Records originate from a browser-side data layer, so grouping keys
//! and numeric aggregation must agree with how that layer stringifies numbers
//! and how it parses numeric prefixes out of free text.

// ============================================================================
// NUMBER -> TEXT
// ============================================================================

/// Formats a number the way `String(n)` does in the host scripting layer.
///
/// - Integral values print without a fractional part (`100`, not `100.0`).
/// - Magnitudes at or above `1e21`, or below `1e-6`, use exponent form
///   with an explicit sign on the exponent (`1e+21`, `1.5e-7`).
/// - Non-finite values print as `NaN`, `Infinity` and `-Infinity`.
pub fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        // Covers -0 as well.
        return "0".to_string();
    }

    let abs_value = value.abs();
    if abs_value >= 1e21 || abs_value < 1e-6 {
        let formatted = format!("{:e}", value);
        return match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{}e+{}", mantissa, exponent)
            }
            _ => formatted,
        };
    }

    // Display for f64 is the shortest round-tripping decimal, same as the
    // host, and prints integral values without a fractional part.
    format!("{}", value)
}

// ============================================================================
// TEXT -> NUMBER
// ============================================================================

/// Parses the longest leading decimal literal, like `parseFloat`.
///
/// Leading whitespace is skipped and trailing garbage is ignored, so
/// `"12.5kg"` parses to `12.5`. Returns `None` when no numeric prefix
/// exists (the host would produce `NaN`).
pub fn parse_float(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut pos = 0;

    if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
        pos += 1;
    }

    if s[pos..].starts_with("Infinity") {
        return Some(if bytes.first() == Some(&b'-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let mut digit_count = pos - int_start;

    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut frac_end = frac_start;
        while frac_end < bytes.len() && bytes[frac_end].is_ascii_digit() {
            frac_end += 1;
        }
        if digit_count > 0 || frac_end > frac_start {
            digit_count += frac_end - frac_start;
            pos = frac_end;
        }
    }

    if digit_count == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it.
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut exp_pos = pos + 1;
        if exp_pos < bytes.len() && (bytes[exp_pos] == b'+' || bytes[exp_pos] == b'-') {
            exp_pos += 1;
        }
        let exp_digits_start = exp_pos;
        while exp_pos < bytes.len() && bytes[exp_pos].is_ascii_digit() {
            exp_pos += 1;
        }
        if exp_pos > exp_digits_start {
            pos = exp_pos;
        }
    }

    s[..pos].parse::<f64>().ok()
}

/// Parses the leading base-10 integer, like `parseInt(text, 10)`.
///
/// `"20.9"` parses to `20` and `"1e3"` parses to `1`: everything after the
/// first run of digits is ignored. Returns `None` when there are no digits.
pub fn parse_int(text: &str) -> Option<f64> {
    let s = text.trim_start();
    let bytes = s.as_bytes();
    let mut pos = 0;
    let mut negative = false;

    if pos < bytes.len() && (bytes[pos] == b'+' || bytes[pos] == b'-') {
        negative = bytes[pos] == b'-';
        pos += 1;
    }

    let digits_start = pos;
    let mut result = 0.0_f64;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        result = result * 10.0 + f64::from(bytes[pos] - b'0');
        pos += 1;
    }

    if pos == digits_start {
        return None;
    }

    Some(if negative { -result } else { result })
}
