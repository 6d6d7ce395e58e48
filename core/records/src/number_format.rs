//! FILENAME: core/records/src/number_format.rs
//! PURPOSE: Number formatting utilities for displaying aggregated values.
//! CONTEXT: Pivot output is shown with grouped thousands and a bounded number
//! of fractional digits (e.g. `1,234.57`, `820`, `0.5`).

/// Formats a number with thousands separators and at most
/// `max_fraction_digits` fractional digits. Trailing fractional zeros are
/// dropped, so `820.0` renders as `820` and `0.50` as `0.5`.
pub fn format_grouped(value: f64, max_fraction_digits: u8) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "∞" } else { "-∞" }.to_string();
    }

    let rounded = format!("{:.prec$}", value, prec = max_fraction_digits as usize);
    let trimmed = if rounded.contains('.') {
        rounded.trim_end_matches('0').trim_end_matches('.')
    } else {
        rounded.as_str()
    };

    add_thousands_separator(trimmed)
}

/// Add thousands separators to a numeric string.
fn add_thousands_separator(s: &str) -> String {
    let (integer_part, decimal_part) = match s.split_once('.') {
        Some((int, dec)) => (int, Some(dec)),
        None => (s, None),
    };

    let negative = integer_part.starts_with('-');
    let digits: String = integer_part.chars().filter(|c| c.is_ascii_digit()).collect();

    let mut result = String::with_capacity(s.len() + digits.len() / 3 + 1);
    if negative {
        result.push('-');
    }

    let len = digits.len();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }

    if let Some(decimal) = decimal_part {
        result.push('.');
        result.push_str(decimal);
    }

    result
}
