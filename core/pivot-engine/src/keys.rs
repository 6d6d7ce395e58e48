//! FILENAME: core/pivot-engine/src/keys.rs
//! Key Deriver - ordered row/column key spaces.
//!
//! For every grouping field the distinct coerced values are collected and
//! sorted; the key space is the cartesian product of those lists with the
//! outermost field varying slowest. Empty combinations are kept: consumers
//! rely on the full product to lay out hierarchical headers.

use std::cmp::Ordering;

use rustc_hash::FxHashSet;

use records::{parse_float, record_key, Record};

use crate::definition::Axis;
use crate::error::{PivotError, Result};

/// One distinct combination of grouping-field values, outermost first.
pub type KeyTuple = Vec<String>;

/// Cardinality guard applied while deriving one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardinalityCheck {
    pub axis: Axis,
    pub limit: usize,
}

impl CardinalityCheck {
    pub fn new(axis: Axis, limit: usize) -> Self {
        CardinalityCheck { axis, limit }
    }
}

// ============================================================================
// KEY DERIVATION
// ============================================================================

/// Derives the ordered key tuples for `fields` over `records`.
///
/// With no fields the result is a single empty tuple (one ungrouped
/// header). No cardinality limit applies; callers use this for inputs they
/// know to be bounded.
pub fn derive_keys(records: &[&Record], fields: &[String]) -> Vec<KeyTuple> {
    let per_field: Vec<Vec<String>> = fields
        .iter()
        .map(|field| sorted_values(distinct_values(records, field)))
        .collect();
    cartesian_product(&per_field)
}

/// Like [`derive_keys`], but validates every field's distinct count
/// against `check.limit` before any combination is generated. The first
/// offending field (in configuration order) is reported.
pub fn derive_keys_checked(
    records: &[&Record],
    fields: &[String],
    check: CardinalityCheck,
) -> Result<Vec<KeyTuple>> {
    let mut per_field: Vec<Vec<String>> = Vec::with_capacity(fields.len());
    for field in fields {
        let distinct = distinct_values(records, field);
        if distinct.len() > check.limit {
            return Err(PivotError::CardinalityExceeded {
                field_name: field.clone(),
                field_type: check.axis,
                distinct_count: distinct.len(),
                limit: check.limit,
            });
        }
        per_field.push(sorted_values(distinct));
    }
    Ok(cartesian_product(&per_field))
}

fn sorted_values(distinct: FxHashSet<String>) -> Vec<String> {
    let mut sorted: Vec<String> = distinct.into_iter().collect();
    sorted.sort_by(|a, b| compare_key_values(a, b));
    sorted
}

/// Distinct coerced values of one field, in no particular order.
pub fn distinct_values(records: &[&Record], field: &str) -> FxHashSet<String> {
    records.iter().map(|record| record_key(record, field)).collect()
}

/// Combines per-field value lists, first field varying slowest.
///
/// Built as an iterative fold over the field list, so deep nesting never
/// recurses. Any empty list makes the whole product empty.
pub fn cartesian_product(per_field: &[Vec<String>]) -> Vec<KeyTuple> {
    per_field.iter().fold(vec![Vec::new()], |prefixes, values| {
        let mut next = Vec::with_capacity(prefixes.len() * values.len());
        for prefix in &prefixes {
            for value in values {
                let mut tuple = Vec::with_capacity(prefix.len() + 1);
                tuple.extend_from_slice(prefix);
                tuple.push(value.clone());
                next.push(tuple);
            }
        }
        next
    })
}

// ============================================================================
// ORDERING
// ============================================================================

/// Header ordering for coerced key values.
///
/// Values with a numeric prefix compare numerically and sort ahead of
/// purely textual values; everything else (and numeric ties) falls back to
/// [`natural_cmp`]. The result is a total order, so sorting is
/// deterministic for any input.
pub fn compare_key_values(a: &str, b: &str) -> Ordering {
    match (parse_float(a), parse_float(b)) {
        (Some(x), Some(y)) => x.total_cmp(&y).then_with(|| natural_cmp(a, b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => natural_cmp(a, b),
    }
}

/// Collation with numeric-substring awareness (`"item2" < "item10"`).
///
/// Levels, in order:
/// 1. token sequence: digit runs by numeric value, other characters by
///    class (whitespace < punctuation < digits < letters) then case-folded
/// 2. case of letters, lowercase first
/// 3. raw bytes, so distinct strings never compare equal
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    compare_tokens(a, b)
        .then_with(|| compare_case(a, b))
        .then_with(|| a.cmp(b))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum CharClass {
    Whitespace,
    Punctuation,
    Digit,
    Letter,
}

fn char_class(c: char) -> CharClass {
    if c.is_whitespace() {
        CharClass::Whitespace
    } else if c.is_ascii_digit() {
        CharClass::Digit
    } else if c.is_alphanumeric() {
        CharClass::Letter
    } else {
        CharClass::Punctuation
    }
}

fn fold_case(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

#[derive(Debug, Clone, Copy)]
enum Token<'s> {
    Digits(&'s str),
    Char(char),
}

/// Splits text into maximal ASCII digit runs and single characters.
struct Tokens<'s> {
    rest: &'s str,
}

impl<'s> Iterator for Tokens<'s> {
    type Item = Token<'s>;

    fn next(&mut self) -> Option<Token<'s>> {
        let first = self.rest.chars().next()?;
        if first.is_ascii_digit() {
            let end = self
                .rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(self.rest.len());
            let (digits, rest) = self.rest.split_at(end);
            self.rest = rest;
            Some(Token::Digits(digits))
        } else {
            self.rest = &self.rest[first.len_utf8()..];
            Some(Token::Char(first))
        }
    }
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn compare_token(a: Token<'_>, b: Token<'_>) -> Ordering {
    match (a, b) {
        (Token::Digits(x), Token::Digits(y)) => compare_digit_runs(x, y),
        (Token::Digits(_), Token::Char(c)) => CharClass::Digit.cmp(&char_class(c)),
        (Token::Char(c), Token::Digits(_)) => char_class(c).cmp(&CharClass::Digit),
        (Token::Char(x), Token::Char(y)) => char_class(x)
            .cmp(&char_class(y))
            .then_with(|| fold_case(x).cmp(&fold_case(y))),
    }
}

fn compare_tokens(a: &str, b: &str) -> Ordering {
    let mut left = Tokens { rest: a };
    let mut right = Tokens { rest: b };
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = compare_token(x, y);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Compares the case pattern of the letters only; strings reaching this
/// level have the same case-folded letters in the same order.
fn compare_case(a: &str, b: &str) -> Ordering {
    let ranks = |s: &str| {
        s.chars()
            .filter(|c| c.is_alphabetic())
            .map(|c| c.is_uppercase())
            .collect::<Vec<bool>>()
    };
    ranks(a).cmp(&ranks(b))
}
