//! FILENAME: core/pivot-engine/src/filter.rs
//! Filter Stage - narrows the record set before any grouping happens.

use rustc_hash::FxHashSet;

use records::{record_key, Record};

use crate::definition::PivotFilter;

/// Filter prepared for repeated matching: allow-list as a hash set.
struct ActiveFilter<'f> {
    field: &'f str,
    allowed: FxHashSet<&'f str>,
}

/// Returns references to the records that pass every filter, in input order.
///
/// Filters are a logical AND. A filter with an empty allow-list matches
/// everything; values are compared after key coercion, so `"null"` in an
/// allow-list admits records where the field is missing or null.
pub fn apply_filters<'a>(records: &'a [Record], filters: &[PivotFilter]) -> Vec<&'a Record> {
    let active: Vec<ActiveFilter<'_>> = filters
        .iter()
        .filter(|f| !f.allowed_values.is_empty())
        .map(|f| ActiveFilter {
            field: &f.field,
            allowed: f.allowed_values.iter().map(String::as_str).collect(),
        })
        .collect();

    if active.is_empty() {
        return records.iter().collect();
    }

    records
        .iter()
        .filter(|record| {
            active
                .iter()
                .all(|f| f.allowed.contains(record_key(record, f.field).as_str()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use records::{record, FieldValue};

    fn data() -> Vec<Record> {
        vec![
            record([("region", FieldValue::from("North")), ("year", FieldValue::from(2023))]),
            record([("region", FieldValue::from("South")), ("year", FieldValue::from(2024))]),
            record([("region", FieldValue::from("North")), ("year", FieldValue::from(2024))]),
            record([("year", FieldValue::from(2024))]),
        ]
    }

    #[test]
    fn test_no_filters_is_identity() {
        let records = data();
        let filtered = apply_filters(&records, &[]);
        assert_eq!(filtered.len(), 4);
        for (original, kept) in records.iter().zip(&filtered) {
            assert!(std::ptr::eq(original, *kept));
        }
    }

    #[test]
    fn test_empty_allow_list_matches_everything() {
        let records = data();
        let filters = vec![PivotFilter::new("region", Vec::<String>::new())];
        assert_eq!(apply_filters(&records, &filters).len(), 4);
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let records = data();
        let filters = vec![
            PivotFilter::new("region", ["North"]),
            PivotFilter::new("year", ["2024"]),
        ];
        let filtered = apply_filters(&records, &filters);
        assert_eq!(filtered.len(), 1);
        assert!(std::ptr::eq(filtered[0], &records[2]));
    }

    #[test]
    fn test_null_allow_list_matches_missing_field() {
        let records = data();
        let filters = vec![PivotFilter::new("region", ["null"])];
        let filtered = apply_filters(&records, &filters);
        assert_eq!(filtered.len(), 1);
        assert!(std::ptr::eq(filtered[0], &records[3]));
    }
}
