//! Streaming day grouping for ledger entries and notes.
//!
//! Entries are grouped in a single append-only pass: an entry joins the most
//! recently opened bucket when it shares that bucket's calendar day, otherwise
//! it opens a new one. Input is never re-sorted, so `[day1, day2, day1]`
//! yields three buckets.
//!
//! Markers are merged afterwards. A marker joins any existing bucket for its
//! day; otherwise a new bucket is inserted before the first bucket with a
//! strictly earlier date. That placement is only meaningful when the bucket
//! list is in descending date order, which is the ordering callers must
//! supply for marker views.

use crate::model::{Aggregated, DayBucket, LedgerEntry, MarkerEntry};
use log::{debug, warn};

pub fn bucketize(entries: &[LedgerEntry]) -> Aggregated<Vec<DayBucket>> {
    let mut buckets: Vec<DayBucket> = Vec::new();
    let mut issues = Vec::new();

    for entry in entries {
        let bucket = match buckets.last_mut() {
            Some(current) if current.date == entry.date => current,
            _ => {
                buckets.push(DayBucket::new(entry.date));
                buckets.last_mut().expect("bucket just added")
            }
        };

        if let Err(e) = bucket.breakdown.absorb(entry) {
            warn!("Entry {} left out of the {} subtotal: {}", entry.id, bucket.date, e);
            issues.push(e);
        }
        bucket.entries.push(entry.clone());
    }

    debug!(
        "Grouped {} entries into {} day buckets",
        entries.len(),
        buckets.len()
    );

    Aggregated {
        value: buckets,
        issues,
    }
}

pub fn attach_markers(mut buckets: Vec<DayBucket>, markers: &[MarkerEntry]) -> Vec<DayBucket> {
    for marker in markers {
        if let Some(existing) = buckets.iter_mut().find(|b| b.date == marker.date) {
            existing.markers.push(marker.clone());
            continue;
        }

        let mut bucket = DayBucket::new(marker.date);
        bucket.markers.push(marker.clone());

        match buckets.iter().position(|b| b.date < marker.date) {
            Some(index) => buckets.insert(index, bucket),
            None => buckets.push(bucket),
        }
    }

    buckets
}

/// Marker-only grouping used by annotation views.
pub fn group_markers(markers: &[MarkerEntry]) -> Vec<DayBucket> {
    attach_markers(Vec::new(), markers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::fixtures::{entry, marker};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[test]
    fn test_single_day_collapse_keeps_input_order() {
        let entries = vec![
            entry(3, 2024, 5, 10, dec!(30), dec!(1)),
            entry(1, 2024, 5, 10, dec!(10), dec!(1)),
            entry(2, 2024, 5, 10, dec!(20), dec!(1)),
        ];
        let result = bucketize(&entries);
        assert!(result.is_clean());
        assert_eq!(result.value.len(), 1);

        let ids: Vec<i64> = result.value[0].entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);
        assert_eq!(result.value[0].subtotal(), dec!(60));
    }

    #[test]
    fn test_day_interleaving_splits() {
        let entries = vec![
            entry(1, 2024, 5, 1, dec!(1), dec!(1)),
            entry(2, 2024, 5, 2, dec!(2), dec!(1)),
            entry(3, 2024, 5, 1, dec!(4), dec!(1)),
        ];
        let buckets = bucketize(&entries).value;
        let dates: Vec<NaiveDate> = buckets.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(1)]);
        assert_eq!(buckets[2].subtotal(), dec!(4));
    }

    #[test]
    fn test_zero_rate_entry_is_kept_but_not_summed() {
        let entries = vec![
            entry(1, 2024, 5, 1, dec!(10), dec!(2)),
            entry(2, 2024, 5, 1, dec!(100), Decimal::ZERO),
        ];
        let result = bucketize(&entries);
        assert_eq!(result.rejected_ids(), vec![2]);
        assert_eq!(result.value[0].entries.len(), 2);
        assert_eq!(result.value[0].subtotal(), dec!(5));
        assert_eq!(result.value[0].breakdown.native_sum, dec!(10));
    }

    #[test]
    fn test_marker_joins_existing_bucket_anywhere() {
        let buckets = bucketize(&[
            entry(1, 2024, 5, 3, dec!(1), dec!(1)),
            entry(2, 2024, 5, 2, dec!(1), dec!(1)),
        ])
        .value;
        let buckets = attach_markers(buckets, &[marker(10, 2024, 5, 3), marker(11, 2024, 5, 3)]);

        assert_eq!(buckets.len(), 2);
        let ids: Vec<i64> = buckets[0].markers.iter().map(|m| m.id).collect();
        assert_eq!(ids, vec![10, 11]);
        assert!(buckets[1].markers.is_empty());
    }

    #[test]
    fn test_marker_only_bucket_inserted_in_descending_order() {
        let buckets = bucketize(&[
            entry(1, 2024, 5, 9, dec!(1), dec!(1)),
            entry(2, 2024, 5, 5, dec!(1), dec!(1)),
            entry(3, 2024, 5, 1, dec!(1), dec!(1)),
        ])
        .value;
        let buckets = attach_markers(
            buckets,
            &[
                marker(10, 2024, 5, 7),
                marker(11, 2024, 5, 12),
                marker(12, 2024, 4, 30),
            ],
        );

        let dates: Vec<NaiveDate> = buckets.iter().map(|b| b.date).collect();
        assert_eq!(
            dates,
            vec![
                day(12),
                day(9),
                day(7),
                day(5),
                day(1),
                NaiveDate::from_ymd_opt(2024, 4, 30).unwrap()
            ]
        );

        let inserted = &buckets[2];
        assert!(inserted.is_marker_only());
        assert_eq!(inserted.subtotal(), Decimal::ZERO);
    }

    #[test]
    fn test_ascending_input_reverses_marker_placement() {
        let buckets = bucketize(&[
            entry(1, 2024, 5, 1, dec!(1), dec!(1)),
            entry(2, 2024, 5, 9, dec!(1), dec!(1)),
        ])
        .value;
        let buckets = attach_markers(buckets, &[marker(10, 2024, 5, 5)]);

        let dates: Vec<NaiveDate> = buckets.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![day(5), day(1), day(9)]);
    }

    #[test]
    fn test_group_markers_from_empty() {
        let buckets = group_markers(&[
            marker(1, 2024, 5, 2),
            marker(2, 2024, 5, 8),
            marker(3, 2024, 5, 2),
        ]);
        let dates: Vec<NaiveDate> = buckets.iter().map(|b| b.date).collect();
        assert_eq!(dates, vec![day(8), day(2)]);
        assert_eq!(buckets[1].markers.len(), 2);
    }
}
