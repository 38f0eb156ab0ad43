use crate::error::Result;
use crate::model::{Aggregated, DayBucket, LedgerEntry, Totals};
use log::{debug, warn};

/// Grand totals over all entries. Entries whose converted total cannot be
/// computed are reported in `issues` and contribute to no component.
pub fn accumulate(entries: &[LedgerEntry]) -> Aggregated<Totals> {
    let mut totals = Totals::default();
    let mut issues = Vec::new();

    for entry in entries {
        if let Err(e) = totals.absorb(entry) {
            warn!("Entry {} left out of grand totals: {}", entry.id, e);
            issues.push(e);
        }
    }

    debug!(
        "Accumulated {} entries ({} rejected), grand total {}",
        entries.len(),
        issues.len(),
        totals.grand_total
    );

    Aggregated {
        value: totals,
        issues,
    }
}

/// Like [`accumulate`] but stops at the first entry that cannot be converted.
pub fn accumulate_strict(entries: &[LedgerEntry]) -> Result<Totals> {
    let mut totals = Totals::default();
    for entry in entries {
        totals.absorb(entry)?;
    }
    Ok(totals)
}

/// Re-derives grand totals from per-day breakdowns.
pub fn sum_buckets(buckets: &[DayBucket]) -> Result<Totals> {
    buckets.iter().try_fold(Totals::default(), |mut acc, bucket| {
        acc.merge(&bucket.breakdown)?;
        Ok(acc)
    })
}
