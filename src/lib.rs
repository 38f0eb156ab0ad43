//! # Freight Ledger
//!
//! Aggregation and arithmetic core for a shipment billing tracker.
//!
//! ## Core Concepts
//!
//! - **Ledger Entry**: One normalized billing record with native (RMB) and
//!   secondary (HKD) amounts, two surcharges and its own conversion rate
//! - **Day Bucket**: Entries and notes sharing one calendar day, with a per-day
//!   breakdown of every currency component
//! - **Totals**: Grand sums across all entries, kept in exact decimals and only
//!   rounded for display
//! - **Calculator**: Keypad-driven infix expressions evaluated through postfix
//!
//! ## Example
//!
//! ```rust,ignore
//! use freight_ledger::*;
//! use rust_decimal::Decimal;
//!
//! let config = LedgerConfig {
//!     default_rate: Decimal::new(92, 2),
//!     utc_offset_seconds: 8 * 3600,
//!     display_scale: 2,
//! };
//!
//! let rows = vec![RawLedgerRow {
//!     id: 1,
//!     timestamp: 1_709_323_200_000,
//!     native_amount: Some("1200".to_string()),
//!     secondary_amount: Some("85.5".to_string()),
//!     ..Default::default()
//! }];
//!
//! let processor = LedgerProcessor::new(&config)?;
//! let view = processor.process(&rows, &[]);
//! println!("{}", view.rounded_totals().grand_total);
//!
//! let mut calculator = processor.calculator();
//! for key in ["7", "+", "3", "*", "2", "done"] {
//!     calculator.press_str(key)?;
//! }
//! assert_eq!(calculator.display(), "13");
//! ```

pub mod bucketizer;
pub mod calculator;
pub mod error;
pub mod form;
pub mod model;
pub mod normalizer;
pub mod schema;
pub mod totals;

pub use bucketizer::{attach_markers, bucketize, group_markers};
pub use calculator::{Calculator, CalculatorState, Key, Operator, Token, TokenStream};
pub use error::{LedgerError, Result};
pub use form::{EntryForm, FieldOrder, NumericField};
pub use model::{display_amount, Aggregated, DayBucket, LedgerEntry, MarkerEntry, Totals};
pub use normalizer::{normalize, parse_attachments, Normalizer};
pub use schema::*;
pub use totals::{accumulate, accumulate_strict, sum_buckets};

use chrono::NaiveDate;
use log::{debug, info};
use rust_decimal::Decimal;
use serde::Serialize;

/// Everything the view layer needs for one query result.
#[derive(Debug, Serialize)]
pub struct LedgerView {
    pub buckets: Vec<DayBucket>,
    pub totals: Totals,
    /// Entries left out of every sum, by error.
    #[serde(serialize_with = "serialize_issues")]
    pub issues: Vec<LedgerError>,
    /// Decimal places used for every displayed amount.
    pub display_scale: u32,
}

impl LedgerView {
    /// Grand totals rounded half away from zero to `display_scale`.
    pub fn rounded_totals(&self) -> Totals {
        self.totals.rounded(self.display_scale)
    }

    pub fn display_subtotals(&self) -> Vec<(NaiveDate, Decimal)> {
        self.buckets
            .iter()
            .map(|bucket| (bucket.date, bucket.display_subtotal(self.display_scale)))
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn entry_count(&self) -> usize {
        self.buckets.iter().map(|b| b.entries.len()).sum()
    }
}

fn serialize_issues<S>(issues: &[LedgerError], serializer: S) -> std::result::Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.collect_seq(issues.iter().map(|issue| issue.to_string()))
}

pub struct LedgerProcessor {
    normalizer: Normalizer,
    display_scale: u32,
}

impl LedgerProcessor {
    pub fn new(config: &LedgerConfig) -> Result<Self> {
        Ok(Self {
            normalizer: Normalizer::from_config(config)?,
            display_scale: config.display_scale,
        })
    }

    pub fn display_scale(&self) -> u32 {
        self.display_scale
    }

    /// A fresh keypad calculator rounding its results to the configured scale.
    pub fn calculator(&self) -> Calculator {
        Calculator::new(self.display_scale)
    }

    /// A keypad calculator opened over the current text of `field`.
    pub fn calculator_for(&self, form: &EntryForm, field: NumericField) -> Calculator {
        Calculator::with_initial(form.get(field), self.display_scale)
    }

    /// Writes a calculator result into the form at the configured scale and
    /// returns the field that should take focus next.
    pub fn apply_result(
        &self,
        form: &mut EntryForm,
        field: NumericField,
        value: Decimal,
    ) -> Option<NumericField> {
        form.apply_result(field, value, self.display_scale)
    }

    /// Normalizes, groups and totals one already-sorted query result. Rows are
    /// never re-sorted; marker placement assumes descending timestamps.
    pub fn process(&self, rows: &[RawLedgerRow], marker_rows: &[RawMarkerRow]) -> LedgerView {
        info!(
            "Processing {} ledger rows and {} markers at default rate {}",
            rows.len(),
            marker_rows.len(),
            self.normalizer.default_rate()
        );

        let entries = self.normalizer.normalize_all(rows);
        let markers = self.normalizer.normalize_markers(marker_rows);

        let grouped = bucketize(&entries);
        let buckets = attach_markers(grouped.value, &markers);
        let totals = accumulate(&entries);

        debug!(
            "Produced {} buckets, {} entries rejected",
            buckets.len(),
            totals.issues.len()
        );

        LedgerView {
            buckets,
            totals: totals.value,
            issues: totals.issues,
            display_scale: self.display_scale,
        }
    }
}

pub fn process_ledger(
    config: &LedgerConfig,
    rows: &[RawLedgerRow],
    marker_rows: &[RawMarkerRow],
) -> Result<LedgerView> {
    Ok(LedgerProcessor::new(config)?.process(rows, marker_rows))
}
