use crate::error::{LedgerError, Result};
use crate::schema::AttachmentDescriptor;
use chrono::{DateTime, FixedOffset, NaiveDate};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// Rounds half away from zero for presentation. Never feed the result back
/// into a running sum.
pub fn display_amount(value: Decimal, scale: u32) -> Decimal {
    value.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub id: i64,
    pub timestamp: DateTime<FixedOffset>,
    pub date: NaiveDate,
    pub order_number: String,
    pub kind: String,
    pub cargo_id: String,
    pub location: String,
    pub note: String,
    pub native_amount: Decimal,
    pub secondary_amount: Decimal,
    pub surcharge_a: Decimal,
    pub surcharge_b: Decimal,
    pub conversion_rate: Decimal,
    pub has_attachment: bool,
    pub attachments: Vec<AttachmentDescriptor>,
}

impl LedgerEntry {
    /// `native / rate + secondary + surcharge_a + surcharge_b` at full precision.
    ///
    /// A zero rate is only an error when there is something to convert.
    pub fn converted_total(&self) -> Result<Decimal> {
        let converted_native = if self.native_amount.is_zero() {
            Decimal::ZERO
        } else if self.conversion_rate.is_zero() {
            return Err(LedgerError::ZeroRateDivision { entry_id: self.id });
        } else {
            self.native_amount
                .checked_div(self.conversion_rate)
                .ok_or_else(|| {
                    LedgerError::ArithmeticOverflow(format!(
                        "{} / {} in entry {}",
                        self.native_amount, self.conversion_rate, self.id
                    ))
                })?
        };

        [self.secondary_amount, self.surcharge_a, self.surcharge_b]
            .iter()
            .try_fold(converted_native, |acc, part| {
                acc.checked_add(*part).ok_or_else(|| {
                    LedgerError::ArithmeticOverflow(format!("total of entry {}", self.id))
                })
            })
    }

    pub fn display_total(&self, scale: u32) -> Result<Decimal> {
        Ok(display_amount(self.converted_total()?, scale))
    }
}

fn checked_sum(lhs: Decimal, rhs: Decimal, context: impl Fn() -> String) -> Result<Decimal> {
    lhs.checked_add(rhs)
        .ok_or_else(|| LedgerError::ArithmeticOverflow(context()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerEntry {
    pub id: i64,
    pub title: String,
    pub color_tag: Option<String>,
    pub timestamp: DateTime<FixedOffset>,
    pub date: NaiveDate,
}

/// Sums broken down by currency component.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub grand_total: Decimal,
    pub native_sum: Decimal,
    pub secondary_sum: Decimal,
    pub surcharge_a_sum: Decimal,
    pub surcharge_b_sum: Decimal,
}

impl Totals {
    /// Adds one entry to every component. On error nothing is added, so a
    /// rejected entry never leaves the components out of step with each other.
    pub fn absorb(&mut self, entry: &LedgerEntry) -> Result<()> {
        let converted = entry.converted_total()?;
        let context = || format!("running totals at entry {}", entry.id);

        let next = Totals {
            grand_total: checked_sum(self.grand_total, converted, context)?,
            native_sum: checked_sum(self.native_sum, entry.native_amount, context)?,
            secondary_sum: checked_sum(self.secondary_sum, entry.secondary_amount, context)?,
            surcharge_a_sum: checked_sum(self.surcharge_a_sum, entry.surcharge_a, context)?,
            surcharge_b_sum: checked_sum(self.surcharge_b_sum, entry.surcharge_b, context)?,
        };
        *self = next;

        Ok(())
    }

    /// Same all-or-nothing rule as [`Totals::absorb`].
    pub fn merge(&mut self, other: &Totals) -> Result<()> {
        let context = || "merging totals".to_string();

        let next = Totals {
            grand_total: checked_sum(self.grand_total, other.grand_total, context)?,
            native_sum: checked_sum(self.native_sum, other.native_sum, context)?,
            secondary_sum: checked_sum(self.secondary_sum, other.secondary_sum, context)?,
            surcharge_a_sum: checked_sum(self.surcharge_a_sum, other.surcharge_a_sum, context)?,
            surcharge_b_sum: checked_sum(self.surcharge_b_sum, other.surcharge_b_sum, context)?,
        };
        *self = next;

        Ok(())
    }

    pub fn rounded(&self, scale: u32) -> Totals {
        Totals {
            grand_total: display_amount(self.grand_total, scale),
            native_sum: display_amount(self.native_sum, scale),
            secondary_sum: display_amount(self.secondary_sum, scale),
            surcharge_a_sum: display_amount(self.surcharge_a_sum, scale),
            surcharge_b_sum: display_amount(self.surcharge_b_sum, scale),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub markers: Vec<MarkerEntry>,
    pub entries: Vec<LedgerEntry>,
    /// Per-day breakdown; `breakdown.grand_total` is the day's subtotal.
    pub breakdown: Totals,
}

impl DayBucket {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            markers: Vec::new(),
            entries: Vec::new(),
            breakdown: Totals::default(),
        }
    }

    pub fn subtotal(&self) -> Decimal {
        self.breakdown.grand_total
    }

    pub fn display_subtotal(&self, scale: u32) -> Decimal {
        display_amount(self.subtotal(), scale)
    }

    pub fn is_marker_only(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An aggregation result together with the entries that had to be left out
/// of its sums.
#[derive(Debug, Default)]
pub struct Aggregated<T> {
    pub value: T,
    pub issues: Vec<LedgerError>,
}

impl<T> Aggregated<T> {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    /// Entry ids rejected with `ZeroRateDivision`.
    pub fn rejected_ids(&self) -> Vec<i64> {
        self.issues
            .iter()
            .filter_map(|issue| match issue {
                LedgerError::ZeroRateDivision { entry_id } => Some(*entry_id),
                _ => None,
            })
            .collect()
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::entry;
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_converted_total_keeps_full_precision() {
        let mut e = entry(1, 2024, 3, 1, dec!(100), dec!(3));
        e.secondary_amount = dec!(5);
        e.surcharge_a = dec!(1.25);
        e.surcharge_b = dec!(0.75);

        let total = e.converted_total().unwrap();
        assert_eq!(total, dec!(100) / dec!(3) + dec!(7));
        assert_eq!(e.display_total(2).unwrap(), dec!(40.33));
    }

    #[test]
    fn test_zero_rate_is_only_an_error_with_native_amount() {
        let e = entry(7, 2024, 3, 1, dec!(100), Decimal::ZERO);
        assert!(matches!(
            e.converted_total(),
            Err(LedgerError::ZeroRateDivision { entry_id: 7 })
        ));

        let mut e = entry(8, 2024, 3, 1, Decimal::ZERO, Decimal::ZERO);
        e.secondary_amount = dec!(12);
        assert_eq!(e.converted_total().unwrap(), dec!(12));
    }

    #[test]
    fn test_absorb_rejects_whole_entry() {
        let mut totals = Totals::default();
        totals
            .absorb(&entry(1, 2024, 3, 1, dec!(10), dec!(2)))
            .unwrap();
        assert!(totals.absorb(&entry(2, 2024, 3, 1, dec!(10), dec!(0))).is_err());

        assert_eq!(totals.grand_total, dec!(5));
        assert_eq!(totals.native_sum, dec!(10));
    }

    #[test]
    fn test_absorb_overflow_leaves_totals_untouched() {
        let mut totals = Totals::default();
        totals
            .absorb(&entry(1, 2024, 3, 1, Decimal::MAX, dec!(1)))
            .unwrap();
        let before = totals.clone();

        let err = totals
            .absorb(&entry(2, 2024, 3, 1, Decimal::MAX, dec!(1)))
            .unwrap_err();
        assert!(matches!(err, LedgerError::ArithmeticOverflow(_)));
        assert_eq!(totals, before);

        let mut merged = before.clone();
        assert!(matches!(
            merged.merge(&before),
            Err(LedgerError::ArithmeticOverflow(_))
        ));
        assert_eq!(merged, before);
    }

    #[test]
    fn test_display_amount_rounds_half_away_from_zero() {
        assert_eq!(display_amount(dec!(2.345), 2), dec!(2.35));
        assert_eq!(display_amount(dec!(-2.345), 2), dec!(-2.35));
        assert_eq!(display_amount(dec!(2.5), 0), dec!(3));
    }
}
