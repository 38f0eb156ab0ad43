use crate::error::Result;
use crate::model::display_amount;
use crate::normalizer::normalize;
use crate::schema::RawLedgerRow;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Entry-form inputs that accept calculator results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum NumericField {
    NativeAmount,
    SecondaryAmount,
    SurchargeA,
    SurchargeB,
    Rate,
}

/// Explicit focus order of the numeric inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOrder {
    fields: Vec<NumericField>,
}

impl Default for FieldOrder {
    fn default() -> Self {
        Self {
            fields: vec![
                NumericField::NativeAmount,
                NumericField::SecondaryAmount,
                NumericField::SurchargeA,
                NumericField::SurchargeB,
                NumericField::Rate,
            ],
        }
    }
}

impl FieldOrder {
    /// Duplicates are dropped, keeping the first occurrence.
    pub fn new(fields: Vec<NumericField>) -> Self {
        let mut unique = Vec::with_capacity(fields.len());
        for field in fields {
            if !unique.contains(&field) {
                unique.push(field);
            }
        }
        Self { fields: unique }
    }

    pub fn fields(&self) -> &[NumericField] {
        &self.fields
    }

    pub fn first(&self) -> Option<NumericField> {
        self.fields.first().copied()
    }

    /// The field after `field`, or `None` at the end or for a field that is
    /// not part of this order.
    pub fn next(&self, field: NumericField) -> Option<NumericField> {
        let index = self.fields.iter().position(|f| *f == field)?;
        self.fields.get(index + 1).copied()
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntryForm {
    order: FieldOrder,
    values: BTreeMap<NumericField, String>,
}

impl EntryForm {
    pub fn new(order: FieldOrder) -> Self {
        Self {
            order,
            values: BTreeMap::new(),
        }
    }

    pub fn order(&self) -> &FieldOrder {
        &self.order
    }

    pub fn get(&self, field: NumericField) -> &str {
        self.values.get(&field).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, field: NumericField, text: impl Into<String>) {
        self.values.insert(field, text.into());
    }

    /// Writes a calculator result into `field` at display precision and
    /// returns the field that should take focus next.
    pub fn apply_result(
        &mut self,
        field: NumericField,
        value: Decimal,
        scale: u32,
    ) -> Option<NumericField> {
        let shown = display_amount(value, scale).normalize();
        self.set(field, shown.to_string());
        self.order.next(field)
    }

    pub fn to_row(&self, id: i64, timestamp: i64) -> RawLedgerRow {
        let text = |field: NumericField| {
            let value = self.get(field).trim();
            (!value.is_empty()).then(|| value.to_string())
        };

        RawLedgerRow {
            id,
            timestamp,
            native_amount: text(NumericField::NativeAmount),
            secondary_amount: text(NumericField::SecondaryAmount),
            surcharge_a: text(NumericField::SurchargeA),
            surcharge_b: text(NumericField::SurchargeB),
            rate: text(NumericField::Rate),
            ..Default::default()
        }
    }

    /// Converted total of the form as currently filled, using `default_rate`
    /// when the rate field is blank.
    pub fn preview_total(&self, default_rate: Decimal) -> Result<Decimal> {
        normalize(&self.to_row(0, 0), default_rate).converted_total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LedgerError;
    use rust_decimal_macros::dec;

    #[test]
    fn test_successor_follows_explicit_order() {
        let order = FieldOrder::default();
        assert_eq!(order.first(), Some(NumericField::NativeAmount));
        assert_eq!(
            order.next(NumericField::NativeAmount),
            Some(NumericField::SecondaryAmount)
        );
        assert_eq!(order.next(NumericField::Rate), None);

        let custom = FieldOrder::new(vec![
            NumericField::Rate,
            NumericField::NativeAmount,
            NumericField::Rate,
        ]);
        assert_eq!(custom.fields().len(), 2);
        assert_eq!(custom.next(NumericField::Rate), Some(NumericField::NativeAmount));
        assert_eq!(custom.next(NumericField::SurchargeA), None);
    }

    #[test]
    fn test_apply_result_and_preview() {
        let mut form = EntryForm::default();
        let next = form.apply_result(NumericField::NativeAmount, dec!(100) / dec!(3), 2);
        assert_eq!(form.get(NumericField::NativeAmount), "33.33");
        assert_eq!(next, Some(NumericField::SecondaryAmount));

        form.set(NumericField::SecondaryAmount, "10");
        assert_eq!(form.preview_total(dec!(0.5)).unwrap(), dec!(76.66));

        form.set(NumericField::Rate, "1");
        assert_eq!(form.preview_total(dec!(0.5)).unwrap(), dec!(43.33));
    }

    #[test]
    fn test_preview_with_zero_rate() {
        let mut form = EntryForm::default();
        form.set(NumericField::NativeAmount, "5");
        form.set(NumericField::Rate, "0");
        assert!(matches!(
            form.preview_total(dec!(1)),
            Err(LedgerError::ZeroRateDivision { .. })
        ));
    }
}
