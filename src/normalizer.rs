use crate::error::{LedgerError, Result};
use crate::model::{LedgerEntry, MarkerEntry};
use crate::schema::{AttachmentDescriptor, LedgerConfig, RawLedgerRow, RawMarkerRow};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use log::{debug, warn};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Maps raw store rows into ledger entries. Holds only the default rate and
/// the day-boundary offset, both passed in explicitly.
#[derive(Debug, Clone)]
pub struct Normalizer {
    default_rate: Decimal,
    offset: FixedOffset,
}

impl Normalizer {
    pub fn new(default_rate: Decimal, utc_offset_seconds: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_seconds).ok_or_else(|| {
            LedgerError::DateError(format!("Invalid UTC offset: {}s", utc_offset_seconds))
        })?;
        Ok(Self {
            default_rate,
            offset,
        })
    }

    pub fn from_config(config: &LedgerConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.default_rate, config.utc_offset_seconds)
    }

    pub fn default_rate(&self) -> Decimal {
        self.default_rate
    }

    pub fn normalize(&self, row: &RawLedgerRow) -> LedgerEntry {
        let timestamp = self.local_time(row.timestamp, row.id);
        let attachments = parse_attachments(row.images.as_deref(), row.id);

        LedgerEntry {
            id: row.id,
            timestamp,
            date: timestamp.date_naive(),
            order_number: text_or_empty(&row.order_number),
            kind: text_or_empty(&row.kind),
            cargo_id: text_or_empty(&row.cargo_id),
            location: text_or_empty(&row.location),
            note: text_or_empty(&row.note),
            native_amount: amount_or_zero(row.native_amount.as_deref(), "native_amount", row.id),
            secondary_amount: amount_or_zero(
                row.secondary_amount.as_deref(),
                "secondary_amount",
                row.id,
            ),
            surcharge_a: amount_or_zero(row.surcharge_a.as_deref(), "surcharge_a", row.id),
            surcharge_b: amount_or_zero(row.surcharge_b.as_deref(), "surcharge_b", row.id),
            conversion_rate: self.resolve_rate(row.rate.as_deref(), row.id),
            has_attachment: !attachments.is_empty(),
            attachments,
        }
    }

    pub fn normalize_all(&self, rows: &[RawLedgerRow]) -> Vec<LedgerEntry> {
        debug!("Normalizing {} ledger rows", rows.len());
        rows.iter().map(|row| self.normalize(row)).collect()
    }

    pub fn normalize_marker(&self, row: &RawMarkerRow) -> MarkerEntry {
        let timestamp = self.local_time(row.timestamp, row.id);
        MarkerEntry {
            id: row.id,
            title: text_or_empty(&row.title),
            color_tag: row.color_tag.clone().filter(|tag| !tag.trim().is_empty()),
            timestamp,
            date: timestamp.date_naive(),
        }
    }

    pub fn normalize_markers(&self, rows: &[RawMarkerRow]) -> Vec<MarkerEntry> {
        debug!("Normalizing {} marker rows", rows.len());
        rows.iter().map(|row| self.normalize_marker(row)).collect()
    }

    /// Row override wins whenever it is present and parseable; the rate is not
    /// checked for zero here.
    fn resolve_rate(&self, raw: Option<&str>, id: i64) -> Decimal {
        match raw.map(str::trim).filter(|s| !s.is_empty()) {
            None => self.default_rate,
            Some(text) => match parse_decimal(text) {
                Ok(rate) => rate,
                Err(_) => {
                    warn!(
                        "Row {}: unparseable rate '{}', using default {}",
                        id, text, self.default_rate
                    );
                    self.default_rate
                }
            },
        }
    }

    fn local_time(&self, millis: i64, id: i64) -> DateTime<FixedOffset> {
        match DateTime::from_timestamp_millis(millis) {
            Some(utc) => utc.with_timezone(&self.offset),
            None => {
                warn!("Row {}: timestamp {} out of range, using epoch", id, millis);
                DateTime::<Utc>::default().with_timezone(&self.offset)
            }
        }
    }
}

/// Convenience form of [`Normalizer::normalize`] with days cut at UTC midnight.
pub fn normalize(row: &RawLedgerRow, default_rate: Decimal) -> LedgerEntry {
    Normalizer {
        default_rate,
        offset: Utc.fix(),
    }
    .normalize(row)
}

pub fn parse_decimal(text: &str) -> Result<Decimal> {
    let trimmed = text.trim();
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .map_err(|_| LedgerError::InvalidNumber(trimmed.to_string()))
}

/// Malformed blobs yield an empty list; this never fails.
pub fn parse_attachments(blob: Option<&str>, id: i64) -> Vec<AttachmentDescriptor> {
    let Some(text) = blob.map(str::trim).filter(|s| !s.is_empty()) else {
        return Vec::new();
    };

    match serde_json::from_str::<Vec<AttachmentDescriptor>>(text) {
        Ok(list) => list,
        Err(e) => {
            warn!("Row {}: malformed attachment data ({}), ignoring", id, e);
            Vec::new()
        }
    }
}

fn amount_or_zero(raw: Option<&str>, field: &str, id: i64) -> Decimal {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Decimal::ZERO,
        Some(text) => parse_decimal(text).unwrap_or_else(|_| {
            warn!("Row {}: unparseable {} '{}', treating as zero", id, field, text);
            Decimal::ZERO
        }),
    }
}

fn text_or_empty(raw: &Option<String>) -> String {
    raw.clone().unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn row(id: i64) -> RawLedgerRow {
        RawLedgerRow {
            id,
            // 2024-03-01T20:00:00Z
            timestamp: 1_709_323_200_000,
            native_amount: Some("100".to_string()),
            secondary_amount: Some("20.5".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_rate_override_precedence() {
        let mut r = row(1);
        r.rate = Some("0.8".to_string());
        let entry = normalize(&r, dec!(0.9));
        assert_eq!(entry.conversion_rate, dec!(0.8));
        assert_eq!(entry.converted_total().unwrap(), dec!(145.5));

        r.rate = None;
        assert_eq!(normalize(&r, dec!(0.9)).conversion_rate, dec!(0.9));

        r.rate = Some("  ".to_string());
        assert_eq!(normalize(&r, dec!(0.9)).conversion_rate, dec!(0.9));
    }

    #[test]
    fn test_zero_rate_is_not_rejected_at_normalization() {
        let mut r = row(2);
        r.rate = Some("0".to_string());
        let entry = normalize(&r, dec!(0.9));
        assert_eq!(entry.conversion_rate, Decimal::ZERO);
        assert!(entry.converted_total().is_err());
    }

    #[test]
    fn test_malformed_attachment_blob() {
        let mut r = row(3);
        r.images = Some("[{not json".to_string());
        let entry = normalize(&r, dec!(1));
        assert!(entry.attachments.is_empty());
        assert!(!entry.has_attachment);
    }

    #[test]
    fn test_attachment_blob_parsed() {
        let mut r = row(4);
        r.images = Some(
            r#"[{"uri": "file:///a.jpg", "fileName": "a.jpg", "width": 640, "height": 480},
                {"uri": "file:///b.jpg"}]"#
                .to_string(),
        );
        let entry = normalize(&r, dec!(1));
        assert!(entry.has_attachment);
        assert_eq!(entry.attachments.len(), 2);
        assert_eq!(entry.attachments[0].file_name.as_deref(), Some("a.jpg"));
        assert_eq!(entry.attachments[1].width, None);
    }

    #[test]
    fn test_unparseable_amount_fails_closed() {
        let mut r = row(5);
        r.surcharge_a = Some("abc".to_string());
        r.surcharge_b = Some("1e2".to_string());
        let entry = normalize(&r, dec!(1));
        assert_eq!(entry.surcharge_a, Decimal::ZERO);
        assert_eq!(entry.surcharge_b, dec!(100));
        assert_eq!(entry.order_number, "");
    }

    #[test]
    fn test_day_truncation_uses_offset() {
        let utc = Normalizer::new(dec!(1), 0).unwrap();
        let hong_kong = Normalizer::new(dec!(1), 8 * 3600).unwrap();

        assert_eq!(
            utc.normalize(&row(6)).date,
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
        );
        assert_eq!(
            hong_kong.normalize(&row(6)).date,
            NaiveDate::from_ymd_opt(2024, 3, 2).unwrap()
        );
    }

    #[test]
    fn test_marker_normalization() {
        let n = Normalizer::new(dec!(1), 0).unwrap();
        let marker = n.normalize_marker(&RawMarkerRow {
            id: 9,
            title: Some("Customs hold".to_string()),
            color_tag: Some("".to_string()),
            timestamp: 1_709_323_200_000,
        });
        assert_eq!(marker.title, "Customs hold");
        assert_eq!(marker.color_tag, None);
        assert_eq!(marker.date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }
}
