use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

const MAX_UTC_OFFSET_SECONDS: i32 = 18 * 3600;
const MAX_DISPLAY_SCALE: u32 = 10;

/// One shipment billing row as fetched from the store, before normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawLedgerRow {
    #[schemars(description = "Primary key of the billing record")]
    pub id: i64,

    #[schemars(
        description = "Creation time of the record in epoch milliseconds. Truncated to a local calendar day for grouping."
    )]
    pub timestamp: i64,

    #[serde(default)]
    pub order_number: Option<String>,

    #[serde(default)]
    #[schemars(description = "Business category of the shipment (e.g. 'sea', 'air', 'truck')")]
    pub kind: Option<String>,

    #[serde(default)]
    pub cargo_id: Option<String>,

    #[serde(default)]
    pub location: Option<String>,

    #[serde(default)]
    pub note: Option<String>,

    #[serde(default)]
    #[schemars(description = "Amount in the native currency (RMB), as decimal text")]
    pub native_amount: Option<String>,

    #[serde(default)]
    #[schemars(description = "Amount already in the display currency (HKD), as decimal text")]
    pub secondary_amount: Option<String>,

    #[serde(default)]
    #[schemars(description = "First surcharge component, as decimal text")]
    pub surcharge_a: Option<String>,

    #[serde(default)]
    #[schemars(description = "Second surcharge component (shipping fee), as decimal text")]
    pub surcharge_b: Option<String>,

    #[serde(default)]
    #[schemars(
        description = "Per-record exchange rate override (native units per display unit). Null means the default rate applies."
    )]
    pub rate: Option<String>,

    #[serde(default)]
    #[schemars(description = "JSON-serialized array of attachment descriptors")]
    pub images: Option<String>,
}

/// A note row attached to a calendar day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct RawMarkerRow {
    pub id: i64,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    #[schemars(description = "Optional color label used by the view layer")]
    pub color_tag: Option<String>,

    #[schemars(description = "Epoch milliseconds")]
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct AttachmentDescriptor {
    pub uri: String,

    #[serde(default, rename = "fileName")]
    pub file_name: Option<String>,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LedgerConfig {
    #[schemars(
        with = "String",
        description = "Conversion rate used when a row carries no rate of its own. Must be positive."
    )]
    pub default_rate: Decimal,

    #[serde(default)]
    #[schemars(
        description = "Fixed offset from UTC in seconds used to truncate timestamps to a calendar day (e.g. 28800 for UTC+8)."
    )]
    pub utc_offset_seconds: i32,

    #[serde(default = "default_display_scale")]
    #[schemars(description = "Decimal places shown for amounts. Internal arithmetic is never rounded.")]
    pub display_scale: u32,
}

fn default_display_scale() -> u32 {
    2
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            default_rate: Decimal::ONE,
            utc_offset_seconds: 0,
            display_scale: default_display_scale(),
        }
    }
}

impl LedgerConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LedgerConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_rate <= Decimal::ZERO {
            return Err(LedgerError::InvalidConfig(format!(
                "default_rate must be positive, got {}",
                self.default_rate
            )));
        }

        if self.utc_offset_seconds.abs() > MAX_UTC_OFFSET_SECONDS {
            return Err(LedgerError::InvalidConfig(format!(
                "utc_offset_seconds {} is outside +/-{}",
                self.utc_offset_seconds, MAX_UTC_OFFSET_SECONDS
            )));
        }

        if self.display_scale > MAX_DISPLAY_SCALE {
            return Err(LedgerError::InvalidConfig(format!(
                "display_scale {} exceeds {}",
                self.display_scale, MAX_DISPLAY_SCALE
            )));
        }

        Ok(())
    }

    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(LedgerConfig)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

/// Parses a JSON array of billing rows, as exported from a store cursor.
pub fn rows_from_json(json: &str) -> Result<Vec<RawLedgerRow>> {
    Ok(serde_json::from_str(json)?)
}

pub fn marker_rows_from_json(json: &str) -> Result<Vec<RawMarkerRow>> {
    Ok(serde_json::from_str(json)?)
}

pub fn row_schema_as_json() -> std::result::Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&schemars::schema_for!(RawLedgerRow))
}
