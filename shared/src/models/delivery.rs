//! Milk delivery models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::production::{default_currency, normalize_notes};
use crate::error::{MilkError, MilkResult};
use crate::validation::validate_quantity;

/// A shipment of pooled milk to a buyer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryRecord {
    pub id: Uuid,
    pub date_time: DateTime<Utc>,
    pub volume_l: Decimal,
    pub buyer_id: Uuid,
    #[serde(default)]
    pub buyer_name: Option<String>,
    #[serde(default)]
    pub price_snapshot: Option<Decimal>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub version: i64,
}

impl DeliveryRecord {
    /// Apply an amendment guarded by the record's version counter
    pub fn amend(&self, amendment: &DeliveryAmendment) -> MilkResult<DeliveryRecord> {
        if amendment.expected_version != self.version {
            return Err(MilkError::StaleVersion {
                expected: amendment.expected_version,
                actual: self.version,
            });
        }

        let mut amended = self.clone();
        if let Some(volume) = amendment.volume_l {
            validate_quantity(volume)?;
            amended.volume_l = volume;
        }
        if let Some(notes) = &amendment.notes {
            amended.notes = normalize_notes(notes);
        }
        amended.version = self.version + 1;
        Ok(amended)
    }
}

/// Conditional update of a delivery
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryAmendment {
    pub expected_version: i64,
    #[serde(default)]
    pub volume_l: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A validated delivery ready to be persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewDelivery {
    pub date_time: DateTime<Utc>,
    pub volume_l: Decimal,
    pub buyer_id: Uuid,
    pub price_snapshot: Option<Decimal>,
    pub currency: String,
    pub notes: Option<String>,
}
