//! Milk price and tenant billing models

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::production::{default_currency, default_density, VolumeUnit};
use crate::validation::validate_price;

/// A price per liter for one day, general or buyer-specific
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MilkPrice {
    pub id: Uuid,
    pub date: NaiveDate,
    /// `None` is the general price for the day
    #[serde(default)]
    pub buyer_id: Option<Uuid>,
    pub price_per_l: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl MilkPrice {
    pub fn is_general(&self) -> bool {
        self.buyer_id.is_none()
    }
}

/// Tenant-wide billing fallbacks
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TenantBillingDefaults {
    #[serde(default)]
    pub default_price_per_l: Option<Decimal>,
    #[serde(default = "default_density")]
    pub default_density: Decimal,
    #[serde(default = "default_currency")]
    pub default_currency: String,
    #[serde(default)]
    pub default_buyer_id: Option<Uuid>,
    #[serde(default)]
    pub default_production_input_unit: VolumeUnit,
    #[serde(default)]
    pub default_delivery_input_unit: VolumeUnit,
}

impl TenantBillingDefaults {
    /// The default price, if one is configured
    ///
    /// A zero or negative default counts as not configured.
    pub fn fallback_price(&self) -> Option<Decimal> {
        self.default_price_per_l
            .filter(|price| !price.is_zero() && validate_price(*price).is_ok())
    }
}

impl Default for TenantBillingDefaults {
    fn default() -> Self {
        Self {
            default_price_per_l: None,
            default_density: default_density(),
            default_currency: default_currency(),
            default_buyer_id: None,
            default_production_input_unit: VolumeUnit::Liters,
            default_delivery_input_unit: VolumeUnit::Liters,
        }
    }
}
