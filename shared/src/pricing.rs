//! Effective price resolution
//!
//! Resolution order for a day, first match wins:
//! 1. the buyer's own price for that date
//! 2. the general (buyer-less) price for that date
//! 3. the tenant default price
//!
//! `None` means no price is known. Amount calculations treat it as a zero
//! contribution and count the record as unpriced instead of inventing a price.
//! Negative prices are skipped at every tier.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{MilkPrice, ProductionRecord, TenantBillingDefaults};
use crate::validation::validate_price;

/// Where a resolved price came from
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    Buyer,
    General,
    TenantDefault,
}

/// A resolved price and its origin
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResolvedPrice {
    pub price_per_l: Decimal,
    pub source: PriceSource,
}

/// Resolve the price per liter for `date`, optionally for one buyer
pub fn resolve_effective_price(
    date: NaiveDate,
    buyer_id: Option<Uuid>,
    prices: &[MilkPrice],
    tenant: Option<&TenantBillingDefaults>,
) -> Option<Decimal> {
    resolve_price(date, buyer_id, prices, tenant).map(|resolved| resolved.price_per_l)
}

/// Like [`resolve_effective_price`], also reporting which tier matched
pub fn resolve_price(
    date: NaiveDate,
    buyer_id: Option<Uuid>,
    prices: &[MilkPrice],
    tenant: Option<&TenantBillingDefaults>,
) -> Option<ResolvedPrice> {
    let same_day: Vec<&MilkPrice> = prices
        .iter()
        .filter(|price| price.date == date)
        .filter(|price| match validate_price(price.price_per_l) {
            Ok(()) => true,
            Err(error) => {
                tracing::debug!(price_id = %price.id, %error, "skipping invalid milk price");
                false
            }
        })
        .collect();

    if let Some(buyer) = buyer_id {
        if let Some(price) = same_day.iter().find(|price| price.buyer_id == Some(buyer)) {
            return Some(ResolvedPrice {
                price_per_l: price.price_per_l,
                source: PriceSource::Buyer,
            });
        }
    }

    if let Some(price) = same_day.iter().find(|price| price.is_general()) {
        return Some(ResolvedPrice {
            price_per_l: price.price_per_l,
            source: PriceSource::General,
        });
    }

    let fallback = tenant.and_then(TenantBillingDefaults::fallback_price);
    if fallback.is_none() {
        tracing::debug!(%date, ?buyer_id, "no milk price known");
    }
    fallback.map(|price_per_l| ResolvedPrice {
        price_per_l,
        source: PriceSource::TenantDefault,
    })
}

/// Price inputs shared by every record of an aggregation
#[derive(Debug, Clone, Copy)]
pub struct PriceContext<'a> {
    pub prices: &'a [MilkPrice],
    pub tenant: Option<&'a TenantBillingDefaults>,
    /// Buyer selected in the console, used for records that carry none
    pub buyer_id: Option<Uuid>,
}

impl<'a> PriceContext<'a> {
    pub fn new(prices: &'a [MilkPrice], tenant: Option<&'a TenantBillingDefaults>) -> Self {
        Self {
            prices,
            tenant,
            buyer_id: None,
        }
    }

    pub fn with_buyer(mut self, buyer_id: Option<Uuid>) -> Self {
        self.buyer_id = buyer_id;
        self
    }

    /// Live price for a day, ignoring any snapshot
    pub fn live_price(&self, date: NaiveDate, buyer_id: Option<Uuid>) -> Option<Decimal> {
        resolve_effective_price(date, buyer_id.or(self.buyer_id), self.prices, self.tenant)
    }

    /// Price for one record: the frozen snapshot, else the live price
    pub fn effective_price_for(&self, record: &ProductionRecord, date: NaiveDate) -> Option<Decimal> {
        record
            .price_snapshot
            .or_else(|| self.live_price(date, record.buyer_id))
    }
}
