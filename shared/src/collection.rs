//! Write path: turning console entries into persistable drafts
//!
//! Preparation validates every entry before converting anything, so a bad
//! entry fails the whole request with no partial result.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::LocalCalendar;
use crate::conflicts::ProposedEntry;
use crate::error::{MilkError, MilkResult};
use crate::models::{
    normalize_notes, MilkPrice, NewDelivery, NewProduction, Shift, TenantBillingDefaults,
    VolumeUnit,
};
use crate::pricing::resolve_effective_price;
use crate::units::{liters_to_pounds, to_liters, DEFAULT_DENSITY};
use crate::validation::{density_advisory, validate_entry, DensityAdvisory};

/// Everything preparation needs besides the entry itself
#[derive(Debug, Clone, Copy)]
pub struct CollectionContext<'a> {
    pub calendar: &'a LocalCalendar,
    pub prices: &'a [MilkPrice],
    pub tenant: Option<&'a TenantBillingDefaults>,
    /// Wall clock used to stamp the time of day on new records
    pub now: DateTime<Utc>,
}

impl CollectionContext<'_> {
    fn density_or_default(&self, density: Option<Decimal>) -> Decimal {
        density
            .or_else(|| self.tenant.map(|t| t.default_density))
            .unwrap_or(DEFAULT_DENSITY)
    }

    fn currency(&self) -> String {
        self.tenant
            .map(|t| t.default_currency.clone())
            .unwrap_or_else(|| "USD".to_string())
    }

    /// Selected day at the current local time of day
    fn stamp(&self, date: NaiveDate) -> DateTime<Utc> {
        self.calendar
            .at_local(date, self.calendar.local_time(&self.now))
    }

    /// Entered buyer, else the tenant's default buyer
    fn buyer(&self, buyer_id: Option<Uuid>) -> Option<Uuid> {
        buyer_id.or_else(|| self.tenant.and_then(|t| t.default_buyer_id))
    }

    fn snapshot(&self, date: NaiveDate, buyer_id: Option<Uuid>) -> Option<Decimal> {
        resolve_effective_price(date, buyer_id, self.prices, self.tenant)
    }
}

/// One animal's milking entered in the console
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionEntry {
    pub animal_id: Uuid,
    #[serde(default)]
    pub buyer_id: Option<Uuid>,
    pub date: NaiveDate,
    pub shift: Shift,
    #[serde(default)]
    pub input_unit: VolumeUnit,
    pub input_quantity: Decimal,
    #[serde(default)]
    pub density: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Per-animal quantity in a bulk sheet; blank means the animal was not milked
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BulkProductionItem {
    pub animal_id: Uuid,
    #[serde(default)]
    pub input_quantity: Option<Decimal>,
}

/// A whole shift entered at once for many animals
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BulkProductionRequest {
    pub date: NaiveDate,
    pub shift: Shift,
    #[serde(default)]
    pub buyer_id: Option<Uuid>,
    #[serde(default)]
    pub input_unit: VolumeUnit,
    #[serde(default)]
    pub density: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<BulkProductionItem>,
}

/// A shipment entered in the console
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DeliveryEntry {
    pub buyer_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub input_unit: VolumeUnit,
    pub input_quantity: Decimal,
    #[serde(default)]
    pub density: Option<Decimal>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Drafts ready for the conflict gate and persistence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreparedBatch {
    pub drafts: Vec<NewProduction>,
    pub total_liters: Decimal,
    pub advisories: Vec<DensityAdvisory>,
    /// Price frozen onto every draft, `None` when no price was known
    pub price_snapshot: Option<Decimal>,
}

impl PreparedBatch {
    /// Entries in the shape the conflict detector takes
    pub fn proposed_entries(&self) -> Vec<ProposedEntry> {
        self.drafts
            .iter()
            .map(|draft| ProposedEntry {
                animal_id: draft.animal_id,
                date: draft.date,
                shift: draft.shift,
                input_quantity: draft.input_quantity,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PreparedDelivery {
    pub draft: NewDelivery,
    pub advisory: Option<DensityAdvisory>,
}

/// Live conversion shown while the operator types
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversionPreview {
    pub liters: Decimal,
    pub weight_lb: Decimal,
    pub advisory: Option<DensityAdvisory>,
}

pub fn preview_conversion(
    quantity: Decimal,
    unit: VolumeUnit,
    density: Decimal,
) -> MilkResult<ConversionPreview> {
    let liters = to_liters(quantity, unit, density)?;
    Ok(ConversionPreview {
        liters,
        weight_lb: liters_to_pounds(liters)?,
        advisory: density_advisory(unit, density),
    })
}

/// Prepare a single production entry
pub fn prepare_single(entry: &ProductionEntry, ctx: &CollectionContext<'_>) -> MilkResult<PreparedBatch> {
    let density = ctx.density_or_default(entry.density);
    validate_entry(entry.input_quantity, entry.input_unit, density)?;

    let volume_l = to_liters(entry.input_quantity, entry.input_unit, density)?;
    let buyer_id = ctx.buyer(entry.buyer_id);
    let price_snapshot = ctx.snapshot(entry.date, buyer_id);

    let draft = NewProduction {
        animal_id: entry.animal_id,
        buyer_id,
        date: entry.date,
        shift: entry.shift,
        date_time: ctx.stamp(entry.date),
        input_unit: entry.input_unit,
        input_quantity: entry.input_quantity,
        density,
        volume_l,
        price_snapshot,
        currency: ctx.currency(),
        notes: entry.notes.as_deref().and_then(normalize_notes),
    };

    Ok(PreparedBatch {
        drafts: vec![draft],
        total_liters: volume_l,
        advisories: density_advisory(entry.input_unit, density).into_iter().collect(),
        price_snapshot,
    })
}

/// Prepare a bulk shift sheet
///
/// Items with a blank or zero quantity are dropped. Nothing left is
/// [`MilkError::EmptyBatch`].
pub fn prepare_bulk(
    request: &BulkProductionRequest,
    ctx: &CollectionContext<'_>,
) -> MilkResult<PreparedBatch> {
    let density = ctx.density_or_default(request.density);

    let quantities: Vec<(Uuid, Decimal)> = request
        .items
        .iter()
        .filter_map(|item| {
            item.input_quantity
                .filter(|quantity| !quantity.is_zero())
                .map(|quantity| (item.animal_id, quantity))
        })
        .collect();

    if quantities.is_empty() {
        return Err(MilkError::EmptyBatch);
    }

    for (_, quantity) in &quantities {
        validate_entry(*quantity, request.input_unit, density)?;
    }

    let buyer_id = ctx.buyer(request.buyer_id);
    let price_snapshot = ctx.snapshot(request.date, buyer_id);
    let date_time = ctx.stamp(request.date);
    let currency = ctx.currency();
    let notes = request.notes.as_deref().and_then(normalize_notes);

    let mut total_liters = Decimal::ZERO;
    let mut drafts = Vec::with_capacity(quantities.len());
    for (animal_id, quantity) in quantities {
        let volume_l = to_liters(quantity, request.input_unit, density)?;
        total_liters = total_liters
            .checked_add(volume_l)
            .ok_or(MilkError::ArithmeticOverflow(volume_l))?;
        drafts.push(NewProduction {
            animal_id,
            buyer_id,
            date: request.date,
            shift: request.shift,
            date_time,
            input_unit: request.input_unit,
            input_quantity: quantity,
            density,
            volume_l,
            price_snapshot,
            currency: currency.clone(),
            notes: notes.clone(),
        });
    }

    Ok(PreparedBatch {
        drafts,
        total_liters,
        advisories: density_advisory(request.input_unit, density)
            .into_iter()
            .collect(),
        price_snapshot,
    })
}

/// Prepare a delivery, converting weight entries to liters
pub fn prepare_delivery(entry: &DeliveryEntry, ctx: &CollectionContext<'_>) -> MilkResult<PreparedDelivery> {
    let density = ctx.density_or_default(entry.density);
    validate_entry(entry.input_quantity, entry.input_unit, density)?;
    let volume_l = to_liters(entry.input_quantity, entry.input_unit, density)?;

    Ok(PreparedDelivery {
        draft: NewDelivery {
            date_time: ctx.stamp(entry.date),
            volume_l,
            buyer_id: entry.buyer_id,
            price_snapshot: resolve_effective_price(
                entry.date,
                Some(entry.buyer_id),
                ctx.prices,
                ctx.tenant,
            ),
            currency: ctx.currency(),
            notes: entry.notes.as_deref().and_then(normalize_notes),
        },
        advisory: density_advisory(entry.input_unit, density),
    })
}
