//! Collection service: production and delivery writes
//!
//! Batches pass through one gate before anything is persisted: duplicate
//! slots inside the batch and collisions with stored records both reject
//! the whole batch.

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    detect_conflicts, find_batch_duplicates, prepare_bulk, prepare_delivery, prepare_single,
    preview_conversion, AnimalRef, BulkProductionRequest, Clock, CollectionContext,
    ConversionPreview, DateRange, DeliveryAmendment, DeliveryEntry, DeliveryRecord,
    DensityAdvisory, LocalCalendar, MilkError, MilkPrice, PreparedBatch, ProductionAmendment,
    ProductionEntry, ProductionRecord, TenantBillingDefaults, VolumeUnit,
};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::external::{FarmDataSource, RecordFilter};
use crate::AppState;

/// Collection service for milk productions and deliveries
#[derive(Clone)]
pub struct CollectionService {
    source: Arc<dyn FarmDataSource>,
    calendar: LocalCalendar,
    clock: Arc<dyn Clock>,
}

/// Result of a committed production batch
#[derive(Debug, Serialize)]
pub struct SubmittedBatch {
    pub records: Vec<ProductionRecord>,
    pub total_liters: Decimal,
    pub price_snapshot: Option<Decimal>,
    pub advisories: Vec<DensityAdvisory>,
}

#[derive(Debug, Serialize)]
pub struct SubmittedDelivery {
    pub record: DeliveryRecord,
    pub advisory: Option<DensityAdvisory>,
}

/// Index of animal labels for human-readable messages
fn animal_labels(animals: &[AnimalRef]) -> HashMap<Uuid, String> {
    animals.iter().map(|a| (a.id, a.label())).collect()
}

impl CollectionService {
    pub fn new(source: Arc<dyn FarmDataSource>, calendar: LocalCalendar, clock: Arc<dyn Clock>) -> Self {
        Self {
            source,
            calendar,
            clock,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(state.source.clone(), state.calendar, state.clock.clone())
    }

    /// Conversion preview for the entry form
    pub fn preview(
        &self,
        quantity: Decimal,
        unit: VolumeUnit,
        density: Decimal,
    ) -> AppResult<ConversionPreview> {
        Ok(preview_conversion(quantity, unit, density)?)
    }

    /// Record one animal's milking
    pub async fn submit_single(&self, entry: &ProductionEntry) -> AppResult<SubmittedBatch> {
        let (prices, tenant) = self.pricing_inputs(DateRange::day(entry.date)).await?;
        let ctx = CollectionContext {
            calendar: &self.calendar,
            prices: &prices,
            tenant: tenant.as_ref(),
            now: self.clock.now(),
        };
        let batch = prepare_single(entry, &ctx)?;
        self.commit(batch).await
    }

    /// Record a whole shift; all or nothing
    pub async fn submit_bulk(&self, request: &BulkProductionRequest) -> AppResult<SubmittedBatch> {
        let (prices, tenant) = self.pricing_inputs(DateRange::day(request.date)).await?;
        let ctx = CollectionContext {
            calendar: &self.calendar,
            prices: &prices,
            tenant: tenant.as_ref(),
            now: self.clock.now(),
        };
        let batch = prepare_bulk(request, &ctx)?;
        self.commit(batch).await
    }

    /// Record a delivery to a buyer
    pub async fn submit_delivery(&self, entry: &DeliveryEntry) -> AppResult<SubmittedDelivery> {
        let (prices, tenant) = self.pricing_inputs(DateRange::day(entry.date)).await?;
        let ctx = CollectionContext {
            calendar: &self.calendar,
            prices: &prices,
            tenant: tenant.as_ref(),
            now: self.clock.now(),
        };
        let prepared = prepare_delivery(entry, &ctx)?;
        if let Some(advisory) = &prepared.advisory {
            tracing::warn!(%advisory, "delivery uses an unusual density");
        }

        let record = self.source.create_delivery(&prepared.draft).await?;
        tracing::info!(
            delivery_id = %record.id,
            buyer_id = %record.buyer_id,
            volume_l = %record.volume_l,
            "milk delivery recorded"
        );

        Ok(SubmittedDelivery {
            record,
            advisory: prepared.advisory,
        })
    }

    /// Amend a production record if nobody changed it in the meantime
    pub async fn amend_production(
        &self,
        id: Uuid,
        amendment: &ProductionAmendment,
    ) -> AppResult<ProductionRecord> {
        let current = self.source.get_production(id).await?;
        let amended = current.amend(amendment)?;
        let saved = self.source.update_production(&amended).await?;
        tracing::info!(record_id = %id, version = saved.version, "milk production amended");
        Ok(saved)
    }

    pub async fn amend_delivery(
        &self,
        id: Uuid,
        amendment: &DeliveryAmendment,
    ) -> AppResult<DeliveryRecord> {
        let current = self.source.get_delivery(id).await?;
        let amended = current.amend(amendment)?;
        let saved = self.source.update_delivery(&amended).await?;
        tracing::info!(delivery_id = %id, version = saved.version, "milk delivery amended");
        Ok(saved)
    }

    async fn pricing_inputs(
        &self,
        range: DateRange,
    ) -> AppResult<(Vec<MilkPrice>, Option<TenantBillingDefaults>)> {
        let filter = RecordFilter {
            date_from: Some(range.start),
            date_to: Some(range.end),
            ..Default::default()
        };
        let prices = self.source.list_prices(&filter).await?;
        let tenant = self.source.billing_defaults().await?;
        Ok((prices, tenant))
    }

    /// Conflict gate followed by a single persistence call
    async fn commit(&self, batch: PreparedBatch) -> AppResult<SubmittedBatch> {
        let proposed = batch.proposed_entries();
        let duplicates = find_batch_duplicates(&proposed);

        let mut dates: Vec<_> = proposed.iter().map(|p| p.date).collect();
        dates.sort();
        let range = match (dates.first(), dates.last()) {
            (Some(start), Some(end)) => DateRange::new(*start, *end)?,
            _ => return Err(AppError::Milk(MilkError::EmptyBatch)),
        };

        let existing = self
            .source
            .list_productions(&RecordFilter::around(range))
            .await?;
        let conflicts = detect_conflicts(&proposed, &existing, &self.calendar);

        if !conflicts.is_empty() || !duplicates.is_empty() {
            let labels = animal_labels(&self.source.list_animals().await?);
            let label = |id: &Uuid| labels.get(id).cloned().unwrap_or_else(|| id.to_string());

            let mut lines: Vec<String> = conflicts
                .iter()
                .map(|c| c.describe(&label(&c.animal_id), &self.calendar))
                .collect();
            lines.extend(duplicates.iter().map(|d| {
                format!(
                    "{}: entered {} times for {} {}",
                    label(&d.animal_id),
                    d.occurrences,
                    d.date,
                    d.shift
                )
            }));

            return Err(AppError::BatchConflict {
                conflicts,
                duplicates,
                lines,
            });
        }

        for advisory in &batch.advisories {
            tracing::warn!(%advisory, "production entry uses an unusual density");
        }

        let records = self.source.create_productions(&batch.drafts).await?;
        tracing::info!(
            records = records.len(),
            total_liters = %batch.total_liters,
            "milk production batch recorded"
        );

        Ok(SubmittedBatch {
            records,
            total_liters: batch.total_liters,
            price_snapshot: batch.price_snapshot,
            advisories: batch.advisories,
        })
    }
}
