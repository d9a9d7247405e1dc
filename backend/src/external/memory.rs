//! In-memory farm data source for local runs and tests

use async_trait::async_trait;
use shared::{
    AnimalRef, DeliveryRecord, LocalCalendar, MilkError, MilkPrice, NewDelivery, NewProduction,
    ProductionRecord, TenantBillingDefaults,
};
use tokio::sync::Mutex;
use uuid::Uuid;

use super::farm_api::{FarmDataSource, RecordFilter};
use crate::error::{AppError, AppResult};

/// Records kept in process memory
///
/// Date filters are applied on the UTC date, as the farm API does.
#[derive(Default)]
pub struct InMemoryFarmData {
    pub productions: Mutex<Vec<ProductionRecord>>,
    pub deliveries: Mutex<Vec<DeliveryRecord>>,
    pub prices: Mutex<Vec<MilkPrice>>,
    pub billing: Mutex<Option<TenantBillingDefaults>>,
    pub animals: Mutex<Vec<AnimalRef>>,
    pub create_calls: std::sync::atomic::AtomicU64,
}

impl InMemoryFarmData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_animals(self, animals: Vec<AnimalRef>) -> Self {
        Self {
            animals: Mutex::new(animals),
            ..self
        }
    }

    pub fn with_prices(self, prices: Vec<MilkPrice>) -> Self {
        Self {
            prices: Mutex::new(prices),
            ..self
        }
    }

    pub fn with_billing(self, billing: TenantBillingDefaults) -> Self {
        Self {
            billing: Mutex::new(Some(billing)),
            ..self
        }
    }

    pub fn with_productions(self, productions: Vec<ProductionRecord>) -> Self {
        Self {
            productions: Mutex::new(productions),
            ..self
        }
    }

    pub fn with_deliveries(self, deliveries: Vec<DeliveryRecord>) -> Self {
        Self {
            deliveries: Mutex::new(deliveries),
            ..self
        }
    }
}

fn in_dates(filter: &RecordFilter, date: chrono::NaiveDate) -> bool {
    filter.date_from.map_or(true, |from| date >= from) && filter.date_to.map_or(true, |to| date <= to)
}

#[async_trait]
impl FarmDataSource for InMemoryFarmData {
    async fn list_productions(&self, filter: &RecordFilter) -> AppResult<Vec<ProductionRecord>> {
        let utc = LocalCalendar::utc();
        let productions = self.productions.lock().await;
        Ok(productions
            .iter()
            .filter(|r| in_dates(filter, r.local_date(&utc)))
            .filter(|r| filter.animal_id.map_or(true, |id| r.animal_id == Some(id)))
            .filter(|r| filter.buyer_id.map_or(true, |id| r.buyer_id == Some(id)))
            .cloned()
            .collect())
    }

    async fn list_deliveries(&self, filter: &RecordFilter) -> AppResult<Vec<DeliveryRecord>> {
        let deliveries = self.deliveries.lock().await;
        Ok(deliveries
            .iter()
            .filter(|d| in_dates(filter, d.date_time.date_naive()))
            .filter(|d| filter.buyer_id.map_or(true, |id| d.buyer_id == id))
            .cloned()
            .collect())
    }

    async fn list_prices(&self, filter: &RecordFilter) -> AppResult<Vec<MilkPrice>> {
        let prices = self.prices.lock().await;
        Ok(prices
            .iter()
            .filter(|p| in_dates(filter, p.date))
            .cloned()
            .collect())
    }

    async fn billing_defaults(&self) -> AppResult<Option<TenantBillingDefaults>> {
        Ok(self.billing.lock().await.clone())
    }

    async fn list_animals(&self) -> AppResult<Vec<AnimalRef>> {
        Ok(self.animals.lock().await.clone())
    }

    async fn get_production(&self, id: Uuid) -> AppResult<ProductionRecord> {
        self.productions
            .lock()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Milk production".to_string()))
    }

    async fn get_delivery(&self, id: Uuid) -> AppResult<DeliveryRecord> {
        self.deliveries
            .lock()
            .await
            .iter()
            .find(|d| d.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Milk delivery".to_string()))
    }

    async fn create_productions(&self, drafts: &[NewProduction]) -> AppResult<Vec<ProductionRecord>> {
        self.create_calls
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);

        let created: Vec<ProductionRecord> = drafts
            .iter()
            .map(|draft| ProductionRecord {
                id: Uuid::new_v4(),
                animal_id: Some(draft.animal_id),
                buyer_id: draft.buyer_id,
                date_time: draft.date_time,
                shift: Some(draft.shift),
                input_unit: draft.input_unit,
                input_quantity: draft.input_quantity,
                density: draft.density,
                volume_l: Some(draft.volume_l),
                price_snapshot: draft.price_snapshot,
                currency: draft.currency.clone(),
                notes: draft.notes.clone(),
                version: 0,
            })
            .collect();

        self.productions.lock().await.extend(created.iter().cloned());
        Ok(created)
    }

    async fn create_delivery(&self, draft: &NewDelivery) -> AppResult<DeliveryRecord> {
        let created = DeliveryRecord {
            id: Uuid::new_v4(),
            date_time: draft.date_time,
            volume_l: draft.volume_l,
            buyer_id: draft.buyer_id,
            buyer_name: None,
            price_snapshot: draft.price_snapshot,
            currency: draft.currency.clone(),
            notes: draft.notes.clone(),
            version: 0,
        };
        self.deliveries.lock().await.push(created.clone());
        Ok(created)
    }

    async fn update_production(&self, record: &ProductionRecord) -> AppResult<ProductionRecord> {
        let mut productions = self.productions.lock().await;
        let stored = productions
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| AppError::NotFound("Milk production".to_string()))?;

        // conditional update: the incoming version must be exactly one ahead
        if stored.version + 1 != record.version {
            return Err(MilkError::StaleVersion {
                expected: record.version - 1,
                actual: stored.version,
            }
            .into());
        }
        *stored = record.clone();
        Ok(record.clone())
    }

    async fn update_delivery(&self, record: &DeliveryRecord) -> AppResult<DeliveryRecord> {
        let mut deliveries = self.deliveries.lock().await;
        let stored = deliveries
            .iter_mut()
            .find(|d| d.id == record.id)
            .ok_or_else(|| AppError::NotFound("Milk delivery".to_string()))?;

        if stored.version + 1 != record.version {
            return Err(MilkError::StaleVersion {
                expected: record.version - 1,
                actual: stored.version,
            }
            .into());
        }
        *stored = record.clone();
        Ok(record.clone())
    }
}
