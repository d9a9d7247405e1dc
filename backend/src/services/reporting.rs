//! Reporting service for period production reports
//! Provides the date × animal pivot, production vs delivery summary and revenue

use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    build_pivot, summarize_period, DateRange, LocalCalendar, PeriodSummary, PivotResult,
    ReportGranularity, TopProducer,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::external::{FarmDataSource, RecordFilter};
use crate::AppState;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    source: Arc<dyn FarmDataSource>,
    calendar: LocalCalendar,
    top_producers_limit: usize,
}

/// Report filter
#[derive(Debug, Clone)]
pub struct ReportFilter {
    pub period: DateRange,
    pub granularity: ReportGranularity,
    pub animal_id: Option<Uuid>,
    pub buyer_id: Option<Uuid>,
}

/// Top producer with its display label
#[derive(Debug, Serialize)]
pub struct RankedProducer {
    pub label: String,
    #[serde(flatten)]
    pub producer: TopProducer,
}

/// Revenue at the tenant default price
#[derive(Debug, Serialize)]
pub struct RevenueFigures {
    pub price_per_l: Decimal,
    pub produced: Decimal,
    pub delivered: Decimal,
    pub per_animal: HashMap<Uuid, Decimal>,
}

/// Production report
#[derive(Debug, Serialize)]
pub struct ProductionReport {
    pub pivot: PivotResult,
    pub summary: PeriodSummary,
    pub top_producers: Vec<RankedProducer>,
    /// `None` when the tenant has no default price
    pub revenue: Option<RevenueFigures>,
}

impl ReportingService {
    pub fn new(source: Arc<dyn FarmDataSource>, calendar: LocalCalendar, top_producers_limit: usize) -> Self {
        Self {
            source,
            calendar,
            top_producers_limit,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.source.clone(),
            state.calendar,
            state.config.collection.top_producers_limit,
        )
    }

    /// Build the production report for a period
    pub async fn production_report(&self, filter: &ReportFilter) -> AppResult<ProductionReport> {
        let records_filter = RecordFilter::around(filter.period)
            .with_animal(filter.animal_id)
            .with_buyer(filter.buyer_id);

        let productions = self.source.list_productions(&records_filter).await?;
        let deliveries = self
            .source
            .list_deliveries(&RecordFilter::around(filter.period).with_buyer(filter.buyer_id))
            .await?;
        let mut animals = self.source.list_animals().await?;
        if let Some(animal_id) = filter.animal_id {
            animals.retain(|a| a.id == animal_id);
        }
        let tenant = self.source.billing_defaults().await?;

        let pivot = build_pivot(&productions, &animals, filter.period, &self.calendar);
        let summary = summarize_period(
            &productions,
            &deliveries,
            filter.period,
            filter.granularity,
            &self.calendar,
            self.top_producers_limit,
        );

        let labels: HashMap<Uuid, String> = pivot
            .columns
            .iter()
            .map(|c| (c.animal.id, c.animal.label()))
            .collect();
        let top_producers = summary
            .top_producers
            .iter()
            .map(|producer| RankedProducer {
                label: labels
                    .get(&producer.animal_id)
                    .cloned()
                    .unwrap_or_else(|| producer.animal_id.to_string()),
                producer: producer.clone(),
            })
            .collect();

        let revenue = tenant
            .as_ref()
            .and_then(|t| t.fallback_price())
            .and_then(|price_per_l| {
                Some(RevenueFigures {
                    price_per_l,
                    produced: summary.total_liters_produced.checked_mul(price_per_l)?,
                    delivered: summary.total_liters_delivered.checked_mul(price_per_l)?,
                    per_animal: pivot
                        .columns
                        .iter()
                        .filter_map(|c| Some((c.animal.id, PivotResult::revenue(c.total, tenant.as_ref())?)))
                        .collect(),
                })
            });

        tracing::info!(
            start = %filter.period.start,
            end = %filter.period.end,
            animals = pivot.columns.len(),
            grand_total = %pivot.grand_total,
            "production report generated"
        );

        Ok(ProductionReport {
            pivot,
            summary,
            top_producers,
            revenue,
        })
    }
}
