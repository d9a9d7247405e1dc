//! Daily dashboard: shift totals, recent entries and recent deliveries

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use shared::{
    aggregate_day, delivered_total, recent_deliveries, recent_entries, Clock, DailyAggregate, DateRange,
    DeliveryRecord, LocalCalendar, PriceContext, ProductionRecord,
};
use uuid::Uuid;

use crate::config::CollectionConfig;
use crate::error::AppResult;
use crate::external::{FarmDataSource, RecordFilter};
use crate::AppState;

/// Dashboard service
#[derive(Clone)]
pub struct DashboardService {
    source: Arc<dyn FarmDataSource>,
    calendar: LocalCalendar,
    clock: Arc<dyn Clock>,
    settings: CollectionConfig,
}

/// Everything the collection sidebar shows for one day
#[derive(Debug, Serialize)]
pub struct DailySummary {
    pub aggregate: DailyAggregate,
    pub recent_entries: Vec<ProductionRecord>,
    pub recent_deliveries: Vec<DeliveryRecord>,
    pub delivery_window: DateRange,
    pub delivered_liters: Decimal,
}

impl DashboardService {
    pub fn new(
        source: Arc<dyn FarmDataSource>,
        calendar: LocalCalendar,
        clock: Arc<dyn Clock>,
        settings: CollectionConfig,
    ) -> Self {
        Self {
            source,
            calendar,
            clock,
            settings,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.source.clone(),
            state.calendar,
            state.clock.clone(),
            state.config.collection.clone(),
        )
    }

    /// Summary for `date`, today on the farm calendar when omitted
    pub async fn daily_summary(
        &self,
        date: Option<NaiveDate>,
        buyer_id: Option<Uuid>,
    ) -> AppResult<DailySummary> {
        let today = self.calendar.today(self.clock.as_ref());
        let date = date.unwrap_or(today);
        let day = DateRange::day(date);

        let productions = self
            .source
            .list_productions(&RecordFilter::around(day))
            .await?;
        let prices = self
            .source
            .list_prices(&RecordFilter {
                date_from: Some(date),
                date_to: Some(date),
                ..Default::default()
            })
            .await?;
        let tenant = self.source.billing_defaults().await?;

        let context = PriceContext::new(&prices, tenant.as_ref())
            .with_buyer(buyer_id.or_else(|| tenant.as_ref().and_then(|t| t.default_buyer_id)));
        let aggregate = aggregate_day(&productions, date, &context, &self.calendar);
        if aggregate.skipped_rows > 0 {
            tracing::debug!(%date, skipped = aggregate.skipped_rows, "malformed rows left out of daily totals");
        }

        let recent: Vec<ProductionRecord> = recent_entries(
            &productions,
            date,
            &self.calendar,
            self.settings.recent_entries_limit,
        )
        .into_iter()
        .cloned()
        .collect();

        let delivery_window = DateRange::trailing_days(today, self.settings.delivery_window_days);
        let deliveries: Vec<DeliveryRecord> = self
            .source
            .list_deliveries(&RecordFilter::around(delivery_window).with_buyer(buyer_id))
            .await?
            .into_iter()
            .filter(|d| delivery_window.contains(self.calendar.local_date(&d.date_time)))
            .collect();
        let delivered_liters = delivered_total(&deliveries);

        Ok(DailySummary {
            aggregate,
            recent_entries: recent,
            recent_deliveries: recent_deliveries(&deliveries, self.settings.recent_entries_limit)
                .into_iter()
                .cloned()
                .collect(),
            delivery_window,
            delivered_liters,
        })
    }
}
