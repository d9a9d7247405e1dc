//! Daily AM/PM totals for the collection dashboard

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::LocalCalendar;
use crate::models::{DeliveryRecord, ProductionRecord, Shift};
use crate::pricing::PriceContext;

/// Totals for one local calendar day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyAggregate {
    pub date: NaiveDate,
    pub am_count: usize,
    pub am_liters: Decimal,
    pub pm_count: usize,
    pub pm_liters: Decimal,
    pub total_animals: usize,
    pub total_liters: Decimal,
    pub total_amount: Decimal,
    pub average_per_animal: Decimal,
    /// Live price for the day, `None` when no price is known
    pub effective_price: Option<Decimal>,
    /// Records that contributed nothing to `total_amount` for lack of a price
    pub unpriced_records: usize,
    /// Rows of the day dropped for a missing volume or shift, or for
    /// overflowing the totals
    pub skipped_rows: usize,
}

impl DailyAggregate {
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            am_count: 0,
            am_liters: Decimal::ZERO,
            pm_count: 0,
            pm_liters: Decimal::ZERO,
            total_animals: 0,
            total_liters: Decimal::ZERO,
            total_amount: Decimal::ZERO,
            average_per_animal: Decimal::ZERO,
            effective_price: None,
            unpriced_records: 0,
            skipped_rows: 0,
        }
    }

    pub fn count(&self, shift: Shift) -> usize {
        match shift {
            Shift::Am => self.am_count,
            Shift::Pm => self.pm_count,
        }
    }

    pub fn liters(&self, shift: Shift) -> Decimal {
        match shift {
            Shift::Am => self.am_liters,
            Shift::Pm => self.pm_liters,
        }
    }
}

/// Aggregate the records falling on `date` in the local calendar
///
/// Malformed rows are counted in `skipped_rows` and never abort the run.
pub fn aggregate_day(
    records: &[ProductionRecord],
    date: NaiveDate,
    prices: &PriceContext<'_>,
    calendar: &LocalCalendar,
) -> DailyAggregate {
    let mut aggregate = DailyAggregate::empty(date);
    aggregate.effective_price = prices.live_price(date, None);

    for record in records.iter().filter(|r| r.local_date(calendar) == date) {
        let (Some(volume), Some(shift)) = (record.volume_l, record.shift) else {
            tracing::debug!(record_id = %record.id, "skipping malformed production row");
            aggregate.skipped_rows += 1;
            continue;
        };

        let price = prices.effective_price_for(record, date);
        let shift_liters = aggregate.liters(shift).checked_add(volume);
        let total_liters = aggregate.total_liters.checked_add(volume);
        let total_amount = match price {
            Some(price) => volume
                .checked_mul(price)
                .and_then(|amount| aggregate.total_amount.checked_add(amount)),
            None => Some(aggregate.total_amount),
        };
        let (Some(shift_liters), Some(total_liters), Some(total_amount)) =
            (shift_liters, total_liters, total_amount)
        else {
            tracing::debug!(record_id = %record.id, "skipping production row that overflows the day totals");
            aggregate.skipped_rows += 1;
            continue;
        };

        match shift {
            Shift::Am => {
                aggregate.am_count += 1;
                aggregate.am_liters = shift_liters;
            }
            Shift::Pm => {
                aggregate.pm_count += 1;
                aggregate.pm_liters = shift_liters;
            }
        }
        aggregate.total_liters = total_liters;
        aggregate.total_amount = total_amount;
        if price.is_none() {
            aggregate.unpriced_records += 1;
        }
    }

    aggregate.total_animals = aggregate.am_count + aggregate.pm_count;
    if aggregate.total_animals > 0 {
        aggregate.average_per_animal =
            aggregate.total_liters / Decimal::from(aggregate.total_animals);
    }

    aggregate
}

/// Most recent production rows of the day, newest first
pub fn recent_entries<'a>(
    records: &'a [ProductionRecord],
    date: NaiveDate,
    calendar: &LocalCalendar,
    limit: usize,
) -> Vec<&'a ProductionRecord> {
    let mut day: Vec<&ProductionRecord> = records
        .iter()
        .filter(|r| r.local_date(calendar) == date)
        .collect();
    day.sort_by(|a, b| b.date_time.cmp(&a.date_time));
    day.truncate(limit);
    day
}

/// Most recent deliveries, newest first
pub fn recent_deliveries(deliveries: &[DeliveryRecord], limit: usize) -> Vec<&DeliveryRecord> {
    let mut sorted: Vec<&DeliveryRecord> = deliveries.iter().collect();
    sorted.sort_by(|a, b| b.date_time.cmp(&a.date_time));
    sorted.truncate(limit);
    sorted
}

/// Liters across deliveries; a row that would overflow the total is left out
pub fn delivered_total(deliveries: &[DeliveryRecord]) -> Decimal {
    deliveries.iter().fold(Decimal::ZERO, |total, delivery| {
        total.checked_add(delivery.volume_l).unwrap_or_else(|| {
            tracing::debug!(delivery_id = %delivery.id, "skipping delivery that overflows the total");
            total
        })
    })
}
