//! Production vs delivery summary over a reporting period

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::LocalCalendar;
use crate::models::{DeliveryRecord, ProductionRecord};
use crate::types::{DateRange, ReportGranularity};

/// Liters and record count for one series bucket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodBucket {
    /// First day of the bucket
    pub start: NaiveDate,
    pub liters: Decimal,
    pub records: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TopProducer {
    pub animal_id: Uuid,
    pub total_liters: Decimal,
    pub days_recorded: usize,
    pub avg_per_day: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodSummary {
    pub period: DateRange,
    pub granularity: ReportGranularity,
    pub total_liters_produced: Decimal,
    pub total_liters_delivered: Decimal,
    /// Produced minus delivered; negative when more left than was milked
    pub retention_difference: Decimal,
    pub retention_percentage: Decimal,
    pub total_records: usize,
    pub avg_per_record: Decimal,
    pub production_series: Vec<PeriodBucket>,
    pub delivery_series: Vec<PeriodBucket>,
    pub top_producers: Vec<TopProducer>,
    /// Productions without a volume plus rows of either kind that would
    /// overflow a total
    pub skipped_rows: usize,
}

#[derive(Default)]
struct ProducerTally {
    liters: Decimal,
    days: BTreeSet<NaiveDate>,
}

/// Bucket liters after adding `liters`, `None` on overflow
fn series_liters(series: &BTreeMap<NaiveDate, PeriodBucket>, start: NaiveDate, liters: Decimal) -> Option<Decimal> {
    series
        .get(&start)
        .map_or(Decimal::ZERO, |bucket| bucket.liters)
        .checked_add(liters)
}

/// Record one more row in the bucket at `start`, now holding `liters`
fn store_bucket(series: &mut BTreeMap<NaiveDate, PeriodBucket>, start: NaiveDate, liters: Decimal) {
    let bucket = series.entry(start).or_insert_with(|| PeriodBucket {
        start,
        liters: Decimal::ZERO,
        records: 0,
    });
    bucket.liters = liters;
    bucket.records += 1;
}

/// Summarize productions and deliveries falling inside `period`
pub fn summarize_period(
    productions: &[ProductionRecord],
    deliveries: &[DeliveryRecord],
    period: DateRange,
    granularity: ReportGranularity,
    calendar: &LocalCalendar,
    top_n: usize,
) -> PeriodSummary {
    let mut produced = Decimal::ZERO;
    let mut total_records = 0;
    let mut skipped_rows = 0;
    let mut production_series = BTreeMap::new();
    let mut producers: HashMap<Uuid, ProducerTally> = HashMap::new();

    for record in productions {
        let date = record.local_date(calendar);
        if !period.contains(date) {
            continue;
        }
        let Some(volume) = record.volume_l else {
            skipped_rows += 1;
            continue;
        };

        let bucket = granularity.bucket_start(date);
        let tally_liters = match record.animal_id {
            Some(animal_id) => producers
                .get(&animal_id)
                .map_or(Decimal::ZERO, |tally| tally.liters)
                .checked_add(volume),
            None => Some(Decimal::ZERO),
        };
        let (Some(new_produced), Some(bucket_liters), Some(tally_liters)) = (
            produced.checked_add(volume),
            series_liters(&production_series, bucket, volume),
            tally_liters,
        ) else {
            tracing::debug!(record_id = %record.id, "skipping production row that overflows the period totals");
            skipped_rows += 1;
            continue;
        };

        produced = new_produced;
        total_records += 1;
        store_bucket(&mut production_series, bucket, bucket_liters);

        if let Some(animal_id) = record.animal_id {
            let tally = producers.entry(animal_id).or_default();
            tally.liters = tally_liters;
            tally.days.insert(date);
        }
    }

    let mut delivered = Decimal::ZERO;
    let mut delivery_series = BTreeMap::new();
    for delivery in deliveries {
        let date = calendar.local_date(&delivery.date_time);
        if !period.contains(date) {
            continue;
        }
        let bucket = granularity.bucket_start(date);
        let accepted = delivered.checked_add(delivery.volume_l).and_then(|total| {
            produced.checked_sub(total)?;
            Some((total, series_liters(&delivery_series, bucket, delivery.volume_l)?))
        });
        let Some((new_delivered, bucket_liters)) = accepted else {
            tracing::debug!(delivery_id = %delivery.id, "skipping delivery that overflows the period totals");
            skipped_rows += 1;
            continue;
        };

        delivered = new_delivered;
        store_bucket(&mut delivery_series, bucket, bucket_liters);
    }

    let retention_difference = produced - delivered;
    let retention_percentage = if produced.is_zero() {
        Decimal::ZERO
    } else {
        retention_difference
            .checked_div(produced)
            .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
            .map(|percentage| percentage.round_dp(2))
            .unwrap_or(if retention_difference.is_sign_negative() {
                Decimal::MIN
            } else {
                Decimal::MAX
            })
    };
    let avg_per_record = if total_records == 0 {
        Decimal::ZERO
    } else {
        produced / Decimal::from(total_records)
    };

    let mut top_producers: Vec<TopProducer> = producers
        .into_iter()
        .map(|(animal_id, tally)| {
            let days_recorded = tally.days.len();
            TopProducer {
                animal_id,
                total_liters: tally.liters,
                days_recorded,
                avg_per_day: tally.liters / Decimal::from(days_recorded.max(1)),
            }
        })
        .collect();
    top_producers.sort_by(|a, b| {
        b.total_liters
            .cmp(&a.total_liters)
            .then_with(|| a.animal_id.cmp(&b.animal_id))
    });
    top_producers.truncate(top_n);

    tracing::debug!(
        start = %period.start,
        end = %period.end,
        records = total_records,
        skipped = skipped_rows,
        "summarized production period"
    );

    PeriodSummary {
        period,
        granularity,
        total_liters_produced: produced,
        total_liters_delivered: delivered,
        retention_difference,
        retention_percentage,
        total_records,
        avg_per_record,
        production_series: production_series.into_values().collect(),
        delivery_series: delivery_series.into_values().collect(),
        top_producers,
        skipped_rows,
    }
}
