//! Date × animal pivot for period reports
//!
//! Cells hold liters per (local day, animal). A missing cell means nothing
//! was recorded, which is not the same as a recorded zero.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::LocalCalendar;
use crate::models::{AnimalRef, ProductionRecord, TenantBillingDefaults};
use crate::types::DateRange;
use crate::units::liters_to_pounds;

/// Volume for one animal on one day
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PivotCell {
    pub total_liters: Decimal,
    pub weight_lb: Decimal,
}

impl PivotCell {
    /// Cell with `liters` added, `None` on overflow
    fn added(self, liters: Decimal) -> Option<Self> {
        let total_liters = self.total_liters.checked_add(liters)?;
        let weight_lb = liters_to_pounds(total_liters).ok()?;
        Some(Self {
            total_liters,
            weight_lb,
        })
    }
}

impl Default for PivotCell {
    fn default() -> Self {
        Self {
            total_liters: Decimal::ZERO,
            weight_lb: Decimal::ZERO,
        }
    }
}

/// One animal column with its period total
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PivotColumn {
    pub animal: AnimalRef,
    /// `false` for animals found in records but absent from the roster
    pub in_roster: bool,
    pub total: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PivotResult {
    pub period: DateRange,
    pub matrix: BTreeMap<NaiveDate, BTreeMap<Uuid, PivotCell>>,
    pub row_totals: BTreeMap<NaiveDate, Decimal>,
    pub columns: Vec<PivotColumn>,
    pub grand_total: Decimal,
    pub skipped_rows: usize,
}

impl PivotResult {
    /// Dates with data, oldest first (table view)
    pub fn dates_ascending(&self) -> Vec<NaiveDate> {
        self.matrix.keys().copied().collect()
    }

    /// Dates with data, newest first (card view)
    pub fn dates_descending(&self) -> Vec<NaiveDate> {
        self.matrix.keys().rev().copied().collect()
    }

    pub fn cell(&self, date: NaiveDate, animal_id: Uuid) -> Option<&PivotCell> {
        self.matrix.get(&date).and_then(|row| row.get(&animal_id))
    }

    /// Period total for an animal, `None` if it is not a column
    pub fn column_total(&self, animal_id: Uuid) -> Option<Decimal> {
        self.columns
            .iter()
            .find(|column| column.animal.id == animal_id)
            .map(|column| column.total)
    }

    /// A page of columns; totals stay computed over the whole period
    pub fn column_page(&self, page: usize, per_page: usize) -> &[PivotColumn] {
        if per_page == 0 {
            return &[];
        }
        let start = page.saturating_mul(per_page).min(self.columns.len());
        let end = start.saturating_add(per_page).min(self.columns.len());
        &self.columns[start..end]
    }

    /// Revenue at the tenant default price
    ///
    /// Reports never use per-record snapshots. `None` without a tenant default
    /// or when the product overflows.
    pub fn revenue(liters: Decimal, tenant: Option<&TenantBillingDefaults>) -> Option<Decimal> {
        tenant
            .and_then(TenantBillingDefaults::fallback_price)
            .and_then(|price| liters.checked_mul(price))
    }

    pub fn grand_revenue(&self, tenant: Option<&TenantBillingDefaults>) -> Option<Decimal> {
        Self::revenue(self.grand_total, tenant)
    }
}

/// Build the pivot for `period` from raw production rows
///
/// Every roster animal gets a column, zero-filled if it has no records.
/// Animals missing from the roster are appended so every liter lands in a
/// column and the totals agree. A row that would overflow any total is
/// skipped whole.
pub fn build_pivot(
    records: &[ProductionRecord],
    animals: &[AnimalRef],
    period: DateRange,
    calendar: &LocalCalendar,
) -> PivotResult {
    let mut matrix: BTreeMap<NaiveDate, BTreeMap<Uuid, PivotCell>> = BTreeMap::new();
    let mut row_totals: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    let mut column_totals: HashMap<Uuid, Decimal> = HashMap::new();
    let mut grand_total = Decimal::ZERO;
    let mut skipped_rows = 0;

    for record in records {
        let date = record.local_date(calendar);
        if !period.contains(date) {
            continue;
        }
        let (Some(animal_id), Some(volume)) = (record.animal_id, record.volume_l) else {
            tracing::debug!(record_id = %record.id, "skipping production row without animal or volume");
            skipped_rows += 1;
            continue;
        };

        let cell = matrix
            .get(&date)
            .and_then(|row| row.get(&animal_id))
            .copied()
            .unwrap_or_default()
            .added(volume);
        let row_total = row_totals.get(&date).copied().unwrap_or_default().checked_add(volume);
        let column_total = column_totals
            .get(&animal_id)
            .copied()
            .unwrap_or_default()
            .checked_add(volume);
        let (Some(cell), Some(row_total), Some(column_total), Some(new_grand_total)) =
            (cell, row_total, column_total, grand_total.checked_add(volume))
        else {
            tracing::debug!(record_id = %record.id, "skipping production row that overflows the pivot totals");
            skipped_rows += 1;
            continue;
        };

        matrix.entry(date).or_default().insert(animal_id, cell);
        row_totals.insert(date, row_total);
        column_totals.insert(animal_id, column_total);
        grand_total = new_grand_total;
    }

    let mut columns: Vec<PivotColumn> = animals
        .iter()
        .map(|animal| PivotColumn {
            animal: animal.clone(),
            in_roster: true,
            total: column_totals.remove(&animal.id).unwrap_or(Decimal::ZERO),
        })
        .collect();

    let mut strays: Vec<(Uuid, Decimal)> = column_totals.into_iter().collect();
    strays.sort_by_key(|(id, _)| *id);
    if !strays.is_empty() {
        tracing::debug!(count = strays.len(), "records reference animals outside the roster");
    }
    columns.extend(strays.into_iter().map(|(id, total)| PivotColumn {
        animal: AnimalRef {
            id,
            tag: id.to_string(),
            name: None,
        },
        in_roster: false,
        total,
    }));

    PivotResult {
        period,
        matrix,
        row_totals,
        columns,
        grand_total,
        skipped_rows,
    }
}
