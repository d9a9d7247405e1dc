//! Duplicate detection for production batches
//!
//! A proposed entry collides with an existing record when animal, local
//! calendar day and shift all match, however the existing quantity was
//! measured. Detection is a read-only query; whether to reject or overwrite
//! is decided by the caller. Bulk submission rejects the whole batch on any
//! conflict.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::LocalCalendar;
use crate::models::{ProductionRecord, Shift};

/// One entry of a batch about to be submitted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProposedEntry {
    pub animal_id: Uuid,
    pub date: NaiveDate,
    pub shift: Shift,
    pub input_quantity: Decimal,
}

/// A proposed entry that collides with an existing record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Conflict {
    pub animal_id: Uuid,
    pub date: NaiveDate,
    pub shift: Shift,
    pub attempted_quantity: Decimal,
    pub existing_record_id: Uuid,
    pub existing_date_time: DateTime<Utc>,
    pub existing_volume_l: Option<Decimal>,
}

impl Conflict {
    /// Human-readable line for the conflict dialog
    pub fn describe(&self, animal_label: &str, calendar: &LocalCalendar) -> String {
        let existing = match self.existing_volume_l {
            Some(volume) => format!("{:.1}L", volume),
            None => "a record".to_string(),
        };
        format!(
            "{}: tried to register {} but {} already exists from {} ({} {})",
            animal_label,
            self.attempted_quantity,
            existing,
            calendar.local_time(&self.existing_date_time).format("%H:%M"),
            self.date,
            self.shift,
        )
    }
}

/// The same animal, day and shift appearing more than once in one batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchDuplicate {
    pub animal_id: Uuid,
    pub date: NaiveDate,
    pub shift: Shift,
    pub occurrences: usize,
}

type SlotKey = (Uuid, NaiveDate, Shift);

/// Find every existing record each proposed entry collides with
///
/// Output follows the order of `proposed`, then the order of `existing`,
/// so the same inputs always give the same list.
pub fn detect_conflicts(
    proposed: &[ProposedEntry],
    existing: &[ProductionRecord],
    calendar: &LocalCalendar,
) -> Vec<Conflict> {
    let mut index: HashMap<SlotKey, Vec<&ProductionRecord>> = HashMap::new();
    for record in existing {
        // rows without animal or shift cannot occupy a slot
        if let (Some(animal_id), Some(shift)) = (record.animal_id, record.shift) {
            index
                .entry((animal_id, record.local_date(calendar), shift))
                .or_default()
                .push(record);
        }
    }

    let conflicts: Vec<Conflict> = proposed
        .iter()
        .flat_map(|entry| {
            index
                .get(&(entry.animal_id, entry.date, entry.shift))
                .into_iter()
                .flatten()
                .map(move |record| Conflict {
                    animal_id: entry.animal_id,
                    date: entry.date,
                    shift: entry.shift,
                    attempted_quantity: entry.input_quantity,
                    existing_record_id: record.id,
                    existing_date_time: record.date_time,
                    existing_volume_l: record.volume_l,
                })
        })
        .collect();

    if !conflicts.is_empty() {
        tracing::warn!(
            proposed = proposed.len(),
            conflicts = conflicts.len(),
            "batch collides with existing production records"
        );
    }

    conflicts
}

/// Find slots proposed more than once within the same batch
pub fn find_batch_duplicates(proposed: &[ProposedEntry]) -> Vec<BatchDuplicate> {
    let mut order: Vec<SlotKey> = Vec::new();
    let mut counts: HashMap<SlotKey, usize> = HashMap::new();

    for entry in proposed {
        let key = (entry.animal_id, entry.date, entry.shift);
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            order.push(key);
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter_map(|key| {
            let occurrences = counts.get(&key).copied().unwrap_or(0);
            (occurrences > 1).then(|| BatchDuplicate {
                animal_id: key.0,
                date: key.1,
                shift: key.2,
                occurrences,
            })
        })
        .collect()
}
