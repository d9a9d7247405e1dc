//! Milk production models

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::calendar::LocalCalendar;
use crate::error::{MilkError, MilkResult};
use crate::units::{to_liters, DEFAULT_DENSITY};

/// One of the two daily milking windows
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "UPPERCASE")]
pub enum Shift {
    Am,
    Pm,
}

impl Shift {
    pub fn as_str(&self) -> &'static str {
        match self {
            Shift::Am => "AM",
            Shift::Pm => "PM",
        }
    }
}

impl fmt::Display for Shift {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Shift {
    type Err = MilkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AM" => Ok(Shift::Am),
            "PM" => Ok(Shift::Pm),
            _ => Err(MilkError::UnsupportedShift(s.to_string())),
        }
    }
}

/// Unit a quantity was entered in
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub enum VolumeUnit {
    #[default]
    #[serde(rename = "l", alias = "L")]
    Liters,
    #[serde(rename = "kg", alias = "KG")]
    Kilograms,
    #[serde(rename = "lb", alias = "LB")]
    Pounds,
}

impl VolumeUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeUnit::Liters => "l",
            VolumeUnit::Kilograms => "kg",
            VolumeUnit::Pounds => "lb",
        }
    }

    /// Weight units need a density to reach liters
    pub fn is_weight(&self) -> bool {
        !matches!(self, VolumeUnit::Liters)
    }
}

impl fmt::Display for VolumeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VolumeUnit {
    type Err = MilkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "l" | "lt" | "liter" | "liters" | "litre" | "litres" => Ok(VolumeUnit::Liters),
            "kg" | "kilogram" | "kilograms" => Ok(VolumeUnit::Kilograms),
            "lb" | "lbs" | "pound" | "pounds" => Ok(VolumeUnit::Pounds),
            _ => Err(MilkError::UnsupportedUnit(s.to_string())),
        }
    }
}

/// A production row as fetched from the farm API
///
/// `shift`, `volume_l` and `animal_id` are optional so that one malformed
/// row never fails a whole fetch; aggregations skip such rows and count them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionRecord {
    pub id: Uuid,
    #[serde(default)]
    pub animal_id: Option<Uuid>,
    #[serde(default)]
    pub buyer_id: Option<Uuid>,
    pub date_time: DateTime<Utc>,
    #[serde(default, deserialize_with = "deserialize_lenient_shift")]
    pub shift: Option<Shift>,
    #[serde(default)]
    pub input_unit: VolumeUnit,
    #[serde(default)]
    pub input_quantity: Decimal,
    #[serde(default = "default_density")]
    pub density: Decimal,
    /// Canonical volume, fixed at creation
    #[serde(default)]
    pub volume_l: Option<Decimal>,
    /// Price per liter frozen at creation
    #[serde(default)]
    pub price_snapshot: Option<Decimal>,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub version: i64,
}

impl ProductionRecord {
    pub fn local_date(&self, calendar: &LocalCalendar) -> NaiveDate {
        calendar.local_date(&self.date_time)
    }

    /// Apply an amendment guarded by the record's version counter
    ///
    /// The canonical volume is recomputed only from inputs the amendment
    /// itself changes. A notes-only amendment leaves `volume_l` as stored.
    pub fn amend(&self, amendment: &ProductionAmendment) -> MilkResult<ProductionRecord> {
        if amendment.expected_version != self.version {
            return Err(MilkError::StaleVersion {
                expected: amendment.expected_version,
                actual: self.version,
            });
        }

        let mut amended = self.clone();

        if amendment.changes_measurement() {
            amended.input_quantity = amendment.input_quantity.unwrap_or(self.input_quantity);
            amended.input_unit = amendment.input_unit.unwrap_or(self.input_unit);
            amended.density = amendment.density.unwrap_or(self.density);
            amended.volume_l = Some(to_liters(
                amended.input_quantity,
                amended.input_unit,
                amended.density,
            )?);
        }

        if let Some(notes) = &amendment.notes {
            amended.notes = normalize_notes(notes);
        }

        amended.version = self.version + 1;
        Ok(amended)
    }
}

/// Conditional update of a production record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProductionAmendment {
    pub expected_version: i64,
    #[serde(default)]
    pub input_quantity: Option<Decimal>,
    #[serde(default)]
    pub input_unit: Option<VolumeUnit>,
    #[serde(default)]
    pub density: Option<Decimal>,
    /// `Some("")` clears the notes
    #[serde(default)]
    pub notes: Option<String>,
}

impl ProductionAmendment {
    pub fn changes_measurement(&self) -> bool {
        self.input_quantity.is_some() || self.input_unit.is_some() || self.density.is_some()
    }
}

/// A validated production ready to be persisted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewProduction {
    pub animal_id: Uuid,
    pub buyer_id: Option<Uuid>,
    pub date: NaiveDate,
    pub shift: Shift,
    pub date_time: DateTime<Utc>,
    pub input_unit: VolumeUnit,
    pub input_quantity: Decimal,
    pub density: Decimal,
    pub volume_l: Decimal,
    pub price_snapshot: Option<Decimal>,
    pub currency: String,
    pub notes: Option<String>,
}

pub(crate) fn default_density() -> Decimal {
    DEFAULT_DENSITY
}

pub(crate) fn default_currency() -> String {
    "USD".to_string()
}

pub(crate) fn normalize_notes(notes: &str) -> Option<String> {
    let trimmed = notes.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn deserialize_lenient_shift<'de, D>(deserializer: D) -> Result<Option<Shift>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(raw
        .as_ref()
        .and_then(|value| value.as_str())
        .and_then(|s| s.parse().ok()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn record() -> ProductionRecord {
        ProductionRecord {
            id: Uuid::new_v4(),
            animal_id: Some(Uuid::new_v4()),
            buyer_id: None,
            date_time: Utc.with_ymd_and_hms(2024, 3, 1, 11, 0, 0).unwrap(),
            shift: Some(Shift::Am),
            input_unit: VolumeUnit::Kilograms,
            input_quantity: dec("20.6"),
            density: dec("1.03"),
            volume_l: Some(dec("20")),
            price_snapshot: Some(dec("0.45")),
            currency: "USD".to_string(),
            notes: None,
            version: 3,
        }
    }

    #[test]
    fn test_shift_parsing() {
        assert_eq!("am".parse::<Shift>().unwrap(), Shift::Am);
        assert_eq!(" PM ".parse::<Shift>().unwrap(), Shift::Pm);
        assert!("noon".parse::<Shift>().is_err());
    }

    #[test]
    fn test_unit_parsing() {
        assert_eq!("L".parse::<VolumeUnit>().unwrap(), VolumeUnit::Liters);
        assert_eq!("KG".parse::<VolumeUnit>().unwrap(), VolumeUnit::Kilograms);
        assert_eq!("lb".parse::<VolumeUnit>().unwrap(), VolumeUnit::Pounds);
        assert!(matches!(
            "gal".parse::<VolumeUnit>(),
            Err(MilkError::UnsupportedUnit(_))
        ));
    }

    #[test]
    fn test_record_deserializes_api_shape() {
        let json = r#"{
            "id": "6f1c2d3e-0000-4000-8000-000000000001",
            "animal_id": "6f1c2d3e-0000-4000-8000-000000000002",
            "date_time": "2024-03-01T06:15:00-05:00",
            "shift": "AM",
            "input_unit": "lb",
            "input_quantity": "25",
            "density": "1.03",
            "volume_l": "11.0095",
            "price_snapshot": null,
            "currency": "USD"
        }"#;

        let record: ProductionRecord = serde_json::from_str(json).unwrap();

        assert_eq!(record.shift, Some(Shift::Am));
        assert_eq!(record.input_unit, VolumeUnit::Pounds);
        assert_eq!(record.volume_l, Some(dec("11.0095")));
        assert_eq!(record.version, 0);
        assert_eq!(
            record.date_time,
            Utc.with_ymd_and_hms(2024, 3, 1, 11, 15, 0).unwrap()
        );
    }

    #[test]
    fn test_unparsable_shift_becomes_none() {
        let json = r#"{
            "id": "6f1c2d3e-0000-4000-8000-000000000001",
            "date_time": "2024-03-01T06:15:00Z",
            "shift": "NIGHT",
            "volume_l": "4"
        }"#;

        let record: ProductionRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.shift, None);
        assert_eq!(record.animal_id, None);
    }

    #[test]
    fn test_amend_rejects_stale_version() {
        let amendment = ProductionAmendment {
            expected_version: 2,
            input_quantity: None,
            input_unit: None,
            density: None,
            notes: Some("late entry".to_string()),
        };

        assert_eq!(
            record().amend(&amendment),
            Err(MilkError::StaleVersion {
                expected: 2,
                actual: 3
            })
        );
    }

    #[test]
    fn test_notes_only_amendment_keeps_volume() {
        let original = record();
        let amendment = ProductionAmendment {
            expected_version: 3,
            input_quantity: None,
            input_unit: None,
            density: None,
            notes: Some("  checked  ".to_string()),
        };

        let amended = original.amend(&amendment).unwrap();

        assert_eq!(amended.volume_l, original.volume_l);
        assert_eq!(amended.notes.as_deref(), Some("checked"));
        assert_eq!(amended.version, 4);
        assert_eq!(amended.price_snapshot, original.price_snapshot);
    }

    #[test]
    fn test_quantity_amendment_recomputes_with_record_density() {
        let amendment = ProductionAmendment {
            expected_version: 3,
            input_quantity: Some(dec("10.3")),
            input_unit: None,
            density: None,
            notes: None,
        };

        let amended = record().amend(&amendment).unwrap();

        assert_eq!(amended.volume_l, Some(dec("10")));
        assert_eq!(amended.density, dec("1.03"));
    }

    #[test]
    fn test_amendment_with_invalid_density_fails() {
        let amendment = ProductionAmendment {
            expected_version: 3,
            input_quantity: None,
            input_unit: None,
            density: Some(Decimal::ZERO),
            notes: None,
        };

        assert!(matches!(
            record().amend(&amendment),
            Err(MilkError::InvalidDensity(_))
        ));
    }
}
