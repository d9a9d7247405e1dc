//! Validation utilities for milk collection entries
//!
//! Hard errors reject an entry before conversion. Density outside the usual
//! band for cow's milk is only an advisory and never blocks a submission.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{MilkError, MilkResult};
use crate::models::VolumeUnit;

/// Lower bound of the typical density band
pub const TYPICAL_DENSITY_MIN: Decimal = Decimal::from_parts(102, 0, 0, false, 2);

/// Upper bound of the typical density band
pub const TYPICAL_DENSITY_MAX: Decimal = Decimal::from_parts(104, 0, 0, false, 2);

/// Largest quantity a single entry may carry, in any unit
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

// ============================================================================
// Hard validations
// ============================================================================

/// Validate that an entered quantity is not negative and within [`MAX_QUANTITY`]
pub fn validate_quantity(quantity: Decimal) -> MilkResult<()> {
    if quantity < Decimal::ZERO {
        return Err(MilkError::InvalidQuantity(quantity));
    }
    if quantity > MAX_QUANTITY {
        return Err(MilkError::QuantityTooLarge(quantity));
    }
    Ok(())
}

/// Validate that a density is usable as a divisor
pub fn validate_density(density: Decimal) -> MilkResult<()> {
    if density <= Decimal::ZERO {
        return Err(MilkError::InvalidDensity(density));
    }
    Ok(())
}

/// Validate a full entry the way [`crate::units::to_liters`] will use it
pub fn validate_entry(quantity: Decimal, unit: VolumeUnit, density: Decimal) -> MilkResult<()> {
    validate_quantity(quantity)?;
    if unit.is_weight() {
        validate_density(density)?;
    }
    Ok(())
}

/// Validate a price per liter
pub fn validate_price(price: Decimal) -> MilkResult<()> {
    if price < Decimal::ZERO {
        return Err(MilkError::InvalidPrice(price));
    }
    Ok(())
}

// ============================================================================
// Advisories
// ============================================================================

/// Check if a density is in the typical band for whole milk (1.02-1.04)
pub fn is_typical_density(density: Decimal) -> bool {
    density >= TYPICAL_DENSITY_MIN && density <= TYPICAL_DENSITY_MAX
}

/// Non-blocking notice about an unusual density
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DensityAdvisory {
    pub density: Decimal,
    pub unit: VolumeUnit,
    pub typical_min: Decimal,
    pub typical_max: Decimal,
}

impl fmt::Display for DensityAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "density {} is outside the typical range {}-{} for {} entries",
            self.density, self.typical_min, self.typical_max, self.unit
        )
    }
}

/// Advisory for weight entries whose density is outside the typical band
///
/// Liter entries never produce one since density plays no part in them.
pub fn density_advisory(unit: VolumeUnit, density: Decimal) -> Option<DensityAdvisory> {
    if !unit.is_weight() || is_typical_density(density) {
        return None;
    }
    Some(DensityAdvisory {
        density,
        unit,
        typical_min: TYPICAL_DENSITY_MIN,
        typical_max: TYPICAL_DENSITY_MAX,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(dec("0")).is_ok());
        assert!(validate_quantity(dec("12.5")).is_ok());
        assert!(validate_quantity(dec("-0.1")).is_err());
        assert!(validate_quantity(MAX_QUANTITY).is_ok());
        assert_eq!(
            validate_quantity(dec("1000000.01")),
            Err(MilkError::QuantityTooLarge(dec("1000000.01")))
        );
    }

    #[test]
    fn test_validate_density() {
        assert!(validate_density(dec("1.03")).is_ok());
        assert!(validate_density(dec("0")).is_err());
        assert!(validate_density(dec("-1")).is_err());
    }

    #[test]
    fn test_validate_entry_ignores_density_for_liters() {
        assert!(validate_entry(dec("5"), VolumeUnit::Liters, dec("0")).is_ok());
        assert!(validate_entry(dec("5"), VolumeUnit::Kilograms, dec("0")).is_err());
    }

    #[test]
    fn test_validate_price() {
        assert!(validate_price(dec("0.45")).is_ok());
        assert!(validate_price(dec("0")).is_ok());
        assert!(validate_price(dec("-0.01")).is_err());
    }

    #[test]
    fn test_typical_density() {
        assert!(is_typical_density(dec("1.02")));
        assert!(is_typical_density(dec("1.03")));
        assert!(is_typical_density(dec("1.04")));
        assert!(!is_typical_density(dec("1.01")));
        assert!(!is_typical_density(dec("1.10")));
    }

    #[test]
    fn test_density_advisory() {
        let advisory = density_advisory(VolumeUnit::Kilograms, dec("1.10")).unwrap();
        assert_eq!(advisory.density, dec("1.10"));
        assert!(advisory.to_string().contains("1.02-1.04"));

        assert!(density_advisory(VolumeUnit::Pounds, dec("1.03")).is_none());
        assert!(density_advisory(VolumeUnit::Liters, dec("1.10")).is_none());
    }
}
