//! Unit conversion to canonical liters
//!
//! Pure and deterministic: every preview, submission and report converts
//! through [`to_liters`] and gets the same answer for the same inputs.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::{MilkError, MilkResult};
use crate::models::VolumeUnit;
use crate::validation::{validate_density, validate_quantity, MAX_QUANTITY};

/// Kilograms in one avoirdupois pound (exact by definition)
pub const KG_PER_LB: Decimal = Decimal::from_parts(45_359_237, 0, 0, false, 8);

/// Display factor from liters to pounds of milk
pub const LB_PER_LITER: Decimal = Decimal::from_parts(220_462, 0, 0, false, 5);

/// Specific gravity assumed when none is supplied
pub const DEFAULT_DENSITY: Decimal = Decimal::from_parts(103, 0, 0, false, 2);

/// Convert an entered quantity to liters
///
/// Liters pass through unchanged and ignore `density`. Weight units divide
/// the mass in kilograms by `density`.
pub fn to_liters(quantity: Decimal, unit: VolumeUnit, density: Decimal) -> MilkResult<Decimal> {
    validate_quantity(quantity)?;

    match unit {
        VolumeUnit::Liters => Ok(quantity),
        VolumeUnit::Kilograms => {
            validate_density(density)?;
            quantity
                .checked_div(density)
                .ok_or(MilkError::ArithmeticOverflow(quantity))
        }
        VolumeUnit::Pounds => {
            validate_density(density)?;
            quantity
                .checked_mul(KG_PER_LB)
                .and_then(|kg| kg.checked_div(density))
                .ok_or(MilkError::ArithmeticOverflow(quantity))
        }
    }
}

/// Equivalent weight in pounds for display next to a liter total
pub fn liters_to_pounds(liters: Decimal) -> MilkResult<Decimal> {
    liters
        .checked_mul(LB_PER_LITER)
        .ok_or(MilkError::ArithmeticOverflow(liters))
}

/// Quantity coming from a float input (forms, wasm)
pub fn quantity_from_f64(value: f64) -> MilkResult<Decimal> {
    if !value.is_finite() {
        return Err(MilkError::NonFiniteQuantity);
    }
    Decimal::try_from(value).map_err(|_| MilkError::NonFiniteQuantity)
}

/// Density coming from a float input; non-finite values are rejected as densities
pub fn density_from_f64(value: f64) -> MilkResult<Decimal> {
    if !value.is_finite() {
        return Err(MilkError::InvalidDensity(Decimal::ZERO));
    }
    Decimal::try_from(value).map_err(|_| MilkError::InvalidDensity(Decimal::ZERO))
}

/// Lossy conversion back to a float for display layers
pub fn to_f64(value: Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}
