//! Errors raised by the milk-collection core
//!
//! Conversion, pricing and write-path preparation fail fast with these.
//! Aggregation never returns them for a single bad row.

use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MilkError {
    #[error("Quantity must be zero or positive, got {0}")]
    InvalidQuantity(Decimal),

    #[error("Quantity {0} exceeds the per-entry limit")]
    QuantityTooLarge(Decimal),

    #[error("Quantity is not a finite number")]
    NonFiniteQuantity,

    #[error("Density must be positive for weight units, got {0}")]
    InvalidDensity(Decimal),

    #[error("Unsupported unit: {0}")]
    UnsupportedUnit(String),

    #[error("Unsupported shift: {0}")]
    UnsupportedShift(String),

    #[error("Price per liter cannot be negative, got {0}")]
    InvalidPrice(Decimal),

    #[error("Invalid UTC offset: {0}")]
    InvalidUtcOffset(String),

    #[error("Invalid period: {from} is after {to}")]
    InvalidPeriod {
        from: chrono::NaiveDate,
        to: chrono::NaiveDate,
    },

    #[error("Batch contains no entries with a quantity")]
    EmptyBatch,

    #[error("Stale version: expected {expected}, record is at {actual}")]
    StaleVersion { expected: i64, actual: i64 },

    #[error("Arithmetic overflow while converting {0}")]
    ArithmeticOverflow(Decimal),
}

/// Result alias for core operations
pub type MilkResult<T> = Result<T, MilkError>;
