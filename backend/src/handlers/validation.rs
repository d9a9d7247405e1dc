//! Custom field validators for request bodies

use rust_decimal::Decimal;
use shared::MAX_QUANTITY;
use validator::ValidationError;

/// Quantities may be zero but never negative, and stay within [`MAX_QUANTITY`]
pub fn quantity_in_range(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(ValidationError::new("non_negative"));
    }
    if *value > MAX_QUANTITY {
        return Err(ValidationError::new("max_quantity"));
    }
    Ok(())
}

/// Densities and similar divisors must be strictly positive
pub fn positive(value: &Decimal) -> Result<(), ValidationError> {
    if *value <= Decimal::ZERO {
        return Err(ValidationError::new("positive"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_quantity_in_range() {
        assert!(quantity_in_range(&dec("0")).is_ok());
        assert!(quantity_in_range(&dec("-0.0")).is_ok());
        assert!(quantity_in_range(&dec("3.5")).is_ok());
        assert!(quantity_in_range(&MAX_QUANTITY).is_ok());
        assert!(quantity_in_range(&dec("-1")).is_err());
    }

    #[test]
    fn test_quantity_above_limit() {
        let error = quantity_in_range(&dec("40000000000000000000000000000")).unwrap_err();
        assert_eq!(error.code, "max_quantity");
        assert!(quantity_in_range(&dec("1000000.001")).is_err());
    }

    #[test]
    fn test_positive() {
        assert!(positive(&dec("1.03")).is_ok());
        assert!(positive(&dec("0")).is_err());
        assert!(positive(&dec("-1.03")).is_err());
    }
}
