//! Conversion and pricing tests for the milk-collection core
//!
//! Property-based checks on unit conversion plus the price hierarchy
//! scenarios the console relies on.

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    density_advisory, resolve_effective_price, to_liters, MilkError, MilkPrice,
    TenantBillingDefaults, VolumeUnit, KG_PER_LB,
};
use std::str::FromStr;
use uuid::Uuid;

/// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

// ============================================================================
// Property Test Strategies
// ============================================================================

/// Quantities from 0 to 1000.00 with two decimals
fn quantity_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..100_000).prop_map(|cents| Decimal::new(cents, 2))
}

/// Positive densities between 0.50 and 1.50
fn density_strategy() -> impl Strategy<Value = Decimal> {
    (50i64..=150).prop_map(|hundredths| Decimal::new(hundredths, 2))
}

// ============================================================================
// Unit Conversion Properties
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Liters pass through whatever the density, even a nonsensical one
    #[test]
    fn liters_are_identity(
        quantity in quantity_strategy(),
        density in -200i64..200,
    ) {
        let liters = to_liters(quantity, VolumeUnit::Liters, Decimal::new(density, 2)).unwrap();
        prop_assert_eq!(liters, quantity);
    }

    /// The same mass entered in kg or in lb gives the same volume
    #[test]
    fn kilograms_and_pounds_agree(
        quantity in quantity_strategy(),
        density in density_strategy(),
    ) {
        let from_kg = to_liters(quantity, VolumeUnit::Kilograms, density).unwrap();
        let from_lb = to_liters(quantity / KG_PER_LB, VolumeUnit::Pounds, density).unwrap();

        let diff = (from_kg - from_lb).abs();
        prop_assert!(
            diff < dec("0.0001"),
            "kg gave {}, lb gave {}, diff {}",
            from_kg,
            from_lb,
            diff
        );
    }

    /// Conversion is deterministic
    #[test]
    fn conversion_is_repeatable(
        quantity in quantity_strategy(),
        density in density_strategy(),
    ) {
        let first = to_liters(quantity, VolumeUnit::Pounds, density).unwrap();
        let second = to_liters(quantity, VolumeUnit::Pounds, density).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Non-positive densities are rejected for weight units
    #[test]
    fn weight_units_reject_non_positive_density(
        quantity in quantity_strategy(),
        density in -150i64..=0,
    ) {
        let result = to_liters(quantity, VolumeUnit::Kilograms, Decimal::new(density, 2));
        prop_assert!(matches!(result, Err(MilkError::InvalidDensity(_))));
    }
}

// ============================================================================
// Unit Conversion Scenarios
// ============================================================================

#[test]
fn test_a002_morning_entry_in_pounds() {
    // 25 lb at 1.03 is about 11.0095 L
    let liters = to_liters(dec("25"), VolumeUnit::Pounds, dec("1.03")).unwrap();
    assert_eq!(liters.round_dp(4), dec("11.0095"));
}

#[test]
fn test_high_density_converts_with_advisory() {
    let liters = to_liters(dec("22"), VolumeUnit::Kilograms, dec("1.10")).unwrap();

    assert_eq!(liters, dec("20"));
    assert!(density_advisory(VolumeUnit::Kilograms, dec("1.10")).is_some());
}

#[test]
fn test_negative_quantity_is_rejected() {
    assert_eq!(
        to_liters(dec("-3"), VolumeUnit::Pounds, dec("1.03")),
        Err(MilkError::InvalidQuantity(dec("-3")))
    );
}

// ============================================================================
// Price Hierarchy
// ============================================================================

fn price(date: NaiveDate, buyer_id: Option<Uuid>, value: &str) -> MilkPrice {
    MilkPrice {
        id: Uuid::new_v4(),
        date,
        buyer_id,
        price_per_l: dec(value),
        currency: "USD".to_string(),
    }
}

#[test]
fn test_price_hierarchy() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let buyer = Uuid::new_v4();
    let prices = vec![price(date, Some(buyer), "0.50"), price(date, None, "0.45")];

    assert_eq!(
        resolve_effective_price(date, Some(buyer), &prices, None),
        Some(dec("0.50"))
    );
    assert_eq!(
        resolve_effective_price(date, None, &prices, None),
        Some(dec("0.45"))
    );
}

#[test]
fn test_tenant_default_when_no_price_for_date() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let tenant = TenantBillingDefaults {
        default_price_per_l: Some(dec("0.42")),
        ..Default::default()
    };

    assert_eq!(
        resolve_effective_price(date, Some(Uuid::new_v4()), &[], Some(&tenant)),
        Some(dec("0.42"))
    );
}

#[test]
fn test_zero_tenant_default_means_unknown() {
    let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
    let tenant = TenantBillingDefaults {
        default_price_per_l: Some(Decimal::ZERO),
        ..Default::default()
    };

    assert_eq!(resolve_effective_price(date, None, &[], Some(&tenant)), None);
}
