//! WebAssembly module for the milk collection console
//!
//! Provides client-side computation for:
//! - Live unit conversion while an entry is typed
//! - Price resolution and daily shift totals
//! - The date × animal report pivot
//! - Pre-submit conflict checks
//!
//! Structured inputs and outputs cross the boundary as JSON strings.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use shared::{
    density_from_f64, quantity_from_f64, to_f64, AnimalRef, DateRange, LocalCalendar, MilkPrice,
    PriceContext, ProductionRecord, ProposedEntry, TenantBillingDefaults, VolumeUnit,
};
use uuid::Uuid;
use wasm_bindgen::prelude::*;

/// Error text handed back to JavaScript
type Outcome<T> = Result<T, String>;

fn parse_json<'a, T: Deserialize<'a>>(json: &'a str, what: &str) -> Outcome<T> {
    serde_json::from_str(json).map_err(|e| format!("Invalid {} JSON: {}", what, e))
}

fn to_json<T: Serialize>(value: &T) -> Outcome<String> {
    serde_json::to_string(value).map_err(|e| e.to_string())
}

fn calendar(utc_offset: &str) -> Outcome<LocalCalendar> {
    LocalCalendar::from_offset_str(utc_offset).map_err(|e| e.to_string())
}

#[cfg(target_arch = "wasm32")]
fn console_warn(message: &str) {
    web_sys::console::warn_1(&JsValue::from_str(message));
}

#[cfg(not(target_arch = "wasm32"))]
fn console_warn(_message: &str) {}

/// Convert an entered quantity to liters
#[wasm_bindgen]
pub fn to_liters(quantity: f64, unit: &str, density: f64) -> Result<f64, JsValue> {
    convert(quantity, unit, density).map_err(JsValue::from)
}

fn convert(quantity: f64, unit: &str, density: f64) -> Outcome<f64> {
    let unit: VolumeUnit = unit.parse().map_err(|e: shared::MilkError| e.to_string())?;
    let quantity = quantity_from_f64(quantity).map_err(|e| e.to_string())?;
    let density = density_from_f64(density).map_err(|e| e.to_string())?;
    let liters = shared::to_liters(quantity, unit, density).map_err(|e| e.to_string())?;
    Ok(to_f64(liters))
}

/// Whether a density falls in the usual range for cow's milk
#[wasm_bindgen]
pub fn is_typical_density(density: f64) -> bool {
    density_from_f64(density)
        .map(shared::is_typical_density)
        .unwrap_or(false)
}

/// Display weight in pounds for a liter total
#[wasm_bindgen]
pub fn liters_to_pounds(liters: f64) -> Result<f64, JsValue> {
    pounds(liters).map_err(JsValue::from)
}

fn pounds(liters: f64) -> Outcome<f64> {
    let liters = quantity_from_f64(liters).map_err(|e| e.to_string())?;
    let pounds = shared::liters_to_pounds(liters).map_err(|e| e.to_string())?;
    Ok(to_f64(pounds))
}

/// UTC offset of the browser, formatted as `+HH:MM`
#[wasm_bindgen]
pub fn browser_utc_offset() -> String {
    // getTimezoneOffset is minutes behind UTC
    let minutes = -(js_sys::Date::new_0().get_timezone_offset() as i32);
    format_offset(minutes)
}

fn format_offset(minutes_east: i32) -> String {
    let sign = if minutes_east < 0 { '-' } else { '+' };
    let minutes = minutes_east.abs();
    format!("{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
}

#[derive(Deserialize)]
struct PriceQuery {
    date: NaiveDate,
    #[serde(default)]
    buyer_id: Option<Uuid>,
    #[serde(default)]
    prices: Vec<MilkPrice>,
    #[serde(default)]
    tenant: Option<TenantBillingDefaults>,
}

/// Resolve the price per liter; `undefined` when no price is known
#[wasm_bindgen]
pub fn resolve_effective_price(query_json: &str) -> Result<Option<f64>, JsValue> {
    price_for(query_json).map_err(JsValue::from)
}

fn price_for(query_json: &str) -> Outcome<Option<f64>> {
    let query: PriceQuery = parse_json(query_json, "price query")?;
    let price = shared::resolve_effective_price(
        query.date,
        query.buyer_id,
        &query.prices,
        query.tenant.as_ref(),
    );
    Ok(price.map(to_f64))
}

#[derive(Deserialize)]
struct DayInput {
    date: NaiveDate,
    utc_offset: String,
    #[serde(default)]
    records: Vec<ProductionRecord>,
    #[serde(default)]
    prices: Vec<MilkPrice>,
    #[serde(default)]
    tenant: Option<TenantBillingDefaults>,
    #[serde(default)]
    buyer_id: Option<Uuid>,
}

/// Shift totals for one local day, as JSON
#[wasm_bindgen]
pub fn aggregate_day(input_json: &str) -> Result<String, JsValue> {
    day_totals(input_json).map_err(JsValue::from)
}

fn day_totals(input_json: &str) -> Outcome<String> {
    let input: DayInput = parse_json(input_json, "daily input")?;
    let calendar = calendar(&input.utc_offset)?;
    let context = PriceContext::new(&input.prices, input.tenant.as_ref()).with_buyer(input.buyer_id);
    let aggregate = shared::aggregate_day(&input.records, input.date, &context, &calendar);
    to_json(&aggregate)
}

#[derive(Deserialize)]
struct PivotInput {
    start_date: NaiveDate,
    end_date: NaiveDate,
    utc_offset: String,
    #[serde(default)]
    records: Vec<ProductionRecord>,
    #[serde(default)]
    animals: Vec<AnimalRef>,
}

/// Date × animal liters matrix for a period, as JSON
#[wasm_bindgen]
pub fn build_pivot(input_json: &str) -> Result<String, JsValue> {
    pivot(input_json).map_err(JsValue::from)
}

fn pivot(input_json: &str) -> Outcome<String> {
    let input: PivotInput = parse_json(input_json, "pivot input")?;
    let calendar = calendar(&input.utc_offset)?;
    let period = DateRange::new(input.start_date, input.end_date).map_err(|e| e.to_string())?;
    let pivot = shared::build_pivot(&input.records, &input.animals, period, &calendar);
    to_json(&pivot)
}

#[derive(Deserialize)]
struct ConflictInput {
    utc_offset: String,
    proposed: Vec<ProposedEntry>,
    #[serde(default)]
    existing: Vec<ProductionRecord>,
}

/// Conflicts between a pending batch and stored records, as JSON
#[wasm_bindgen]
pub fn detect_conflicts(input_json: &str) -> Result<String, JsValue> {
    conflicts(input_json).map_err(JsValue::from)
}

fn conflicts(input_json: &str) -> Outcome<String> {
    let input: ConflictInput = parse_json(input_json, "conflict input")?;
    let calendar = calendar(&input.utc_offset)?;
    let conflicts = shared::detect_conflicts(&input.proposed, &input.existing, &calendar);
    if !conflicts.is_empty() {
        console_warn(&format!("{} entries already recorded for this shift", conflicts.len()));
    }
    to_json(&conflicts)
}
