//! HTTP API tests for the milk collection console
//!
//! Drive the full router against the in-memory farm data source with a
//! frozen clock at 2024-03-01 09:00 local time (UTC-5).

use std::str::FromStr;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, TimeZone, Utc};
use milk_collection_backend::{create_app, AppState, Config, InMemoryFarmData};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use shared::{
    AnimalRef, FixedClock, LocalCalendar, MilkPrice, ProductionRecord, Shift,
    TenantBillingDefaults, VolumeUnit,
};
use tower::ServiceExt;
use uuid::Uuid;

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn json_dec(value: &Value) -> Decimal {
    match value {
        Value::String(s) => dec(s),
        other => dec(&other.to_string()),
    }
}

fn march(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
}

fn animal(n: u128, tag: &str) -> AnimalRef {
    AnimalRef {
        id: Uuid::from_u128(n),
        tag: tag.to_string(),
        name: None,
    }
}

fn herd() -> Vec<AnimalRef> {
    vec![animal(1, "A001"), animal(2, "A002")]
}

fn general_price(date: NaiveDate, price: &str) -> MilkPrice {
    MilkPrice {
        id: Uuid::new_v4(),
        date,
        buyer_id: None,
        price_per_l: dec(price),
        currency: "USD".to_string(),
    }
}

/// A morning record for animal `n` at 07:00 local on 2024-03-01
fn morning_record(n: u128, liters: &str, version: i64) -> ProductionRecord {
    ProductionRecord {
        id: Uuid::new_v4(),
        animal_id: Some(Uuid::from_u128(n)),
        buyer_id: None,
        date_time: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        shift: Some(Shift::Am),
        input_unit: VolumeUnit::Liters,
        input_quantity: dec(liters),
        density: dec("1.03"),
        volume_l: Some(dec(liters)),
        price_snapshot: Some(dec("0.45")),
        currency: "USD".to_string(),
        notes: None,
        version,
    }
}

fn app(source: Arc<InMemoryFarmData>) -> Router {
    let state = AppState {
        source,
        config: Arc::new(Config::default()),
        calendar: LocalCalendar::from_offset_str("-05:00").unwrap(),
        clock: Arc::new(FixedClock(Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap())),
    };
    create_app(state)
}

fn seeded() -> InMemoryFarmData {
    InMemoryFarmData::new()
        .with_animals(herd())
        .with_prices(vec![general_price(march(1), "0.45")])
        .with_billing(TenantBillingDefaults {
            default_price_per_l: Some(dec("0.42")),
            ..Default::default()
        })
}

async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

// ============================================================================
// Conversion
// ============================================================================

#[tokio::test]
async fn test_convert_liters_is_identity() {
    let source = Arc::new(seeded());
    let (status, body) = send(
        app(source),
        "POST",
        "/api/v1/milk/convert",
        Some(json!({ "quantity": "12.5", "unit": "l" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_dec(&body["liters"]), dec("12.5"));
    assert!(body["advisory"].is_null());
}

#[tokio::test]
async fn test_convert_kilograms_uses_density() {
    let source = Arc::new(seeded());
    let (status, body) = send(
        app(source),
        "POST",
        "/api/v1/milk/convert",
        Some(json!({ "quantity": "10.3", "unit": "kg", "density": "1.03" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_dec(&body["liters"]), dec("10"));
}

#[tokio::test]
async fn test_convert_rejects_negative_quantity() {
    let source = Arc::new(seeded());
    let (status, body) = send(
        app(source),
        "POST",
        "/api/v1/milk/convert",
        Some(json!({ "quantity": "-1", "unit": "l" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_convert_rejects_oversized_quantity() {
    let source = Arc::new(seeded());
    let (status, body) = send(
        app(source),
        "POST",
        "/api/v1/milk/convert",
        Some(json!({ "quantity": "40000000000000000000000000000", "unit": "l", "density": "1.03" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

// ============================================================================
// Production entry
// ============================================================================

#[tokio::test]
async fn test_bulk_entry_then_daily_summary() {
    let source = Arc::new(seeded());

    let (status, body) = send(
        app(source.clone()),
        "POST",
        "/api/v1/milk-productions/bulk",
        Some(json!({
            "date": "2024-03-01",
            "shift": "AM",
            "input_unit": "l",
            "items": [
                { "animal_id": Uuid::from_u128(1), "input_quantity": "13.01" },
                { "animal_id": Uuid::from_u128(2), "input_quantity": "13.0" },
                { "animal_id": Uuid::from_u128(3), "input_quantity": null }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["records"].as_array().unwrap().len(), 2);
    assert_eq!(json_dec(&body["total_liters"]), dec("26.01"));
    assert_eq!(json_dec(&body["price_snapshot"]), dec("0.45"));
    assert_eq!(source.create_calls.load(Ordering::Relaxed), 1);

    let (status, body) = send(
        app(source.clone()),
        "GET",
        "/api/v1/milk/daily-summary?date=2024-03-01",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let aggregate = &body["aggregate"];
    assert_eq!(aggregate["am_count"], 2);
    assert_eq!(aggregate["pm_count"], 0);
    assert_eq!(json_dec(&aggregate["total_liters"]), dec("26.01"));
    assert_eq!(json_dec(&aggregate["average_per_animal"]), dec("13.005"));
    assert_eq!(body["recent_entries"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_bulk_conflict_writes_nothing() {
    let source = Arc::new(seeded().with_productions(vec![morning_record(1, "12.0", 0)]));

    let (status, body) = send(
        app(source.clone()),
        "POST",
        "/api/v1/milk-productions/bulk",
        Some(json!({
            "date": "2024-03-01",
            "shift": "AM",
            "items": [
                { "animal_id": Uuid::from_u128(1), "input_quantity": "13.01" },
                { "animal_id": Uuid::from_u128(2), "input_quantity": "13.0" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "BATCH_CONFLICT");
    let conflicts = body["error"]["details"]["conflicts"].as_array().unwrap();
    assert_eq!(conflicts.len(), 1);
    let line = body["error"]["details"]["lines"][0].as_str().unwrap();
    assert!(line.starts_with("A001"));
    assert!(line.contains("07:00"));

    assert_eq!(source.create_calls.load(Ordering::Relaxed), 0);
    assert_eq!(source.productions.lock().await.len(), 1);
}

#[tokio::test]
async fn test_evening_shift_does_not_conflict_with_morning() {
    let source = Arc::new(seeded().with_productions(vec![morning_record(1, "12.0", 0)]));

    let (status, _) = send(
        app(source.clone()),
        "POST",
        "/api/v1/milk-productions",
        Some(json!({
            "animal_id": Uuid::from_u128(1),
            "date": "2024-03-01",
            "shift": "PM",
            "input_quantity": "11.5"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(source.productions.lock().await.len(), 2);
}

#[tokio::test]
async fn test_duplicate_animal_in_batch_is_rejected() {
    let source = Arc::new(seeded());

    let (status, body) = send(
        app(source.clone()),
        "POST",
        "/api/v1/milk-productions/bulk",
        Some(json!({
            "date": "2024-03-01",
            "shift": "AM",
            "items": [
                { "animal_id": Uuid::from_u128(1), "input_quantity": "10" },
                { "animal_id": Uuid::from_u128(1), "input_quantity": "11" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["details"]["duplicates"][0]["occurrences"], 2);
    assert_eq!(source.create_calls.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_empty_batch_is_rejected() {
    let source = Arc::new(seeded());

    let (status, _) = send(
        app(source.clone()),
        "POST",
        "/api/v1/milk-productions/bulk",
        Some(json!({
            "date": "2024-03-01",
            "shift": "AM",
            "items": [
                { "animal_id": Uuid::from_u128(1), "input_quantity": "0" },
                { "animal_id": Uuid::from_u128(2), "input_quantity": null }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(source.create_calls.load(Ordering::Relaxed), 0);
}

#[tokio::test]
async fn test_bulk_with_oversized_items_is_rejected() {
    let source = Arc::new(seeded());

    let (status, body) = send(
        app(source.clone()),
        "POST",
        "/api/v1/milk-productions/bulk",
        Some(json!({
            "date": "2024-03-01",
            "shift": "AM",
            "items": [
                { "animal_id": Uuid::from_u128(1), "input_quantity": "50000000000000000000000000000" },
                { "animal_id": Uuid::from_u128(2), "input_quantity": "50000000000000000000000000000" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "input_quantity");
    assert_eq!(source.create_calls.load(Ordering::Relaxed), 0);
}

// ============================================================================
// Amendments
// ============================================================================

#[tokio::test]
async fn test_stale_amendment_is_rejected() {
    let record = morning_record(1, "12.0", 2);
    let id = record.id;
    let source = Arc::new(seeded().with_productions(vec![record]));

    let (status, body) = send(
        app(source.clone()),
        "PUT",
        &format!("/api/v1/milk-productions/{}", id),
        Some(json!({ "expected_version": 1, "input_quantity": "14.0" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "STALE_VERSION");
    let stored = source.productions.lock().await[0].clone();
    assert_eq!(stored.volume_l, Some(dec("12.0")));
    assert_eq!(stored.version, 2);
}

#[tokio::test]
async fn test_amendment_recomputes_volume() {
    let record = morning_record(1, "12.0", 2);
    let id = record.id;
    let source = Arc::new(seeded().with_productions(vec![record]));

    let (status, body) = send(
        app(source.clone()),
        "PUT",
        &format!("/api/v1/milk-productions/{}", id),
        Some(json!({ "expected_version": 2, "input_quantity": "14.0" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["version"], 3);
    assert_eq!(json_dec(&body["volume_l"]), dec("14.0"));
}

#[tokio::test]
async fn test_empty_amendment_is_rejected() {
    let record = morning_record(1, "12.0", 0);
    let id = record.id;
    let source = Arc::new(seeded().with_productions(vec![record]));

    let (status, body) = send(
        app(source),
        "PUT",
        &format!("/api/v1/milk-productions/{}", id),
        Some(json!({ "expected_version": 0 })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["field"], "expected_version");
}

#[tokio::test]
async fn test_amending_unknown_record_is_not_found() {
    let source = Arc::new(seeded());

    let (status, _) = send(
        app(source),
        "PUT",
        &format!("/api/v1/milk-productions/{}", Uuid::new_v4()),
        Some(json!({ "expected_version": 0, "notes": "fixed" })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

// ============================================================================
// Deliveries
// ============================================================================

#[tokio::test]
async fn test_delivery_appears_in_daily_summary() {
    let source = Arc::new(seeded());
    let buyer = Uuid::from_u128(99);

    let (status, body) = send(
        app(source.clone()),
        "POST",
        "/api/v1/milk-deliveries",
        Some(json!({
            "buyer_id": buyer,
            "date": "2024-03-01",
            "input_quantity": "120.5"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json_dec(&body["record"]["volume_l"]), dec("120.5"));

    let (status, body) = send(app(source), "GET", "/api/v1/milk/daily-summary", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["recent_deliveries"].as_array().unwrap().len(), 1);
    assert_eq!(json_dec(&body["delivered_liters"]), dec("120.5"));
}

// ============================================================================
// Reports
// ============================================================================

#[tokio::test]
async fn test_production_report_pivot_and_revenue() {
    let source = Arc::new(seeded().with_productions(vec![
        morning_record(1, "13.01", 0),
        morning_record(2, "13.0", 0),
    ]));

    let (status, body) = send(
        app(source),
        "GET",
        "/api/v1/reports/production?start_date=2024-03-01&end_date=2024-03-07",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json_dec(&body["pivot"]["grand_total"]), dec("26.01"));
    assert_eq!(body["pivot"]["columns"].as_array().unwrap().len(), 2);
    assert_eq!(body["top_producers"][0]["label"], "A001");
    assert_eq!(json_dec(&body["revenue"]["price_per_l"]), dec("0.42"));
}

#[tokio::test]
async fn test_production_report_rejects_inverted_period() {
    let source = Arc::new(seeded());

    let (status, _) = send(
        app(source),
        "GET",
        "/api/v1/reports/production?start_date=2024-03-07&end_date=2024-03-01",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_health_reports_offset() {
    let source = Arc::new(seeded());
    let (status, body) = send(app(source), "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["utc_offset"], "-05:00");
}
