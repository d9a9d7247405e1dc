//! Milk delivery HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{DeliveryAmendment, DeliveryEntry, DeliveryRecord, VolumeUnit};
use uuid::Uuid;
use validator::Validate;

use super::production::nothing_to_amend;
use super::validation::{positive, quantity_in_range};
use crate::error::AppResult;
use crate::services::collection::{CollectionService, SubmittedDelivery};
use crate::AppState;

/// Body for recording a delivery
#[derive(Debug, Deserialize, Validate)]
pub struct CreateDeliveryRequest {
    pub buyer_id: Uuid,
    pub date: NaiveDate,
    #[serde(default)]
    pub input_unit: VolumeUnit,
    #[validate(custom = "quantity_in_range")]
    pub input_quantity: Decimal,
    #[validate(custom = "positive")]
    pub density: Option<Decimal>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Body for amending a delivery
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateDeliveryRequest {
    pub expected_version: i64,
    #[validate(custom = "quantity_in_range")]
    pub volume_l: Option<Decimal>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

/// Record a delivery
pub async fn create_delivery(
    State(state): State<AppState>,
    Json(input): Json<CreateDeliveryRequest>,
) -> AppResult<(StatusCode, Json<SubmittedDelivery>)> {
    input.validate()?;
    let entry = DeliveryEntry {
        buyer_id: input.buyer_id,
        date: input.date,
        input_unit: input.input_unit,
        input_quantity: input.input_quantity,
        density: input.density,
        notes: input.notes,
    };
    let service = CollectionService::from_state(&state);
    let delivery = service.submit_delivery(&entry).await?;
    Ok((StatusCode::CREATED, Json(delivery)))
}

/// Amend a delivery
pub async fn update_delivery(
    State(state): State<AppState>,
    Path(delivery_id): Path<Uuid>,
    Json(input): Json<UpdateDeliveryRequest>,
) -> AppResult<Json<DeliveryRecord>> {
    input.validate()?;
    if input.volume_l.is_none() && input.notes.is_none() {
        return Err(nothing_to_amend());
    }
    let amendment = DeliveryAmendment {
        expected_version: input.expected_version,
        volume_l: input.volume_l,
        notes: input.notes,
    };
    let service = CollectionService::from_state(&state);
    let record = service.amend_delivery(delivery_id, &amendment).await?;
    Ok(Json(record))
}
