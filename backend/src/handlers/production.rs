//! Milk production HTTP handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{
    BulkProductionItem, BulkProductionRequest, ProductionAmendment, ProductionEntry,
    ProductionRecord, Shift, VolumeUnit,
};
use uuid::Uuid;
use validator::Validate;

use super::validation::{positive, quantity_in_range};
use crate::error::{AppError, AppResult};
use crate::services::collection::{CollectionService, SubmittedBatch};
use crate::AppState;

/// Body for recording one animal's milking
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductionRequest {
    pub animal_id: Uuid,
    pub buyer_id: Option<Uuid>,
    pub date: NaiveDate,
    pub shift: Shift,
    #[serde(default)]
    pub input_unit: VolumeUnit,
    #[validate(custom = "quantity_in_range")]
    pub input_quantity: Decimal,
    #[validate(custom = "positive")]
    pub density: Option<Decimal>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

impl From<CreateProductionRequest> for ProductionEntry {
    fn from(input: CreateProductionRequest) -> Self {
        ProductionEntry {
            animal_id: input.animal_id,
            buyer_id: input.buyer_id,
            date: input.date,
            shift: input.shift,
            input_unit: input.input_unit,
            input_quantity: input.input_quantity,
            density: input.density,
            notes: input.notes,
        }
    }
}

/// Body for recording a whole shift at once
#[derive(Debug, Deserialize, Validate)]
pub struct BulkProductionBody {
    pub date: NaiveDate,
    pub shift: Shift,
    pub buyer_id: Option<Uuid>,
    #[serde(default)]
    pub input_unit: VolumeUnit,
    #[validate(custom = "positive")]
    pub density: Option<Decimal>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub items: Vec<BulkProductionItem>,
}

impl From<BulkProductionBody> for BulkProductionRequest {
    fn from(input: BulkProductionBody) -> Self {
        BulkProductionRequest {
            date: input.date,
            shift: input.shift,
            buyer_id: input.buyer_id,
            input_unit: input.input_unit,
            density: input.density,
            notes: input.notes,
            items: input.items,
        }
    }
}

/// Body for amending a production record
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateProductionRequest {
    pub expected_version: i64,
    #[validate(custom = "quantity_in_range")]
    pub input_quantity: Option<Decimal>,
    pub input_unit: Option<VolumeUnit>,
    #[validate(custom = "positive")]
    pub density: Option<Decimal>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
}

impl UpdateProductionRequest {
    fn changes_anything(&self) -> bool {
        self.input_quantity.is_some()
            || self.input_unit.is_some()
            || self.density.is_some()
            || self.notes.is_some()
    }
}

pub(super) fn nothing_to_amend() -> AppError {
    AppError::Validation {
        field: "expected_version".to_string(),
        message: "The amendment does not change anything".to_string(),
        message_es: "La corrección no cambia ningún dato".to_string(),
    }
}

/// Record a single production
pub async fn create_production(
    State(state): State<AppState>,
    Json(input): Json<CreateProductionRequest>,
) -> AppResult<(StatusCode, Json<SubmittedBatch>)> {
    input.validate()?;
    let service = CollectionService::from_state(&state);
    let batch = service.submit_single(&input.into()).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// Record a shift for many animals; rejected wholesale on any conflict
pub async fn create_productions_bulk(
    State(state): State<AppState>,
    Json(input): Json<BulkProductionBody>,
) -> AppResult<(StatusCode, Json<SubmittedBatch>)> {
    input.validate()?;
    let service = CollectionService::from_state(&state);
    let batch = service.submit_bulk(&input.into()).await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// Amend a production record
pub async fn update_production(
    State(state): State<AppState>,
    Path(record_id): Path<Uuid>,
    Json(input): Json<UpdateProductionRequest>,
) -> AppResult<Json<ProductionRecord>> {
    input.validate()?;
    if !input.changes_anything() {
        return Err(nothing_to_amend());
    }
    let amendment = ProductionAmendment {
        expected_version: input.expected_version,
        input_quantity: input.input_quantity,
        input_unit: input.input_unit,
        density: input.density,
        notes: input.notes,
    };
    let service = CollectionService::from_state(&state);
    let record = service.amend_production(record_id, &amendment).await?;
    Ok(Json(record))
}
