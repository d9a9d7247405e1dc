//! Conversion preview and daily dashboard handlers

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::{ConversionPreview, VolumeUnit, DEFAULT_DENSITY};
use uuid::Uuid;
use validator::Validate;

use super::validation::{positive, quantity_in_range};
use crate::error::AppResult;
use crate::services::dashboard::{DailySummary, DashboardService};
use crate::services::CollectionService;
use crate::AppState;

/// Body of a conversion preview request
#[derive(Debug, Deserialize, Validate)]
pub struct ConvertRequest {
    #[validate(custom = "quantity_in_range")]
    pub quantity: Decimal,
    #[serde(default)]
    pub unit: VolumeUnit,
    #[validate(custom = "positive")]
    pub density: Option<Decimal>,
}

/// Preview an entry in liters and pounds
pub async fn convert_quantity(
    State(state): State<AppState>,
    Json(input): Json<ConvertRequest>,
) -> AppResult<Json<ConversionPreview>> {
    input.validate()?;
    let service = CollectionService::from_state(&state);
    let preview = service.preview(
        input.quantity,
        input.unit,
        input.density.unwrap_or(DEFAULT_DENSITY),
    )?;
    Ok(Json(preview))
}

/// Query parameters for the daily summary
#[derive(Debug, Deserialize)]
pub struct DailySummaryQuery {
    pub date: Option<NaiveDate>,
    pub buyer_id: Option<Uuid>,
}

/// Daily shift totals with recent entries and deliveries
pub async fn get_daily_summary(
    State(state): State<AppState>,
    Query(query): Query<DailySummaryQuery>,
) -> AppResult<Json<DailySummary>> {
    let service = DashboardService::from_state(&state);
    let summary = service.daily_summary(query.date, query.buyer_id).await?;
    Ok(Json(summary))
}
