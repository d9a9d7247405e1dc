//! Reporting handlers for period production reports

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use shared::{DateRange, ReportGranularity};
use uuid::Uuid;

use crate::error::AppResult;
use crate::services::reporting::{ProductionReport, ReportFilter, ReportingService};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ProductionReportQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub group_by: ReportGranularity,
    pub animal_id: Option<Uuid>,
    pub buyer_id: Option<Uuid>,
}

/// Get the production report for a period
pub async fn get_production_report(
    State(state): State<AppState>,
    Query(query): Query<ProductionReportQuery>,
) -> AppResult<Json<ProductionReport>> {
    let filter = ReportFilter {
        period: DateRange::new(query.start_date, query.end_date)?,
        granularity: query.group_by,
        animal_id: query.animal_id,
        buyer_id: query.buyer_id,
    };

    let service = ReportingService::from_state(&state);
    let report = service.production_report(&filter).await?;
    Ok(Json(report))
}
