//! Error handling for the milk collection console
//!
//! Provides consistent error responses in English and Spanish

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{BatchDuplicate, Conflict, MilkError};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation error: {message}")]
    Validation {
        field: String,
        message: String,
        message_es: String,
    },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error(transparent)]
    Milk(#[from] MilkError),

    // Write conflicts
    #[error("Batch rejected: {} conflicts, {} duplicates", conflicts.len(), duplicates.len())]
    BatchConflict {
        conflicts: Vec<Conflict>,
        duplicates: Vec<BatchDuplicate>,
        lines: Vec<String>,
    },

    #[error("Resource not found: {0}")]
    NotFound(String),

    // External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // Internal errors
    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message_en: String,
    pub message_es: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorDetail {
    fn new(code: &str, message_en: String, message_es: String) -> Self {
        Self {
            code: code.to_string(),
            message_en,
            message_es,
            field: None,
            details: None,
        }
    }
}

fn milk_error_detail(error: &MilkError) -> (StatusCode, ErrorDetail) {
    match error {
        MilkError::StaleVersion { expected, actual } => (
            StatusCode::CONFLICT,
            ErrorDetail {
                details: Some(serde_json::json!({ "expected": expected, "actual": actual })),
                ..ErrorDetail::new(
                    "STALE_VERSION",
                    "The record was changed by someone else. Reload and try again".to_string(),
                    "Otra persona modificó el registro. Recargue e intente de nuevo".to_string(),
                )
            },
        ),
        MilkError::EmptyBatch => (
            StatusCode::BAD_REQUEST,
            ErrorDetail::new(
                "VALIDATION_ERROR",
                "Enter a quantity for at least one animal".to_string(),
                "Ingrese una cantidad para al menos un animal".to_string(),
            ),
        ),
        MilkError::InvalidDensity(_) => (
            StatusCode::BAD_REQUEST,
            ErrorDetail {
                field: Some("density".to_string()),
                ..ErrorDetail::new(
                    "VALIDATION_ERROR",
                    error.to_string(),
                    "La densidad debe ser mayor que cero".to_string(),
                )
            },
        ),
        MilkError::InvalidQuantity(_) | MilkError::NonFiniteQuantity => (
            StatusCode::BAD_REQUEST,
            ErrorDetail {
                field: Some("input_quantity".to_string()),
                ..ErrorDetail::new(
                    "VALIDATION_ERROR",
                    error.to_string(),
                    "La cantidad debe ser un número mayor o igual a cero".to_string(),
                )
            },
        ),
        MilkError::QuantityTooLarge(_) => (
            StatusCode::BAD_REQUEST,
            ErrorDetail {
                field: Some("input_quantity".to_string()),
                ..ErrorDetail::new(
                    "VALIDATION_ERROR",
                    error.to_string(),
                    "La cantidad supera el máximo permitido por registro".to_string(),
                )
            },
        ),
        other => (
            StatusCode::BAD_REQUEST,
            ErrorDetail::new(
                "VALIDATION_ERROR",
                other.to_string(),
                format!("Datos no válidos: {}", other),
            ),
        ),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = match &self {
            AppError::Validation { field, message, message_es } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new("VALIDATION_ERROR", message.clone(), message_es.clone())
                },
            ),
            AppError::ValidationError(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorDetail::new(
                    "VALIDATION_ERROR",
                    msg.clone(),
                    format!("Datos no válidos: {}", msg),
                ),
            ),
            AppError::Milk(error) => milk_error_detail(error),
            AppError::BatchConflict { conflicts, duplicates, lines } => (
                StatusCode::CONFLICT,
                ErrorDetail {
                    details: Some(serde_json::json!({
                        "conflicts": conflicts,
                        "duplicates": duplicates,
                        "lines": lines,
                    })),
                    ..ErrorDetail::new(
                        "BATCH_CONFLICT",
                        "Some animals already have a record for this shift. Nothing was saved"
                            .to_string(),
                        "Algunos animales ya tienen un registro para este turno. No se guardó nada"
                            .to_string(),
                    )
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new(
                    "NOT_FOUND",
                    format!("{} not found", resource),
                    format!("No se encontró {}", resource),
                ),
            ),
            AppError::ExternalService(msg) => (
                StatusCode::BAD_GATEWAY,
                ErrorDetail::new(
                    "EXTERNAL_SERVICE_ERROR",
                    format!("External service error: {}", msg),
                    format!("Error en el servicio externo: {}", msg),
                ),
            ),
            AppError::Configuration(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "CONFIGURATION_ERROR",
                    format!("Configuration error: {}", msg),
                    format!("Error de configuración: {}", msg),
                ),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new(
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                    "Error interno del servidor".to_string(),
                ),
            ),
        };

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::ValidationError(errors.to_string())
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        AppError::ExternalService(error.to_string())
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
