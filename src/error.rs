use axum::{http::StatusCode, Json};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use crate::rotation::Category;

/// Failures surfaced by the engine, the services and the storage layer.
#[derive(Debug, Error)]
pub enum AppError {
    /// An original pool category has no dishes, nothing can ever be drawn.
    #[error("original pool for category {0} is empty")]
    EmptyOriginalPool(Category),
    #[error("{0}")]
    Conflict(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("the default scheme cannot be deleted")]
    DefaultSchemeProtected,
    #[error("no active scheme")]
    NoActiveScheme,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::EmptyOriginalPool(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DefaultSchemeProtected => StatusCode::CONFLICT,
            AppError::NoActiveScheme => StatusCode::CONFLICT,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }
}

fn unique_violation_message(constraint: Option<&str>) -> String {
    match constraint {
        Some("records_date_key") => "a record already exists for this date".into(),
        Some("schemes_single_default") => "another scheme is already the default".into(),
        Some(other) => format!("duplicate value violates {other}"),
        None => "duplicate value".into(),
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::Conflict(unique_violation_message(db.constraint()))
            }
            _ => AppError::Storage(anyhow::Error::new(e)),
        }
    }
}

/// Response envelope shared by every route: `{"success": true, "data": ...}`
/// or `{"success": false, "error": "..."}`.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type ApiError = (StatusCode, Json<Envelope<()>>);
pub type ApiResult<T> = Result<Json<Envelope<T>>, ApiError>;

pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(Envelope {
        success: true,
        data: Some(data),
        error: None,
    }))
}

pub fn created<T: Serialize>(data: T) -> Result<(StatusCode, Json<Envelope<T>>), ApiError> {
    Ok((
        StatusCode::CREATED,
        Json(Envelope {
            success: true,
            data: Some(data),
            error: None,
        }),
    ))
}

pub fn reject(e: AppError) -> ApiError {
    let status = e.status();
    if status.is_server_error() {
        error!(error = %e, "request failed");
    } else {
        warn!(error = %e, %status, "request rejected");
    }
    (
        status,
        Json(Envelope {
            success: false,
            data: None,
            error: Some(e.to_string()),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            AppError::EmptyOriginalPool(Category::B).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AppError::Conflict("x".into()).status(), StatusCode::CONFLICT);
        assert_eq!(AppError::NotFound("record".into()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::validation("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::Storage(anyhow::anyhow!("down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unique_violations_are_named_by_constraint() {
        assert_eq!(
            unique_violation_message(Some("records_date_key")),
            "a record already exists for this date"
        );
        assert_eq!(
            unique_violation_message(Some("schemes_single_default")),
            "another scheme is already the default"
        );
        assert_eq!(unique_violation_message(None), "duplicate value");
    }

    #[test]
    fn rejection_envelope_carries_message() {
        let (status, Json(body)) = reject(AppError::NotFound("scheme".into()));
        assert_eq!(status, StatusCode::NOT_FOUND);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "scheme not found");
        assert!(json.get("data").is_none());
    }
}
