use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// When set, 500 responses carry the underlying error text under `error.detail`.
/// Only meant for non-production deployments.
static EXPOSE_ERROR_DETAIL: AtomicBool = AtomicBool::new(false);

pub fn set_expose_error_detail(enabled: bool) {
    EXPOSE_ERROR_DETAIL.store(enabled, Ordering::Relaxed);
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Auth error: {0}")]
    AuthError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("External API error: {0}")]
    ExternalApiError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Internal server error: {0}")]
    InternalError(String),

    #[error("JWT error: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP request error: {0}")]
    ReqwestError(#[from] reqwest::Error),

    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    MultipartError(#[from] actix_multipart::MultipartError),
}

impl AppError {
    fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::MultipartError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) | AppError::JwtError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => "EXTERNAL_API_ERROR",
            AppError::DatabaseError(_) => "DATABASE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> actix_web::http::StatusCode {
        use actix_web::http::StatusCode;
        match self {
            AppError::ValidationError(_) | AppError::MultipartError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) | AppError::JwtError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::ExternalApiError(_) | AppError::ReqwestError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::ValidationError(msg) => {
                log::warn!("Validation error: {msg}");
                msg.clone()
            }
            AppError::MultipartError(err) => {
                log::warn!("Invalid multipart payload: {err}");
                format!("Invalid multipart payload: {err}")
            }
            AppError::AuthError(msg) => {
                log::warn!("Authentication error: {msg}");
                msg.clone()
            }
            AppError::JwtError(err) => {
                log::warn!("Token rejected: {err}");
                "Invalid access token".to_string()
            }
            AppError::NotFound(msg) => msg.clone(),
            AppError::Forbidden(msg) => {
                log::warn!("Forbidden access: {msg}");
                msg.clone()
            }
            AppError::ExternalApiError(msg) => {
                log::error!("External API error: {msg}");
                msg.clone()
            }
            AppError::DatabaseError(err) => {
                log::error!("Database error: {err}");
                "Database error".to_string()
            }
            _ => {
                log::error!("Internal error: {self}");
                "Internal server error".to_string()
            }
        };

        let mut error = json!({
            "code": self.code(),
            "message": message,
        });
        if self.status_code().is_server_error() && EXPOSE_ERROR_DETAIL.load(Ordering::Relaxed) {
            error["detail"] = json!(self.to_string());
        }

        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": error
        }))
    }
}
