//! Typed errors and HTTP mapping.

use crate::binding::Binding;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Startup and wiring errors. Never retried.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing connection uri: config key '{key}' is not set")]
    MissingUri { key: String },
    #[error("invalid value for config key '{key}': {value}")]
    InvalidValue { key: String, value: String },
    #[error("no engine registered for app '{app}' binding '{binding}'")]
    UnregisteredEngine { app: String, binding: Binding },
    #[error("engine already registered for app '{app}' binding '{binding}'")]
    DuplicateEngine { app: String, binding: Binding },
    #[error("connect {binding} engine: {source}")]
    Connect {
        binding: Binding,
        #[source]
        source: sqlx::Error,
    },
    #[error("request context missing: request_context middleware is not installed")]
    MissingRequestContext,
}

/// Errors raised by the binding scope manager.
#[derive(Error, Debug)]
pub enum WaypointError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("unknown database binding: '{0}'")]
    InvalidBindingName(String),
    #[error("trying to create a second binding on the same request (active: {active}, requested: {requested})")]
    DuplicateBinding { active: Binding, requested: Binding },
    #[error("trying to access database without binding to master or slave before")]
    NoBindingActive,
}

impl WaypointError {
    pub fn code(&self) -> &'static str {
        match self {
            WaypointError::Config(_) => "config_error",
            WaypointError::InvalidBindingName(_) => "invalid_binding_name",
            WaypointError::DuplicateBinding { .. } => "duplicate_binding",
            WaypointError::NoBindingActive => "no_binding_active",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Waypoint(#[from] WaypointError),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("bad request: {0}")]
    BadRequest(String),
}

impl From<ConfigError> for AppError {
    fn from(e: ConfigError) -> Self {
        AppError::Waypoint(WaypointError::Config(e))
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Waypoint(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.code()),
            AppError::Db(e) => {
                if let sqlx::Error::RowNotFound = e {
                    (StatusCode::NOT_FOUND, "not_found")
                } else {
                    (StatusCode::INTERNAL_SERVER_ERROR, "database_error")
                }
            }
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };
        (status, Json(body)).into_response()
    }
}
