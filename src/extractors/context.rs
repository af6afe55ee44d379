//! Extract the request's binding context from request extensions.

use crate::context::RequestContext;
use crate::error::{AppError, ConfigError};
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Requires the [`crate::middleware::request_context`] layer; without it every
/// extraction fails with a config error.
#[async_trait]
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .ok_or_else(|| ConfigError::MissingRequestContext.into())
    }
}
