//! Request lifecycle middleware: per-request binding context and route-level binding.
//!
//! Install [`request_context`] on the whole router with `.layer(..)`, then opt routes
//! into a binding with
//! `.route_layer(axum::middleware::from_fn_with_state(waypoint, bind_slave))`.

use crate::binding::Binding;
use crate::context::RequestContext;
use crate::error::{AppError, ConfigError};
use crate::scope::Waypoint;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::Instrument;

/// Give every request a fresh, unbound context. It is dropped with the request.
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let ctx = RequestContext::new();
    let span = tracing::debug_span!("request", request_id = %ctx.request_id());
    request.extensions_mut().insert(ctx);
    next.run(request).instrument(span).await
}

/// Run the whole handler inside a master binding scope.
pub async fn bind_master(
    State(waypoint): State<Waypoint>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    bind_request(&waypoint, Binding::Master, request, next).await
}

/// Run the whole handler inside a slave binding scope.
pub async fn bind_slave(
    State(waypoint): State<Waypoint>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    bind_request(&waypoint, Binding::Slave, request, next).await
}

async fn bind_request(
    waypoint: &Waypoint,
    binding: Binding,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ctx = request
        .extensions()
        .get::<RequestContext>()
        .cloned()
        .ok_or(ConfigError::MissingRequestContext)?;
    let _scope = waypoint.enter(&ctx, binding)?;
    Ok(next.run(request).await)
}
