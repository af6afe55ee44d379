//! Common routes: health, readiness, version.

use crate::binding::Binding;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
}

#[derive(Serialize)]
struct EngineStatus {
    binding: Binding,
    status: &'static str,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    engines: Vec<EngineStatus>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody { status: "ok" })
}

async fn ready(State(state): State<AppState>) -> (StatusCode, Json<ReadyBody>) {
    let waypoint = &state.waypoint;
    let mut engines = Vec::with_capacity(Binding::ALL.len());
    let mut all_ok = true;
    for binding in Binding::ALL {
        let ok = match waypoint.registry().resolve(waypoint.app(), binding) {
            Ok(engine) => sqlx::query("SELECT 1").fetch_optional(engine.pool()).await.is_ok(),
            Err(_) => false,
        };
        if !ok {
            tracing::warn!(app = %waypoint.app(), binding = %binding, "readiness check failed");
        }
        all_ok &= ok;
        engines.push(EngineStatus {
            binding,
            status: if ok { "ok" } else { "unavailable" },
        });
    }
    let (status, label) = if all_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (status, Json(ReadyBody { status: label, engines }))
}

#[derive(Serialize)]
struct VersionBody {
    name: &'static str,
    version: &'static str,
    bindings: [Binding; 2],
}

async fn version() -> Json<VersionBody> {
    Json(VersionBody {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        bindings: Binding::ALL,
    })
}

/// Stateless routes: GET /health, GET /version.
pub fn common_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/version", get(version))
}

/// [`common_routes`] plus GET /ready, which pings both engines of the app.
pub fn common_routes_with_ready(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(ready))
        .with_state(state)
        .merge(common_routes())
}
