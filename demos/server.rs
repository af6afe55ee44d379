//! Example server: opens master and slave engines from DB_MASTER_URI / DB_SLAVE_URI,
//! writes through master and reads through slave.
//!
//! Run: `DB_MASTER_URI=sqlite://master.db?mode=rwc DB_SLAVE_URI=sqlite://slave.db?mode=rwc cargo run --example server`

use axum::{extract::State, middleware::from_fn_with_state, routing::get, routing::post, Json, Router};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use waypoint::{
    bind_master, bind_slave, common_routes_with_ready, request_context, AppConfig, AppError, AppId, AppState,
    EngineResolver, RequestContext, Waypoint, WaypointOptions,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("waypoint=info,server=info")),
        )
        .init();

    let config = AppConfig::from_env();
    let options = WaypointOptions::from_config(&config)?;
    let waypoint = Waypoint::connect(AppId::new("demo"), &config, options).await?;

    // Schema setup runs outside any request and falls back to master.
    let engine = waypoint.get_engine(None)?;
    sqlx::query("CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
        .execute(engine.pool())
        .await?;

    let state = AppState {
        waypoint: waypoint.clone(),
    };
    let reads = Router::new()
        .route("/users/count", get(users_count))
        .route_layer(from_fn_with_state(waypoint.clone(), bind_slave));
    let writes = Router::new()
        .route("/users", post(create_user))
        .route_layer(from_fn_with_state(waypoint.clone(), bind_master));

    let app = Router::new()
        .merge(reads)
        .merge(writes)
        .with_state(waypoint.clone())
        .merge(common_routes_with_ready(state))
        .layer(axum::middleware::from_fn(request_context))
        .layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    waypoint.registry().close_all().await;
    Ok(())
}

async fn users_count(
    State(waypoint): State<Waypoint>,
    ctx: RequestContext,
) -> Result<Json<serde_json::Value>, AppError> {
    let engine = waypoint.get_engine(Some(&ctx))?;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(engine.pool())
        .await?;
    Ok(Json(serde_json::json!({ "count": count, "binding": engine.binding() })))
}

#[derive(serde::Deserialize)]
struct NewUser {
    name: String,
}

async fn create_user(
    State(waypoint): State<Waypoint>,
    ctx: RequestContext,
    Json(body): Json<NewUser>,
) -> Result<Json<serde_json::Value>, AppError> {
    if body.name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be empty".into()));
    }
    let engine = waypoint.get_engine(Some(&ctx))?;
    sqlx::query("INSERT INTO users (name) VALUES ($1)")
        .bind(body.name)
        .execute(engine.pool())
        .await?;
    Ok(Json(serde_json::json!({ "binding": engine.binding() })))
}
