//! Waypoint: request-scoped master/slave database binding for axum services.
//!
//! Engines are opened once at startup into an [`EngineRegistry`]. Each request gets a
//! [`RequestContext`]; handlers bind it to master or slave through a [`Waypoint`], and
//! the data-access layer asks [`EngineResolver::get_engine`] for the engine to use.

pub mod binding;
pub mod config;
pub mod context;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod registry;
pub mod routes;
pub mod scope;
pub mod state;

pub use binding::Binding;
pub use config::{AppConfig, ExitPolicy, WaypointOptions};
pub use context::RequestContext;
pub use error::{AppError, ConfigError, WaypointError};
pub use middleware::{bind_master, bind_slave, request_context};
pub use registry::{AppId, Engine, EngineRegistry};
pub use routes::{common_routes, common_routes_with_ready};
pub use scope::{BindingScope, EngineResolver, Waypoint};
pub use state::AppState;
