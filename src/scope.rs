//! Binding scope manager: enter/exit bound scopes and resolve the engine for a query.
//!
//! Per request the binding moves `UNBOUND -> BOUND(name)` on a successful
//! [`Waypoint::enter`]. Entering again while bound fails with
//! [`WaypointError::DuplicateBinding`] and leaves the active binding untouched.
//! Leaving a scope goes back to `UNBOUND` only under [`ExitPolicy::Clear`]; the
//! default [`ExitPolicy::Retain`] keeps the binding until the request ends.

use crate::binding::Binding;
use crate::config::{AppConfig, ExitPolicy, WaypointOptions};
use crate::context::RequestContext;
use crate::error::{ConfigError, WaypointError};
use crate::registry::{AppId, Engine, EngineRegistry};
use std::future::Future;
use std::sync::Arc;

/// What the data-access layer calls whenever it needs a live engine.
pub trait EngineResolver: Send + Sync {
    /// `ctx` is `None` for work running outside any request (startup, background jobs).
    fn get_engine(&self, ctx: Option<&RequestContext>) -> Result<Engine, WaypointError>;
}

/// Binding manager for one application.
#[derive(Clone)]
pub struct Waypoint {
    app: AppId,
    registry: Arc<EngineRegistry>,
    options: WaypointOptions,
}

impl Waypoint {
    pub fn new(app: AppId, registry: Arc<EngineRegistry>, options: WaypointOptions) -> Self {
        Waypoint {
            app,
            registry,
            options,
        }
    }

    /// Open master and slave engines for `app` into a registry of its own.
    pub async fn connect(
        app: AppId,
        config: &AppConfig,
        options: WaypointOptions,
    ) -> Result<Self, ConfigError> {
        let mut registry = EngineRegistry::new();
        registry.init_app(&app, config, &options).await?;
        Ok(Waypoint::new(app, Arc::new(registry), options))
    }

    pub fn app(&self) -> &AppId {
        &self.app
    }

    pub fn registry(&self) -> &Arc<EngineRegistry> {
        &self.registry
    }

    pub fn options(&self) -> &WaypointOptions {
        &self.options
    }

    /// Enter a scope by name. Unknown names are rejected before the context is read.
    pub fn enter_binding(
        &self,
        ctx: &RequestContext,
        name: &str,
    ) -> Result<BindingScope, WaypointError> {
        let binding: Binding = name.parse()?;
        self.enter(ctx, binding)
    }

    pub fn enter(
        &self,
        ctx: &RequestContext,
        binding: Binding,
    ) -> Result<BindingScope, WaypointError> {
        if !self.registry.contains(&self.app, binding) {
            return Err(ConfigError::UnregisteredEngine {
                app: self.app.to_string(),
                binding,
            }
            .into());
        }
        ctx.try_bind(binding).map_err(|active| {
            tracing::debug!(
                app = %self.app,
                request_id = %ctx.request_id(),
                active = %active,
                requested = %binding,
                "rejected second binding on request"
            );
            WaypointError::DuplicateBinding {
                active,
                requested: binding,
            }
        })?;
        tracing::debug!(app = %self.app, request_id = %ctx.request_id(), binding = %binding, "entered binding scope");
        Ok(BindingScope {
            ctx: ctx.clone(),
            binding,
            policy: self.options.exit_policy,
        })
    }

    /// Engine for the request's current binding. Unbound access falls back to master
    /// with a warning, unless strict mode is on and the call is inside a request.
    pub fn resolve_engine(&self, ctx: Option<&RequestContext>) -> Result<Engine, WaypointError> {
        let binding = match ctx.and_then(RequestContext::get) {
            Some(binding) => binding,
            None => {
                if self.options.raise_when_not_binding && ctx.is_some() {
                    return Err(WaypointError::NoBindingActive);
                }
                tracing::warn!(
                    app = %self.app,
                    request_id = ?ctx.map(RequestContext::request_id),
                    "using database without binding to master or slave, falling back to master"
                );
                Binding::Master
            }
        };
        Ok(self.registry.resolve(&self.app, binding)?)
    }

    pub fn with_binding<T>(
        &self,
        ctx: &RequestContext,
        binding: Binding,
        f: impl FnOnce() -> T,
    ) -> Result<T, WaypointError> {
        let _scope = self.enter(ctx, binding)?;
        Ok(f())
    }

    pub fn with_master<T>(&self, ctx: &RequestContext, f: impl FnOnce() -> T) -> Result<T, WaypointError> {
        self.with_binding(ctx, Binding::Master, f)
    }

    pub fn with_slave<T>(&self, ctx: &RequestContext, f: impl FnOnce() -> T) -> Result<T, WaypointError> {
        self.with_binding(ctx, Binding::Slave, f)
    }

    /// Async form of [`Waypoint::with_binding`]. The future is built after the scope is
    /// entered, and the scope exits even if the future is dropped before completing.
    pub async fn with_binding_async<F, Fut, T>(
        &self,
        ctx: &RequestContext,
        binding: Binding,
        f: F,
    ) -> Result<T, WaypointError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _scope = self.enter(ctx, binding)?;
        Ok(f().await)
    }

    pub async fn with_master_async<F, Fut, T>(&self, ctx: &RequestContext, f: F) -> Result<T, WaypointError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.with_binding_async(ctx, Binding::Master, f).await
    }

    pub async fn with_slave_async<F, Fut, T>(&self, ctx: &RequestContext, f: F) -> Result<T, WaypointError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        self.with_binding_async(ctx, Binding::Slave, f).await
    }
}

impl EngineResolver for Waypoint {
    fn get_engine(&self, ctx: Option<&RequestContext>) -> Result<Engine, WaypointError> {
        self.resolve_engine(ctx)
    }
}

/// Armed binding scope. Dropping it applies the exit policy, including on `?`
/// returns, panics and cancelled futures.
#[must_use = "the binding scope ends when this guard is dropped"]
#[derive(Debug)]
pub struct BindingScope {
    ctx: RequestContext,
    binding: Binding,
    policy: ExitPolicy,
}

impl BindingScope {
    pub fn binding(&self) -> Binding {
        self.binding
    }
}

impl Drop for BindingScope {
    fn drop(&mut self) {
        if self.policy == ExitPolicy::Clear {
            self.ctx.clear();
        }
        tracing::debug!(
            request_id = %self.ctx.request_id(),
            binding = %self.binding,
            cleared = self.policy == ExitPolicy::Clear,
            "left binding scope"
        );
    }
}
