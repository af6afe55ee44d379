//! Engine registry: one opened pool per (application, binding), built at startup.

use crate::binding::Binding;
use crate::config::{AppConfig, WaypointOptions};
use crate::error::ConfigError;
use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Identity of an application instance sharing the registry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AppId(String);

impl AppId {
    pub fn new(name: impl Into<String>) -> Self {
        AppId(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AppId {
    fn from(s: &str) -> Self {
        AppId(s.to_string())
    }
}

#[derive(Debug)]
struct EngineInner {
    app: AppId,
    binding: Binding,
    pool: AnyPool,
}

/// Handle to an opened database engine. Clones share the same pool.
#[derive(Clone, Debug)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn pool(&self) -> &AnyPool {
        &self.inner.pool
    }

    pub fn binding(&self) -> Binding {
        self.inner.binding
    }

    pub fn app(&self) -> &AppId {
        &self.inner.app
    }

    /// True when both handles refer to the same registered engine.
    pub fn ptr_eq(&self, other: &Engine) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

/// Process-wide engines keyed by (app, binding). Wrap in `Arc` once startup is done;
/// from then on it is only read.
#[derive(Default)]
pub struct EngineRegistry {
    engines: HashMap<(AppId, Binding), Engine>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        EngineRegistry {
            engines: HashMap::new(),
        }
    }

    /// Open a pool for `uri` and record it under (app, binding). The driver is picked
    /// from the uri scheme and is responsible for validating it.
    pub async fn register(
        &mut self,
        app: &AppId,
        binding: Binding,
        uri: &str,
        max_connections: u32,
    ) -> Result<Engine, ConfigError> {
        self.ensure_vacant(app, binding)?;
        let engine = open_engine(app, binding, uri, max_connections).await?;
        self.insert(engine.clone());
        Ok(engine)
    }

    /// Register master and slave for `app` from the uris under the configured keys.
    /// Both keys are checked before any pool is opened, and nothing is recorded
    /// unless both pools open.
    pub async fn init_app(
        &mut self,
        app: &AppId,
        config: &AppConfig,
        options: &WaypointOptions,
    ) -> Result<(), ConfigError> {
        let master_uri = config.require_uri(&options.master_config_key)?;
        let slave_uri = config.require_uri(&options.slave_config_key)?;
        self.ensure_vacant(app, Binding::Master)?;
        self.ensure_vacant(app, Binding::Slave)?;

        let master = open_engine(app, Binding::Master, master_uri, options.max_connections).await?;
        let slave = match open_engine(app, Binding::Slave, slave_uri, options.max_connections).await {
            Ok(slave) => slave,
            Err(e) => {
                master.pool().close().await;
                tracing::warn!(app = %app, "slave engine failed to open, closed master engine");
                return Err(e);
            }
        };
        self.insert(master);
        self.insert(slave);
        Ok(())
    }

    fn ensure_vacant(&self, app: &AppId, binding: Binding) -> Result<(), ConfigError> {
        if self.contains(app, binding) {
            return Err(ConfigError::DuplicateEngine {
                app: app.to_string(),
                binding,
            });
        }
        Ok(())
    }

    fn insert(&mut self, engine: Engine) {
        tracing::info!(app = %engine.app(), binding = %engine.binding(), "registered database engine");
        self.engines
            .insert((engine.app().clone(), engine.binding()), engine);
    }

    pub fn resolve(&self, app: &AppId, binding: Binding) -> Result<Engine, ConfigError> {
        self.engines
            .get(&(app.clone(), binding))
            .cloned()
            .ok_or_else(|| ConfigError::UnregisteredEngine {
                app: app.to_string(),
                binding,
            })
    }

    pub fn contains(&self, app: &AppId, binding: Binding) -> bool {
        self.engines.contains_key(&(app.clone(), binding))
    }

    pub fn apps(&self) -> Vec<&AppId> {
        let mut apps: Vec<&AppId> = self.engines.keys().map(|(app, _)| app).collect();
        apps.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        apps.dedup();
        apps
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    /// Close every pool. Call at shutdown.
    pub async fn close_all(&self) {
        for ((app, binding), engine) in &self.engines {
            engine.pool().close().await;
            tracing::debug!(app = %app, binding = %binding, "closed database engine");
        }
    }
}

async fn open_engine(
    app: &AppId,
    binding: Binding,
    uri: &str,
    max_connections: u32,
) -> Result<Engine, ConfigError> {
    sqlx::any::install_default_drivers();
    let pool = AnyPoolOptions::new()
        .max_connections(max_connections)
        .connect(uri)
        .await
        .map_err(|source| ConfigError::Connect { binding, source })?;
    Ok(Engine {
        inner: Arc::new(EngineInner {
            app: app.clone(),
            binding,
            pool,
        }),
    })
}
