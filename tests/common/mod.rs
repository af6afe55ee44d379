//! Shared fixtures: a master and a slave SQLite engine holding 1 and 2 users.

#![allow(dead_code)]

use std::sync::Arc;
use tempfile::TempDir;
use waypoint::{
    AppConfig, AppError, AppId, Binding, EngineRegistry, EngineResolver, RequestContext, Waypoint,
    WaypointOptions,
};

pub struct Fixture {
    pub waypoint: Waypoint,
    // Keeps the database files alive for the test.
    pub dir: TempDir,
}

pub fn sqlite_uri(dir: &TempDir, file: &str) -> String {
    format!("sqlite://{}?mode=rwc", dir.path().join(file).display())
}

pub fn app_config(dir: &TempDir) -> AppConfig {
    AppConfig::new()
        .with("DB_MASTER_URI", sqlite_uri(dir, "master.db"))
        .with("DB_SLAVE_URI", sqlite_uri(dir, "slave.db"))
}

pub async fn fixture(options: WaypointOptions) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let waypoint = Waypoint::connect(AppId::new("test"), &app_config(&dir), options)
        .await
        .unwrap();
    seed(&waypoint, Binding::Master, &["foo"]).await;
    seed(&waypoint, Binding::Slave, &["foo", "bar"]).await;
    Fixture { waypoint, dir }
}

/// Registry shared by two apps, each with its own pair of databases.
pub async fn shared_registry(dir: &TempDir, apps: &[&str]) -> Arc<EngineRegistry> {
    let mut registry = EngineRegistry::new();
    let options = WaypointOptions::default();
    for app in apps {
        let config = AppConfig::new()
            .with("DB_MASTER_URI", sqlite_uri(dir, &format!("{}-master.db", app)))
            .with("DB_SLAVE_URI", sqlite_uri(dir, &format!("{}-slave.db", app)));
        registry
            .init_app(&AppId::new(*app), &config, &options)
            .await
            .unwrap();
    }
    Arc::new(registry)
}

pub async fn seed(waypoint: &Waypoint, binding: Binding, names: &[&str]) {
    let engine = waypoint.registry().resolve(waypoint.app(), binding).unwrap();
    sqlx::query("DROP TABLE IF EXISTS users")
        .execute(engine.pool())
        .await
        .unwrap();
    sqlx::query("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)")
        .execute(engine.pool())
        .await
        .unwrap();
    for name in names {
        sqlx::query(&format!("INSERT INTO users (name) VALUES ('{}')", name))
            .execute(engine.pool())
            .await
            .unwrap();
    }
}

/// What a data-access helper looks like: ask the resolver, then query.
pub async fn users_count<R: EngineResolver>(
    resolver: &R,
    ctx: Option<&RequestContext>,
) -> Result<i64, AppError> {
    let engine = resolver.get_engine(ctx)?;
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(engine.pool())
        .await?;
    Ok(count)
}
