mod catalog;
mod monitoring;
mod stocking;
mod user;

pub use catalog::SqliteCatalogRegistry;
pub use monitoring::SqliteMonitoringRegistry;
pub use stocking::SqliteStockingRegistry;
pub use user::SqliteUserRegistry;

use std::str::FromStr;

use aquafarm_core::{AlertCategory, AlertState, LifecycleState};
use jiff::Timestamp;
use ordered_float::NotNan;
use sqlx::{
    SqlitePool,
    migrate::Migrator,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use ulid::Ulid;

use super::RegistryError;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Open (creating when missing) and migrate the database file. All
/// registries share the returned pool.
pub async fn connect(path: impl AsRef<std::path::Path>) -> Result<SqlitePool, RegistryError> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}

/// In-memory database for tests. Capped at one connection so every query
/// sees the same database.
pub async fn connect_in_memory() -> Result<SqlitePool, RegistryError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;

    MIGRATOR.run(&pool).await?;

    Ok(pool)
}

fn parse_ulid(s: String) -> Result<Ulid, RegistryError> {
    Ulid::from_str(&s).map_err(|_| RegistryError::InvalidUlid(s))
}

fn parse_timestamp(sec: i64) -> Result<Timestamp, RegistryError> {
    Timestamp::from_second(sec).map_err(|_| RegistryError::InvalidTimestamp(sec))
}

fn not_nan(value: f64) -> NotNan<f64> {
    NotNan::new(value).expect("database should not contain NaN")
}

fn lifecycle_state_code(state: LifecycleState) -> i64 {
    match state {
        LifecycleState::Pending => 0,
        LifecycleState::Commercialized => 1,
        LifecycleState::Cancelled => 2,
    }
}

fn lifecycle_state_from_code(code: i64) -> Result<LifecycleState, RegistryError> {
    match code {
        0 => Ok(LifecycleState::Pending),
        1 => Ok(LifecycleState::Commercialized),
        2 => Ok(LifecycleState::Cancelled),
        other => Err(RegistryError::InvalidState(other)),
    }
}

fn alert_state_code(state: AlertState) -> i64 {
    match state {
        AlertState::Active => 0,
        AlertState::Resolved => 1,
        AlertState::Ignored => 2,
    }
}

fn alert_state_from_code(code: i64) -> Result<AlertState, RegistryError> {
    match code {
        0 => Ok(AlertState::Active),
        1 => Ok(AlertState::Resolved),
        2 => Ok(AlertState::Ignored),
        other => Err(RegistryError::InvalidState(other)),
    }
}

fn alert_category_code(category: AlertCategory) -> i64 {
    match category {
        AlertCategory::Temperature => 0,
        AlertCategory::Ph => 1,
        AlertCategory::Oxygen => 2,
        AlertCategory::Other => 3,
    }
}

fn alert_category_from_code(code: i64) -> Result<AlertCategory, RegistryError> {
    match code {
        0 => Ok(AlertCategory::Temperature),
        1 => Ok(AlertCategory::Ph),
        2 => Ok(AlertCategory::Oxygen),
        3 => Ok(AlertCategory::Other),
        other => Err(RegistryError::InvalidCategory(other)),
    }
}
