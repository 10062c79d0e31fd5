use aquafarm_core::{
    Alert, AlertId, AlertState, DomainError, MonitoringReading, PondId, ReadingId, SensorId,
    SpeciesId, ToleranceBands,
    alert::{SensorKind, breach_message, classify, evaluate},
};
use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::{QueryBuilder, Row, SqliteConnection, SqlitePool};
use ulid::Ulid;

use crate::registry::{MonitoringRegistry, RegistryError};

use super::{
    alert_category_code, alert_category_from_code, alert_state_code, alert_state_from_code,
    not_nan, parse_timestamp, parse_ulid,
};

#[derive(Clone)]
pub struct SqliteMonitoringRegistry {
    pool: SqlitePool,
}

impl SqliteMonitoringRegistry {
    pub async fn new(path: impl AsRef<std::path::Path>) -> Result<Self, RegistryError> {
        let pool = super::connect(path).await?;
        Ok(Self { pool })
    }

    pub async fn new_in_memory() -> Result<Self, RegistryError> {
        let pool = super::connect_in_memory().await?;
        Ok(Self { pool })
    }

    pub fn with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MonitoringRegistry for SqliteMonitoringRegistry {
    async fn record_reading(
        &self,
        reading: MonitoringReading,
    ) -> Result<(MonitoringReading, Vec<Alert>), RegistryError> {
        let mut tx = self.pool.begin().await?;
        let now = Timestamp::now();

        let sensor_row = sqlx::query("SELECT name, unit FROM sensors WHERE id = ?")
            .bind(reading.sensor_id.0.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                DomainError::not_found("sensor", reading.sensor_id.0.to_string())
            })?;
        let name: String = sensor_row.try_get("name")?;
        let unit: String = sensor_row.try_get("unit")?;

        sqlx::query(
            "INSERT INTO readings (id, pond_id, sensor_id, value, measured_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(reading.id.0.to_string())
        .bind(reading.pond_id.0.to_string())
        .bind(reading.sensor_id.0.to_string())
        .bind(reading.value.into_inner())
        .bind(reading.measured_at.as_second())
        .execute(&mut *tx)
        .await?;

        let kind = classify(&name, &unit);
        let mut alerts = Vec::new();

        if kind != SensorKind::Unknown {
            for (species_id, species_name, bands) in
                stocked_species(&mut tx, reading.pond_id).await?
            {
                let Some(breach) = evaluate(kind, reading.value, &bands) else {
                    continue;
                };

                let alert = Alert {
                    id: AlertId(Ulid::new()),
                    reading_id: reading.id,
                    species_id,
                    category: breach.category,
                    message: breach_message(&species_name, reading.value, &breach).into(),
                    measured: reading.value,
                    limit: breach.limit,
                    state: AlertState::Active,
                    created_at: now,
                    resolved_at: None,
                };
                insert_alert(&mut tx, &alert).await?;
                alerts.push(alert);
            }
        }

        tx.commit().await?;
        Ok((reading, alerts))
    }

    async fn get_reading(
        &self,
        id: ReadingId,
    ) -> Result<Option<MonitoringReading>, RegistryError> {
        let row = sqlx::query(
            "SELECT id, pond_id, sensor_id, value, measured_at FROM readings WHERE id = ?",
        )
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_row_to_reading(&r)).transpose()
    }

    async fn list_readings(
        &self,
        pond: PondId,
        latest_per_sensor: bool,
    ) -> Result<Vec<MonitoringReading>, RegistryError> {
        let rows = if latest_per_sensor {
            sqlx::query(
                r#"
                SELECT r.id, r.pond_id, r.sensor_id, r.value, r.measured_at
                FROM readings r
                JOIN (
                    SELECT sensor_id, MAX(measured_at) AS latest_at
                    FROM readings WHERE pond_id = ? GROUP BY sensor_id
                ) m ON r.sensor_id = m.sensor_id AND r.measured_at = m.latest_at
                WHERE r.pond_id = ?
                ORDER BY r.measured_at DESC
                "#,
            )
            .bind(pond.0.to_string())
            .bind(pond.0.to_string())
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query(
                r#"
                SELECT id, pond_id, sensor_id, value, measured_at
                FROM readings WHERE pond_id = ?
                ORDER BY measured_at DESC
                "#,
            )
            .bind(pond.0.to_string())
            .fetch_all(&self.pool)
            .await?
        };

        rows.iter().map(map_row_to_reading).collect()
    }

    async fn get_alert(&self, id: AlertId) -> Result<Option<Alert>, RegistryError> {
        let row = sqlx::query(&format!("{ALERT_COLUMNS} FROM alerts a WHERE a.id = ?"))
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| map_row_to_alert(&r)).transpose()
    }

    async fn list_alerts(
        &self,
        pond: Option<PondId>,
        state: Option<AlertState>,
    ) -> Result<Vec<Alert>, RegistryError> {
        let mut query_builder = QueryBuilder::new(format!("{ALERT_COLUMNS} FROM alerts a "));

        if pond.is_some() {
            query_builder.push(" JOIN readings r ON a.reading_id = r.id ");
        }

        let mut has_where = false;
        let mut prefix = |qb: &mut QueryBuilder<'_, sqlx::Sqlite>| {
            if has_where {
                qb.push(" AND ");
            } else {
                qb.push(" WHERE ");
                has_where = true;
            }
        };

        if let Some(pond) = pond {
            prefix(&mut query_builder);
            query_builder
                .push("r.pond_id = ")
                .push_bind(pond.0.to_string());
        }
        if let Some(state) = state {
            prefix(&mut query_builder);
            query_builder
                .push("a.state = ")
                .push_bind(alert_state_code(state));
        }
        query_builder.push(" ORDER BY a.created_at DESC");

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_row_to_alert).collect()
    }

    async fn resolve_alert(&self, id: AlertId) -> Result<Alert, RegistryError> {
        self.close_alert(id, aquafarm_core::alert::resolve).await
    }

    async fn ignore_alert(&self, id: AlertId) -> Result<Alert, RegistryError> {
        self.close_alert(id, aquafarm_core::alert::ignore).await
    }
}

impl SqliteMonitoringRegistry {
    async fn close_alert(
        &self,
        id: AlertId,
        transition: fn(&Alert, Timestamp) -> Result<Alert, DomainError>,
    ) -> Result<Alert, RegistryError> {
        let mut tx = self.pool.begin().await?;
        let now = Timestamp::now();

        let row = sqlx::query(&format!("{ALERT_COLUMNS} FROM alerts a WHERE a.id = ?"))
            .bind(id.0.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| DomainError::not_found("alert", id.0.to_string()))?;
        let current = map_row_to_alert(&row)?;

        let updated = transition(&current, now)?;

        sqlx::query("UPDATE alerts SET state = ?, resolved_at = ? WHERE id = ?")
            .bind(alert_state_code(updated.state))
            .bind(updated.resolved_at.map(|t| t.as_second()))
            .bind(id.0.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(updated)
    }
}

const ALERT_COLUMNS: &str = "SELECT a.id, a.reading_id, a.species_id, a.category, a.message, \
     a.measured, a.limit_value, a.state, a.created_at, a.resolved_at";

/// Distinct species with a pending batch in the pond, with their tolerance
/// bands. Only these are candidates for alerting.
async fn stocked_species(
    conn: &mut SqliteConnection,
    pond: PondId,
) -> Result<Vec<(SpeciesId, String, ToleranceBands)>, RegistryError> {
    let rows = sqlx::query(
        r#"
        SELECT DISTINCT s.id, s.name, s.temp_min, s.temp_max, s.ph_min, s.ph_max, s.oxygen_min
        FROM species s
        JOIN stocking_batches b ON b.species_id = s.id
        JOIN stocking_lifecycles l ON l.batch_id = b.id
        WHERE b.pond_id = ? AND l.state = 0
        "#,
    )
    .bind(pond.0.to_string())
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|r| {
            let id = SpeciesId(parse_ulid(r.try_get("id")?)?);
            let name: String = r.try_get("name")?;
            let bands = ToleranceBands {
                temp_min: r.try_get::<Option<f64>, _>("temp_min")?.map(not_nan),
                temp_max: r.try_get::<Option<f64>, _>("temp_max")?.map(not_nan),
                ph_min: r.try_get::<Option<f64>, _>("ph_min")?.map(not_nan),
                ph_max: r.try_get::<Option<f64>, _>("ph_max")?.map(not_nan),
                oxygen_min: r.try_get::<Option<f64>, _>("oxygen_min")?.map(not_nan),
            };
            Ok((id, name, bands))
        })
        .collect()
}

async fn insert_alert(conn: &mut SqliteConnection, alert: &Alert) -> Result<(), RegistryError> {
    sqlx::query(
        r#"
        INSERT INTO alerts (id, reading_id, species_id, category, message, measured,
            limit_value, state, created_at, resolved_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(alert.id.0.to_string())
    .bind(alert.reading_id.0.to_string())
    .bind(alert.species_id.0.to_string())
    .bind(alert_category_code(alert.category))
    .bind(&*alert.message)
    .bind(alert.measured.into_inner())
    .bind(alert.limit.into_inner())
    .bind(alert_state_code(alert.state))
    .bind(alert.created_at.as_second())
    .bind(alert.resolved_at.map(|t| t.as_second()))
    .execute(conn)
    .await?;

    Ok(())
}

fn map_row_to_reading(r: &sqlx::sqlite::SqliteRow) -> Result<MonitoringReading, RegistryError> {
    Ok(MonitoringReading {
        id: ReadingId(parse_ulid(r.try_get("id")?)?),
        pond_id: PondId(parse_ulid(r.try_get("pond_id")?)?),
        sensor_id: SensorId(parse_ulid(r.try_get("sensor_id")?)?),
        value: not_nan(r.try_get("value")?),
        measured_at: parse_timestamp(r.try_get("measured_at")?)?,
    })
}

fn map_row_to_alert(r: &sqlx::sqlite::SqliteRow) -> Result<Alert, RegistryError> {
    Ok(Alert {
        id: AlertId(parse_ulid(r.try_get("id")?)?),
        reading_id: ReadingId(parse_ulid(r.try_get("reading_id")?)?),
        species_id: SpeciesId(parse_ulid(r.try_get("species_id")?)?),
        category: alert_category_from_code(r.try_get("category")?)?,
        message: r.try_get::<String, _>("message")?.into(),
        measured: not_nan(r.try_get("measured")?),
        limit: not_nan(r.try_get("limit_value")?),
        state: alert_state_from_code(r.try_get("state")?)?,
        created_at: parse_timestamp(r.try_get("created_at")?)?,
        resolved_at: r
            .try_get::<Option<i64>, _>("resolved_at")?
            .map(parse_timestamp)
            .transpose()?,
    })
}

#[cfg(test)]
mod tests {
    use aquafarm_core::{
        AlertCategory, AlertState, BatchId, DomainError, Farm, FarmId, MonitoringReading, Pond,
        PondId, ReadingId, Sensor, SensorId, Species, SpeciesId, StockingBatch, ToleranceBands,
        User, UserId,
    };
    use jiff::Timestamp;
    use ordered_float::NotNan;
    use sqlx::SqlitePool;
    use ulid::Ulid;

    use crate::registry::sqlite::{
        SqliteCatalogRegistry, SqliteStockingRegistry, SqliteUserRegistry, connect_in_memory,
    };
    use crate::registry::{
        CatalogRegistry, MonitoringRegistry, RegistryError, StockingRegistry, UserRegistry,
    };

    use super::SqliteMonitoringRegistry;

    fn nn(v: f64) -> NotNan<f64> {
        NotNan::new(v).unwrap()
    }

    struct Farmstead {
        pool: SqlitePool,
        registry: SqliteMonitoringRegistry,
        stocking: SqliteStockingRegistry,
        pond: PondId,
        species: SpeciesId,
        temp_sensor: SensorId,
    }

    async fn farmstead() -> Farmstead {
        let pool = connect_in_memory().await.unwrap();
        let catalog = SqliteCatalogRegistry::with_pool(pool.clone());
        let users = SqliteUserRegistry::with_pool(pool.clone());

        let owner = UserId(Ulid::new());
        users
            .create_user(User {
                id: owner,
                name: "Owner".into(),
                email: "owner@example.com".into(),
                password_hash: "hash".into(),
                created_at: Timestamp::now(),
            })
            .await
            .unwrap();

        let farm = FarmId(Ulid::new());
        catalog
            .create_farm(Farm {
                id: farm,
                name: "La Esperanza".into(),
                method: "extensive ponds".into(),
                location: "Valle".into(),
                owner,
            })
            .await
            .unwrap();

        let pond = PondId(Ulid::new());
        catalog
            .create_pond(Pond {
                id: pond,
                farm_id: farm,
                kind: "earthen".into(),
                volume_liters: 50_000,
                capacity_liters: 60_000,
            })
            .await
            .unwrap();

        let species = SpeciesId(Ulid::new());
        catalog
            .create_species(Species {
                id: species,
                name: "Tilapia".into(),
                scientific_name: None,
                tolerance: ToleranceBands {
                    temp_min: Some(nn(22.0)),
                    temp_max: Some(nn(30.0)),
                    ph_min: Some(nn(6.5)),
                    ph_max: Some(nn(8.5)),
                    oxygen_min: Some(nn(4.0)),
                },
                nutrition: None,
                growth: None,
                reproduction: None,
                habitat: None,
                diet: None,
                behavior: None,
                stocking_density: None,
            })
            .await
            .unwrap();

        let temp_sensor = SensorId(Ulid::new());
        catalog
            .create_sensor(Sensor {
                id: temp_sensor,
                name: "Temperatura".into(),
                unit: "°C".into(),
                description: None,
            })
            .await
            .unwrap();

        Farmstead {
            registry: SqliteMonitoringRegistry::with_pool(pool.clone()),
            stocking: SqliteStockingRegistry::with_pool(pool.clone()),
            pool,
            pond,
            species,
            temp_sensor,
        }
    }

    async fn stock(f: &Farmstead) -> aquafarm_core::StockingLifecycle {
        f.stocking
            .create_batch(StockingBatch {
                id: BatchId(Ulid::new()),
                species_id: f.species,
                pond_id: f.pond,
                quantity: 100,
                stocked_at: Timestamp::now(),
                investment: 120.0,
            })
            .await
            .unwrap()
            .lifecycle
    }

    fn reading(f: &Farmstead, sensor: SensorId, value: f64) -> MonitoringReading {
        MonitoringReading {
            id: ReadingId(Ulid::new()),
            pond_id: f.pond,
            sensor_id: sensor,
            value: nn(value),
            measured_at: Timestamp::now(),
        }
    }

    #[tokio::test]
    async fn breaching_reading_raises_one_alert() {
        let f = farmstead().await;
        stock(&f).await;

        let (_, alerts) = f
            .registry
            .record_reading(reading(&f, f.temp_sensor, 35.0))
            .await
            .unwrap();

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.category, AlertCategory::Temperature);
        assert_eq!(alert.state, AlertState::Active);
        assert_eq!(alert.measured, nn(35.0));
        assert_eq!(alert.limit, nn(30.0));
        assert!(alert.message.contains("Tilapia"));

        let stored = f.registry.get_alert(alert.id).await.unwrap().unwrap();
        assert_eq!(stored.species_id, f.species);
    }

    #[tokio::test]
    async fn alerts_are_deduplicated_by_species() {
        let f = farmstead().await;
        // Two pending batches of the same species share the pond.
        stock(&f).await;
        stock(&f).await;

        let (_, alerts) = f
            .registry
            .record_reading(reading(&f, f.temp_sensor, 35.0))
            .await
            .unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].species_id, f.species);

        // A second species in the same pond gets its own alert, against its
        // own band.
        let catalog = SqliteCatalogRegistry::with_pool(f.pool.clone());
        let trout = SpeciesId(Ulid::new());
        catalog
            .create_species(Species {
                id: trout,
                name: "Trucha".into(),
                scientific_name: None,
                tolerance: ToleranceBands {
                    temp_min: Some(nn(10.0)),
                    temp_max: Some(nn(18.0)),
                    ..ToleranceBands::default()
                },
                nutrition: None,
                growth: None,
                reproduction: None,
                habitat: None,
                diet: None,
                behavior: None,
                stocking_density: None,
            })
            .await
            .unwrap();
        f.stocking
            .create_batch(StockingBatch {
                id: BatchId(Ulid::new()),
                species_id: trout,
                pond_id: f.pond,
                quantity: 50,
                stocked_at: Timestamp::now(),
                investment: 80.0,
            })
            .await
            .unwrap();

        let (_, alerts) = f
            .registry
            .record_reading(reading(&f, f.temp_sensor, 35.0))
            .await
            .unwrap();
        assert_eq!(alerts.len(), 2);
        assert!(alerts.iter().any(|a| a.species_id == f.species));
        let trout_alert = alerts.iter().find(|a| a.species_id == trout).unwrap();
        assert_eq!(trout_alert.limit, nn(18.0));
        assert!(trout_alert.message.contains("Trucha"));
    }

    #[tokio::test]
    async fn in_band_reading_stays_quiet() {
        let f = farmstead().await;
        stock(&f).await;

        let (stored, alerts) = f
            .registry
            .record_reading(reading(&f, f.temp_sensor, 26.0))
            .await
            .unwrap();

        assert!(alerts.is_empty());
        assert!(f.registry.get_reading(stored.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn unrecognized_sensor_never_alerts() {
        let f = farmstead().await;
        stock(&f).await;

        let catalog = SqliteCatalogRegistry::with_pool(f.pool.clone());
        let salinity = SensorId(Ulid::new());
        catalog
            .create_sensor(Sensor {
                id: salinity,
                name: "Salinidad".into(),
                unit: "ppt".into(),
                description: None,
            })
            .await
            .unwrap();

        let (stored, alerts) = f
            .registry
            .record_reading(reading(&f, salinity, 9999.0))
            .await
            .unwrap();

        assert!(alerts.is_empty());
        // The reading itself is still persisted.
        assert!(f.registry.get_reading(stored.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn only_pending_stock_is_evaluated() {
        let f = farmstead().await;

        // No stock at all: nothing to protect.
        let (_, alerts) = f
            .registry
            .record_reading(reading(&f, f.temp_sensor, 35.0))
            .await
            .unwrap();
        assert!(alerts.is_empty());

        // Cancelled stock does not count either.
        let lifecycle = stock(&f).await;
        f.stocking.cancel(lifecycle.id).await.unwrap();
        let (_, alerts) = f
            .registry
            .record_reading(reading(&f, f.temp_sensor, 35.0))
            .await
            .unwrap();
        assert!(alerts.is_empty());
    }

    #[tokio::test]
    async fn latest_per_sensor_listing() {
        let f = farmstead().await;

        let base = Timestamp::now().as_second();
        for (offset, value) in [(0, 24.0), (60, 25.0), (120, 26.0)] {
            f.registry
                .record_reading(MonitoringReading {
                    id: ReadingId(Ulid::new()),
                    pond_id: f.pond,
                    sensor_id: f.temp_sensor,
                    value: nn(value),
                    measured_at: Timestamp::from_second(base + offset).unwrap(),
                })
                .await
                .unwrap();
        }

        let all = f.registry.list_readings(f.pond, false).await.unwrap();
        assert_eq!(all.len(), 3);

        let latest = f.registry.list_readings(f.pond, true).await.unwrap();
        assert_eq!(latest.len(), 1);
        assert_eq!(latest[0].value, nn(26.0));
    }

    #[tokio::test]
    async fn alert_resolution_is_one_way() {
        let f = farmstead().await;
        stock(&f).await;

        let (_, alerts) = f
            .registry
            .record_reading(reading(&f, f.temp_sensor, 35.0))
            .await
            .unwrap();
        let alert = &alerts[0];

        let resolved = f.registry.resolve_alert(alert.id).await.unwrap();
        assert_eq!(resolved.state, AlertState::Resolved);
        assert!(resolved.resolved_at.is_some());

        let err = f.registry.resolve_alert(alert.id).await.unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Domain(DomainError::InvalidStateTransition { .. })
        ));
        assert!(f.registry.ignore_alert(alert.id).await.is_err());

        let active = f
            .registry
            .list_alerts(Some(f.pond), Some(AlertState::Active))
            .await
            .unwrap();
        assert!(active.is_empty());
        let resolved = f
            .registry
            .list_alerts(Some(f.pond), Some(AlertState::Resolved))
            .await
            .unwrap();
        assert_eq!(resolved.len(), 1);
    }
}
