use aquafarm_core::{
    BatchId, DomainError, FarmId, InventoryId, InventoryRecord, LifecycleId, LifecycleState,
    PondId, PondSplit, SpeciesId, SplitId, SplitLogEntry, SplitLogId, StockingBatch,
    StockingLifecycle, lifecycle, lifecycle::CommercializeRequest,
};
use async_trait::async_trait;
use jiff::Timestamp;
use sqlx::{QueryBuilder, Row, SqliteConnection, SqlitePool};
use ulid::Ulid;

use crate::registry::{RegistryError, StockingCreated, StockingRegistry};

use super::{lifecycle_state_code, lifecycle_state_from_code, parse_timestamp, parse_ulid};

#[derive(Clone)]
pub struct SqliteStockingRegistry {
    pool: SqlitePool,
}

impl SqliteStockingRegistry {
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
impl StockingRegistry for SqliteStockingRegistry {
    async fn create_batch(&self, batch: StockingBatch) -> Result<StockingCreated, RegistryError> {
        let mut tx = self.pool.begin().await?;
        let now = Timestamp::now();

        let farm_id = farm_for_pond(&mut tx, batch.pond_id).await?;

        sqlx::query(
            r#"
            INSERT INTO stocking_batches (id, species_id, pond_id, quantity, stocked_at, investment)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(batch.id.0.to_string())
        .bind(batch.species_id.0.to_string())
        .bind(batch.pond_id.0.to_string())
        .bind(batch.quantity)
        .bind(batch.stocked_at.as_second())
        .bind(batch.investment)
        .execute(&mut *tx)
        .await?;

        let lifecycle = StockingLifecycle {
            id: LifecycleId(Ulid::new()),
            batch_id: batch.id,
            state: LifecycleState::Pending,
            commercialized_at: None,
            kilos_sold: 0.0,
            price_per_kilo: 0.0,
            avg_kilos_per_fish: None,
            total_harvest_kilos: None,
            fish_commercialized: None,
            mortality_rate: None,
            created_at: now,
            updated_at: now,
        };
        insert_lifecycle(&mut tx, &lifecycle).await?;

        let inventory =
            upsert_add(&mut tx, batch.species_id, farm_id, batch.quantity, now).await?;

        tx.commit().await?;

        Ok(StockingCreated {
            batch,
            lifecycle,
            inventory,
        })
    }

    async fn get_batch(&self, id: BatchId) -> Result<Option<StockingBatch>, RegistryError> {
        let row = sqlx::query(
            r#"
            SELECT id, species_id, pond_id, quantity, stocked_at, investment
            FROM stocking_batches WHERE id = ?
            "#,
        )
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_row_to_batch(&r)).transpose()
    }

    async fn list_batches(
        &self,
        pond: Option<PondId>,
    ) -> Result<Vec<StockingBatch>, RegistryError> {
        let mut query_builder = QueryBuilder::new(
            "SELECT id, species_id, pond_id, quantity, stocked_at, investment FROM stocking_batches ",
        );

        if let Some(pond) = pond {
            query_builder
                .push(" WHERE pond_id = ")
                .push_bind(pond.0.to_string());
        }
        query_builder.push(" ORDER BY stocked_at DESC");

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_row_to_batch).collect()
    }

    async fn get_lifecycle(
        &self,
        id: LifecycleId,
    ) -> Result<Option<StockingLifecycle>, RegistryError> {
        let row = sqlx::query(&format!(
            "{LIFECYCLE_COLUMNS} FROM stocking_lifecycles WHERE id = ?"
        ))
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_row_to_lifecycle(&r)).transpose()
    }

    async fn lifecycle_for_batch(
        &self,
        batch: BatchId,
    ) -> Result<Option<StockingLifecycle>, RegistryError> {
        let row = sqlx::query(&format!(
            "{LIFECYCLE_COLUMNS} FROM stocking_lifecycles WHERE batch_id = ?"
        ))
        .bind(batch.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_row_to_lifecycle(&r)).transpose()
    }

    async fn list_lifecycles(
        &self,
        state: Option<LifecycleState>,
    ) -> Result<Vec<StockingLifecycle>, RegistryError> {
        let mut query_builder =
            QueryBuilder::new(format!("{LIFECYCLE_COLUMNS} FROM stocking_lifecycles "));

        if let Some(state) = state {
            query_builder
                .push(" WHERE state = ")
                .push_bind(lifecycle_state_code(state));
        }
        query_builder.push(" ORDER BY created_at DESC");

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_row_to_lifecycle).collect()
    }

    async fn commercialize(
        &self,
        id: LifecycleId,
        request: CommercializeRequest,
    ) -> Result<StockingLifecycle, RegistryError> {
        let mut tx = self.pool.begin().await?;
        let now = Timestamp::now();

        let current = fetch_lifecycle(&mut tx, id).await?;
        let batch = fetch_batch(&mut tx, current.batch_id).await?;

        let updated = lifecycle::commercialize(&current, &batch, &request, now)?;
        update_lifecycle(&mut tx, &updated).await?;

        // The sale removes the harvested fish from the ledger. A ledger that
        // lags behind reality never blocks the sale: missing records are
        // created empty and shortfalls clamp the count to zero.
        if let Some(fish) = updated.fish_commercialized.filter(|f| *f > 0) {
            let farm_id = farm_for_pond(&mut tx, batch.pond_id).await?;
            match fetch_inventory(&mut tx, batch.species_id, farm_id).await? {
                None => {
                    tracing::warn!(
                        species = %batch.species_id.0,
                        farm = %farm_id.0,
                        "no inventory record for commercialized batch"
                    );
                    upsert_add(&mut tx, batch.species_id, farm_id, 0, now).await?;
                }
                Some(record) => {
                    let remaining = match record.checked_reduce(fish) {
                        Ok(remaining) => remaining,
                        Err(_) => {
                            tracing::warn!(
                                available = record.quantity,
                                requested = fish,
                                "inventory shortfall on commercialization, clamping to zero"
                            );
                            0
                        }
                    };
                    set_inventory_quantity(&mut tx, record.id, remaining, now).await?;
                }
            }
        }

        tx.commit().await?;
        Ok(updated)
    }

    async fn cancel(&self, id: LifecycleId) -> Result<StockingLifecycle, RegistryError> {
        let mut tx = self.pool.begin().await?;
        let now = Timestamp::now();

        let current = fetch_lifecycle(&mut tx, id).await?;
        let updated = lifecycle::cancel(&current, now)?;
        update_lifecycle(&mut tx, &updated).await?;

        tx.commit().await?;
        Ok(updated)
    }

    async fn add_quantity(
        &self,
        species: SpeciesId,
        farm: FarmId,
        quantity: i64,
    ) -> Result<InventoryRecord, RegistryError> {
        if quantity <= 0 {
            return Err(DomainError::NonPositiveQuantity(quantity).into());
        }

        let mut tx = self.pool.begin().await?;
        let record = upsert_add(&mut tx, species, farm, quantity, Timestamp::now()).await?;
        tx.commit().await?;
        Ok(record)
    }

    async fn reduce_quantity(
        &self,
        species: SpeciesId,
        farm: FarmId,
        quantity: i64,
    ) -> Result<InventoryRecord, RegistryError> {
        if quantity <= 0 {
            return Err(DomainError::NonPositiveQuantity(quantity).into());
        }

        let mut tx = self.pool.begin().await?;
        let now = Timestamp::now();

        let record = fetch_inventory(&mut tx, species, farm).await?.ok_or_else(|| {
            DomainError::not_found(
                "inventory record",
                format!("{}/{}", species.0, farm.0),
            )
        })?;
        let remaining = record.checked_reduce(quantity)?;
        set_inventory_quantity(&mut tx, record.id, remaining, now).await?;

        tx.commit().await?;
        Ok(InventoryRecord {
            quantity: remaining,
            updated_at: now,
            ..record
        })
    }

    async fn get_inventory(
        &self,
        species: SpeciesId,
        farm: FarmId,
    ) -> Result<Option<InventoryRecord>, RegistryError> {
        let mut conn = self.pool.acquire().await?;
        fetch_inventory(&mut conn, species, farm).await
    }

    async fn list_inventory(
        &self,
        farm: Option<FarmId>,
        species: Option<SpeciesId>,
    ) -> Result<Vec<InventoryRecord>, RegistryError> {
        let mut query_builder = QueryBuilder::new(
            "SELECT id, species_id, farm_id, quantity, updated_at FROM inventory ",
        );

        let mut has_where = false;
        let mut prefix = |qb: &mut QueryBuilder<'_, sqlx::Sqlite>| {
            if has_where {
                qb.push(" AND ");
            } else {
                qb.push(" WHERE ");
                has_where = true;
            }
        };

        if let Some(farm) = farm {
            prefix(&mut query_builder);
            query_builder
                .push("farm_id = ")
                .push_bind(farm.0.to_string());
        }
        if let Some(species) = species {
            prefix(&mut query_builder);
            query_builder
                .push("species_id = ")
                .push_bind(species.0.to_string());
        }
        query_builder.push(" ORDER BY updated_at DESC");

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_row_to_inventory).collect()
    }

    async fn record_split(
        &self,
        split: PondSplit,
    ) -> Result<(PondSplit, SplitLogEntry), RegistryError> {
        let mut tx = self.pool.begin().await?;
        let now = Timestamp::now();

        sqlx::query(
            r#"
            INSERT INTO pond_splits (id, batch_id, source_pond_id, target_pond_id, occurred_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(split.id.0.to_string())
        .bind(split.batch_id.0.to_string())
        .bind(split.source_pond_id.0.to_string())
        .bind(split.target_pond_id.0.to_string())
        .bind(split.occurred_at.as_second())
        .execute(&mut *tx)
        .await?;

        let entry = SplitLogEntry {
            id: SplitLogId(Ulid::new()),
            split_id: split.id,
            note: format!(
                "Stock moved from pond {} to pond {}",
                split.source_pond_id.0, split.target_pond_id.0
            )
            .into(),
            created_at: now,
        };
        sqlx::query("INSERT INTO split_log (id, split_id, note, created_at) VALUES (?, ?, ?, ?)")
            .bind(entry.id.0.to_string())
            .bind(entry.split_id.0.to_string())
            .bind(&*entry.note)
            .bind(entry.created_at.as_second())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok((split, entry))
    }

    async fn list_splits(&self, pond: Option<PondId>) -> Result<Vec<PondSplit>, RegistryError> {
        let mut query_builder = QueryBuilder::new(
            "SELECT id, batch_id, source_pond_id, target_pond_id, occurred_at FROM pond_splits ",
        );

        if let Some(pond) = pond {
            let pond = pond.0.to_string();
            query_builder
                .push(" WHERE (source_pond_id = ")
                .push_bind(pond.clone())
                .push(" OR target_pond_id = ")
                .push_bind(pond)
                .push(")");
        }
        query_builder.push(" ORDER BY occurred_at DESC");

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_row_to_split).collect()
    }

    async fn split_log(&self, split: SplitId) -> Result<Vec<SplitLogEntry>, RegistryError> {
        let rows = sqlx::query(
            "SELECT id, split_id, note, created_at FROM split_log WHERE split_id = ? ORDER BY created_at",
        )
        .bind(split.0.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_log_entry).collect()
    }
}

const LIFECYCLE_COLUMNS: &str = "SELECT id, batch_id, state, commercialized_at, kilos_sold, \
     price_per_kilo, avg_kilos_per_fish, total_harvest_kilos, fish_commercialized, \
     mortality_rate, created_at, updated_at";

async fn farm_for_pond(
    conn: &mut SqliteConnection,
    pond: PondId,
) -> Result<FarmId, RegistryError> {
    let row = sqlx::query("SELECT farm_id FROM ponds WHERE id = ?")
        .bind(pond.0.to_string())
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| DomainError::not_found("pond", pond.0.to_string()))?;

    Ok(FarmId(parse_ulid(row.try_get("farm_id")?)?))
}

async fn fetch_batch(
    conn: &mut SqliteConnection,
    id: BatchId,
) -> Result<StockingBatch, RegistryError> {
    let row = sqlx::query(
        "SELECT id, species_id, pond_id, quantity, stocked_at, investment FROM stocking_batches WHERE id = ?",
    )
    .bind(id.0.to_string())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DomainError::not_found("stocking batch", id.0.to_string()))?;

    map_row_to_batch(&row)
}

async fn fetch_lifecycle(
    conn: &mut SqliteConnection,
    id: LifecycleId,
) -> Result<StockingLifecycle, RegistryError> {
    let row = sqlx::query(&format!(
        "{LIFECYCLE_COLUMNS} FROM stocking_lifecycles WHERE id = ?"
    ))
    .bind(id.0.to_string())
    .fetch_optional(&mut *conn)
    .await?
    .ok_or_else(|| DomainError::not_found("lifecycle", id.0.to_string()))?;

    map_row_to_lifecycle(&row)
}

async fn insert_lifecycle(
    conn: &mut SqliteConnection,
    lifecycle: &StockingLifecycle,
) -> Result<(), RegistryError> {
    sqlx::query(
        r#"
        INSERT INTO stocking_lifecycles (id, batch_id, state, commercialized_at, kilos_sold,
            price_per_kilo, avg_kilos_per_fish, total_harvest_kilos, fish_commercialized,
            mortality_rate, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(lifecycle.id.0.to_string())
    .bind(lifecycle.batch_id.0.to_string())
    .bind(lifecycle_state_code(lifecycle.state))
    .bind(lifecycle.commercialized_at.map(|t| t.as_second()))
    .bind(lifecycle.kilos_sold)
    .bind(lifecycle.price_per_kilo)
    .bind(lifecycle.avg_kilos_per_fish)
    .bind(lifecycle.total_harvest_kilos)
    .bind(lifecycle.fish_commercialized)
    .bind(lifecycle.mortality_rate)
    .bind(lifecycle.created_at.as_second())
    .bind(lifecycle.updated_at.as_second())
    .execute(conn)
    .await?;

    Ok(())
}

async fn update_lifecycle(
    conn: &mut SqliteConnection,
    lifecycle: &StockingLifecycle,
) -> Result<(), RegistryError> {
    sqlx::query(
        r#"
        UPDATE stocking_lifecycles
        SET state = ?, commercialized_at = ?, kilos_sold = ?, price_per_kilo = ?,
            avg_kilos_per_fish = ?, total_harvest_kilos = ?, fish_commercialized = ?,
            mortality_rate = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(lifecycle_state_code(lifecycle.state))
    .bind(lifecycle.commercialized_at.map(|t| t.as_second()))
    .bind(lifecycle.kilos_sold)
    .bind(lifecycle.price_per_kilo)
    .bind(lifecycle.avg_kilos_per_fish)
    .bind(lifecycle.total_harvest_kilos)
    .bind(lifecycle.fish_commercialized)
    .bind(lifecycle.mortality_rate)
    .bind(lifecycle.updated_at.as_second())
    .bind(lifecycle.id.0.to_string())
    .execute(conn)
    .await?;

    Ok(())
}

async fn fetch_inventory(
    conn: &mut SqliteConnection,
    species: SpeciesId,
    farm: FarmId,
) -> Result<Option<InventoryRecord>, RegistryError> {
    let row = sqlx::query(
        "SELECT id, species_id, farm_id, quantity, updated_at FROM inventory WHERE species_id = ? AND farm_id = ?",
    )
    .bind(species.0.to_string())
    .bind(farm.0.to_string())
    .fetch_optional(&mut *conn)
    .await?;

    row.map(|r| map_row_to_inventory(&r)).transpose()
}

/// Add to the (species, farm) ledger entry, creating it when absent, and
/// return the record as stored.
async fn upsert_add(
    conn: &mut SqliteConnection,
    species: SpeciesId,
    farm: FarmId,
    quantity: i64,
    now: Timestamp,
) -> Result<InventoryRecord, RegistryError> {
    sqlx::query(
        r#"
        INSERT INTO inventory (id, species_id, farm_id, quantity, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT (species_id, farm_id)
        DO UPDATE SET quantity = quantity + excluded.quantity, updated_at = excluded.updated_at
        "#,
    )
    .bind(InventoryId(Ulid::new()).0.to_string())
    .bind(species.0.to_string())
    .bind(farm.0.to_string())
    .bind(quantity)
    .bind(now.as_second())
    .execute(&mut *conn)
    .await?;

    fetch_inventory(conn, species, farm).await?.ok_or_else(|| {
        DomainError::not_found("inventory record", format!("{}/{}", species.0, farm.0)).into()
    })
}

async fn set_inventory_quantity(
    conn: &mut SqliteConnection,
    id: InventoryId,
    quantity: i64,
    now: Timestamp,
) -> Result<(), RegistryError> {
    sqlx::query("UPDATE inventory SET quantity = ?, updated_at = ? WHERE id = ?")
        .bind(quantity)
        .bind(now.as_second())
        .bind(id.0.to_string())
        .execute(conn)
        .await?;

    Ok(())
}

fn map_row_to_batch(r: &sqlx::sqlite::SqliteRow) -> Result<StockingBatch, RegistryError> {
    Ok(StockingBatch {
        id: BatchId(parse_ulid(r.try_get("id")?)?),
        species_id: SpeciesId(parse_ulid(r.try_get("species_id")?)?),
        pond_id: PondId(parse_ulid(r.try_get("pond_id")?)?),
        quantity: r.try_get("quantity")?,
        stocked_at: parse_timestamp(r.try_get("stocked_at")?)?,
        investment: r.try_get("investment")?,
    })
}

fn map_row_to_lifecycle(r: &sqlx::sqlite::SqliteRow) -> Result<StockingLifecycle, RegistryError> {
    Ok(StockingLifecycle {
        id: LifecycleId(parse_ulid(r.try_get("id")?)?),
        batch_id: BatchId(parse_ulid(r.try_get("batch_id")?)?),
        state: lifecycle_state_from_code(r.try_get("state")?)?,
        commercialized_at: r
            .try_get::<Option<i64>, _>("commercialized_at")?
            .map(parse_timestamp)
            .transpose()?,
        kilos_sold: r.try_get("kilos_sold")?,
        price_per_kilo: r.try_get("price_per_kilo")?,
        avg_kilos_per_fish: r.try_get("avg_kilos_per_fish")?,
        total_harvest_kilos: r.try_get("total_harvest_kilos")?,
        fish_commercialized: r.try_get("fish_commercialized")?,
        mortality_rate: r.try_get("mortality_rate")?,
        created_at: parse_timestamp(r.try_get("created_at")?)?,
        updated_at: parse_timestamp(r.try_get("updated_at")?)?,
    })
}

fn map_row_to_inventory(r: &sqlx::sqlite::SqliteRow) -> Result<InventoryRecord, RegistryError> {
    Ok(InventoryRecord {
        id: InventoryId(parse_ulid(r.try_get("id")?)?),
        species_id: SpeciesId(parse_ulid(r.try_get("species_id")?)?),
        farm_id: FarmId(parse_ulid(r.try_get("farm_id")?)?),
        quantity: r.try_get("quantity")?,
        updated_at: parse_timestamp(r.try_get("updated_at")?)?,
    })
}

fn map_row_to_split(r: &sqlx::sqlite::SqliteRow) -> Result<PondSplit, RegistryError> {
    Ok(PondSplit {
        id: SplitId(parse_ulid(r.try_get("id")?)?),
        batch_id: BatchId(parse_ulid(r.try_get("batch_id")?)?),
        source_pond_id: PondId(parse_ulid(r.try_get("source_pond_id")?)?),
        target_pond_id: PondId(parse_ulid(r.try_get("target_pond_id")?)?),
        occurred_at: parse_timestamp(r.try_get("occurred_at")?)?,
    })
}

fn map_row_to_log_entry(r: &sqlx::sqlite::SqliteRow) -> Result<SplitLogEntry, RegistryError> {
    Ok(SplitLogEntry {
        id: SplitLogId(parse_ulid(r.try_get("id")?)?),
        split_id: SplitId(parse_ulid(r.try_get("split_id")?)?),
        note: r.try_get::<String, _>("note")?.into(),
        created_at: parse_timestamp(r.try_get("created_at")?)?,
    })
}

#[cfg(test)]
mod tests {
    use aquafarm_core::{
        BatchId, DomainError, Farm, FarmId, LifecycleState, Pond, PondId, PondSplit, Species,
        SpeciesId, SplitId, StockingBatch, ToleranceBands, User, UserId,
        lifecycle::CommercializeRequest,
    };
    use jiff::Timestamp;
    use sqlx::SqlitePool;
    use ulid::Ulid;

    use crate::registry::sqlite::{
        SqliteCatalogRegistry, SqliteUserRegistry, connect_in_memory,
    };
    use crate::registry::{CatalogRegistry, RegistryError, StockingRegistry, UserRegistry};

    use super::SqliteStockingRegistry;

    struct Farmstead {
        pool: SqlitePool,
        registry: SqliteStockingRegistry,
        farm: FarmId,
        pond: PondId,
        species: SpeciesId,
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
                tolerance: ToleranceBands::default(),
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

        Farmstead {
            registry: SqliteStockingRegistry::with_pool(pool.clone()),
            pool,
            farm,
            pond,
            species,
        }
    }

    fn batch(species: SpeciesId, pond: PondId, quantity: i64) -> StockingBatch {
        StockingBatch {
            id: BatchId(Ulid::new()),
            species_id: species,
            pond_id: pond,
            quantity,
            stocked_at: Timestamp::from_second(1_700_000_000).unwrap(),
            investment: 120.0,
        }
    }

    fn sale() -> CommercializeRequest {
        CommercializeRequest {
            commercialized_at: Some(Timestamp::from_second(1_707_776_000).unwrap()),
            kilos_sold: Some(50.0),
            price_per_kilo: Some(4.0),
            avg_kilos_per_fish: Some(0.5),
            total_harvest_kilos: Some(40.0),
        }
    }

    #[tokio::test]
    async fn batch_creation_seeds_lifecycle_and_inventory() {
        let f = farmstead().await;

        let created = f
            .registry
            .create_batch(batch(f.species, f.pond, 1000))
            .await
            .unwrap();

        assert_eq!(created.lifecycle.state, LifecycleState::Pending);
        assert_eq!(created.lifecycle.batch_id, created.batch.id);
        assert_eq!(created.inventory.quantity, 1000);

        // A second batch of the same species accumulates in the same record.
        let second = f
            .registry
            .create_batch(batch(f.species, f.pond, 500))
            .await
            .unwrap();
        assert_eq!(second.inventory.id, created.inventory.id);
        assert_eq!(second.inventory.quantity, 1500);

        let lifecycles = f.registry.list_lifecycles(None).await.unwrap();
        assert_eq!(lifecycles.len(), 2);
    }

    #[tokio::test]
    async fn batch_creation_rejects_unknown_pond() {
        let f = farmstead().await;

        let err = f
            .registry
            .create_batch(batch(f.species, PondId(Ulid::new()), 100))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Domain(DomainError::NotFound { .. })
        ));
        // Nothing was persisted.
        assert!(f.registry.list_batches(None).await.unwrap().is_empty());
        assert!(
            f.registry
                .get_inventory(f.species, f.farm)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn commercialization_reduces_inventory_and_is_terminal() {
        let f = farmstead().await;
        let created = f
            .registry
            .create_batch(batch(f.species, f.pond, 100))
            .await
            .unwrap();

        let sold = f
            .registry
            .commercialize(created.lifecycle.id, sale())
            .await
            .unwrap();

        assert_eq!(sold.state, LifecycleState::Commercialized);
        assert_eq!(sold.fish_commercialized, Some(80));
        assert_eq!(sold.mortality_rate, Some(20.0));

        let inventory = f
            .registry
            .get_inventory(f.species, f.farm)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inventory.quantity, 20);

        let err = f
            .registry
            .commercialize(created.lifecycle.id, sale())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Domain(DomainError::InvalidStateTransition { .. })
        ));
    }

    #[tokio::test]
    async fn inventory_shortfall_clamps_to_zero_without_blocking_sale() {
        let f = farmstead().await;
        let created = f
            .registry
            .create_batch(batch(f.species, f.pond, 100))
            .await
            .unwrap();

        // Drain most of the ledger out-of-band so the sale overdraws it.
        f.registry
            .reduce_quantity(f.species, f.farm, 60)
            .await
            .unwrap();

        let sold = f
            .registry
            .commercialize(created.lifecycle.id, sale())
            .await
            .unwrap();
        assert_eq!(sold.state, LifecycleState::Commercialized);

        let inventory = f
            .registry
            .get_inventory(f.species, f.farm)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inventory.quantity, 0);
    }

    #[tokio::test]
    async fn direct_reduction_is_strict() {
        let f = farmstead().await;
        f.registry
            .create_batch(batch(f.species, f.pond, 100))
            .await
            .unwrap();

        let err = f
            .registry
            .reduce_quantity(f.species, f.farm, 150)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Domain(DomainError::InsufficientInventory {
                available: 100,
                requested: 150,
            })
        ));

        // The failed reduction left the record untouched.
        let inventory = f
            .registry
            .get_inventory(f.species, f.farm)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inventory.quantity, 100);
    }

    #[tokio::test]
    async fn non_positive_adjustments_are_rejected() {
        let f = farmstead().await;
        f.registry
            .create_batch(batch(f.species, f.pond, 100))
            .await
            .unwrap();

        for quantity in [0, -50] {
            let err = f
                .registry
                .add_quantity(f.species, f.farm, quantity)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                RegistryError::Domain(DomainError::NonPositiveQuantity(_))
            ));

            let err = f
                .registry
                .reduce_quantity(f.species, f.farm, quantity)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                RegistryError::Domain(DomainError::NonPositiveQuantity(_))
            ));
        }

        // The ledger never moved.
        let inventory = f
            .registry
            .get_inventory(f.species, f.farm)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inventory.quantity, 100);
    }

    #[tokio::test]
    async fn cancellation_keeps_inventory() {
        let f = farmstead().await;
        let created = f
            .registry
            .create_batch(batch(f.species, f.pond, 100))
            .await
            .unwrap();

        let cancelled = f.registry.cancel(created.lifecycle.id).await.unwrap();
        assert_eq!(cancelled.state, LifecycleState::Cancelled);

        let inventory = f
            .registry
            .get_inventory(f.species, f.farm)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(inventory.quantity, 100);

        assert!(f.registry.cancel(created.lifecycle.id).await.is_err());
    }

    #[tokio::test]
    async fn split_records_automatic_log_entry() {
        let f = farmstead().await;
        let catalog = SqliteCatalogRegistry::with_pool(f.pool.clone());

        let target = PondId(Ulid::new());
        catalog
            .create_pond(Pond {
                id: target,
                farm_id: f.farm,
                kind: "concrete".into(),
                volume_liters: 20_000,
                capacity_liters: 25_000,
            })
            .await
            .unwrap();

        let created = f
            .registry
            .create_batch(batch(f.species, f.pond, 100))
            .await
            .unwrap();

        let split = PondSplit {
            id: SplitId(Ulid::new()),
            batch_id: created.batch.id,
            source_pond_id: f.pond,
            target_pond_id: target,
            occurred_at: Timestamp::now(),
        };
        let (stored, entry) = f.registry.record_split(split.clone()).await.unwrap();

        assert_eq!(stored.id, split.id);
        assert!(entry.note.contains(&f.pond.0.to_string()));
        assert!(entry.note.contains(&target.0.to_string()));

        let log = f.registry.split_log(split.id).await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].id, entry.id);

        assert_eq!(
            f.registry.list_splits(Some(target)).await.unwrap().len(),
            1
        );
        assert!(
            f.registry
                .list_splits(Some(PondId(Ulid::new())))
                .await
                .unwrap()
                .is_empty()
        );
    }
}
