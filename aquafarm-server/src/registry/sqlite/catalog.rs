use aquafarm_core::{
    Farm, FarmId, GrowthProfile, NutritionInfo, Pond, PondId, ReproductionProfile, Sensor,
    SensorId, Species, SpeciesId, ToleranceBands, UserId,
};
use async_trait::async_trait;
use ordered_float::NotNan;
use sqlx::{QueryBuilder, Row, SqlitePool};

use crate::registry::{CatalogRegistry, RegistryError};

use super::{not_nan, parse_ulid};


#[derive(Clone)]
pub struct SqliteCatalogRegistry {
    pool: SqlitePool,
}

impl SqliteCatalogRegistry {
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
impl CatalogRegistry for SqliteCatalogRegistry {
    async fn create_species(&self, species: Species) -> Result<(), RegistryError> {
        let nutrition = blob(&species.nutrition)?;
        let growth = blob(&species.growth)?;
        let reproduction = blob(&species.reproduction)?;

        sqlx::query(
            r#"
            INSERT INTO species (id, name, scientific_name, temp_min, temp_max, ph_min, ph_max, oxygen_min,
                                 nutrition, growth, reproduction, habitat, diet, behavior, stocking_density)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(species.id.0.to_string())
        .bind(&*species.name)
        .bind(species.scientific_name.as_deref())
        .bind(species.tolerance.temp_min.map(NotNan::into_inner))
        .bind(species.tolerance.temp_max.map(NotNan::into_inner))
        .bind(species.tolerance.ph_min.map(NotNan::into_inner))
        .bind(species.tolerance.ph_max.map(NotNan::into_inner))
        .bind(species.tolerance.oxygen_min.map(NotNan::into_inner))
        .bind(nutrition)
        .bind(growth)
        .bind(reproduction)
        .bind(species.habitat.as_deref())
        .bind(species.diet.as_deref())
        .bind(species.behavior.as_deref())
        .bind(species.stocking_density.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_species(&self, id: SpeciesId) -> Result<Option<Species>, RegistryError> {
        let row = sqlx::query(
            r#"
            SELECT id, name, scientific_name, temp_min, temp_max, ph_min, ph_max, oxygen_min,
                   nutrition, growth, reproduction, habitat, diet, behavior, stocking_density
            FROM species WHERE id = ?
            "#,
        )
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_row_to_species(&r)).transpose()
    }

    async fn update_species(&self, id: SpeciesId, new: Species) -> Result<(), RegistryError> {
        let nutrition = blob(&new.nutrition)?;
        let growth = blob(&new.growth)?;
        let reproduction = blob(&new.reproduction)?;

        let result = sqlx::query(
            r#"
            UPDATE species
            SET name = ?, scientific_name = ?, temp_min = ?, temp_max = ?, ph_min = ?, ph_max = ?,
                oxygen_min = ?, nutrition = ?, growth = ?, reproduction = ?, habitat = ?, diet = ?,
                behavior = ?, stocking_density = ?
            WHERE id = ?
            "#,
        )
        .bind(&*new.name)
        .bind(new.scientific_name.as_deref())
        .bind(new.tolerance.temp_min.map(NotNan::into_inner))
        .bind(new.tolerance.temp_max.map(NotNan::into_inner))
        .bind(new.tolerance.ph_min.map(NotNan::into_inner))
        .bind(new.tolerance.ph_max.map(NotNan::into_inner))
        .bind(new.tolerance.oxygen_min.map(NotNan::into_inner))
        .bind(nutrition)
        .bind(growth)
        .bind(reproduction)
        .bind(new.habitat.as_deref())
        .bind(new.diet.as_deref())
        .bind(new.behavior.as_deref())
        .bind(new.stocking_density.as_deref())
        .bind(id.0.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(
                aquafarm_core::DomainError::not_found("species", id.0.to_string()).into(),
            );
        }
        Ok(())
    }

    async fn delete_species(&self, id: SpeciesId) -> Result<(), RegistryError> {
        let result = sqlx::query("DELETE FROM species WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(
                aquafarm_core::DomainError::not_found("species", id.0.to_string()).into(),
            );
        }
        Ok(())
    }

    async fn list_species(&self) -> Result<Vec<Species>, RegistryError> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, scientific_name, temp_min, temp_max, ph_min, ph_max, oxygen_min,
                   nutrition, growth, reproduction, habitat, diet, behavior, stocking_density
            FROM species ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_row_to_species).collect()
    }

    async fn create_farm(&self, farm: Farm) -> Result<(), RegistryError> {
        sqlx::query(
            r#"
            INSERT INTO farms (id, name, method, location, owner_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(farm.id.0.to_string())
        .bind(&*farm.name)
        .bind(&*farm.method)
        .bind(&*farm.location)
        .bind(farm.owner.0.to_string())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_farm(&self, id: FarmId) -> Result<Option<Farm>, RegistryError> {
        let row = sqlx::query(
            "SELECT id, name, method, location, owner_id FROM farms WHERE id = ?",
        )
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_row_to_farm(&r)).transpose()
    }

    async fn update_farm(&self, id: FarmId, new: Farm) -> Result<(), RegistryError> {
        let result = sqlx::query(
            "UPDATE farms SET name = ?, method = ?, location = ?, owner_id = ? WHERE id = ?",
        )
        .bind(&*new.name)
        .bind(&*new.method)
        .bind(&*new.location)
        .bind(new.owner.0.to_string())
        .bind(id.0.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(aquafarm_core::DomainError::not_found("farm", id.0.to_string()).into());
        }
        Ok(())
    }

    async fn delete_farm(&self, id: FarmId) -> Result<(), RegistryError> {
        let result = sqlx::query("DELETE FROM farms WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(aquafarm_core::DomainError::not_found("farm", id.0.to_string()).into());
        }
        Ok(())
    }

    async fn list_farms(&self, owner: Option<UserId>) -> Result<Vec<Farm>, RegistryError> {
        let mut query_builder =
            QueryBuilder::new("SELECT id, name, method, location, owner_id FROM farms ");

        if let Some(owner) = owner {
            query_builder
                .push(" WHERE owner_id = ")
                .push_bind(owner.0.to_string());
        }
        query_builder.push(" ORDER BY name");

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_row_to_farm).collect()
    }

    async fn create_pond(&self, pond: Pond) -> Result<(), RegistryError> {
        sqlx::query(
            r#"
            INSERT INTO ponds (id, farm_id, kind, volume_liters, capacity_liters)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(pond.id.0.to_string())
        .bind(pond.farm_id.0.to_string())
        .bind(&*pond.kind)
        .bind(pond.volume_liters)
        .bind(pond.capacity_liters)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_pond(&self, id: PondId) -> Result<Option<Pond>, RegistryError> {
        let row = sqlx::query(
            "SELECT id, farm_id, kind, volume_liters, capacity_liters FROM ponds WHERE id = ?",
        )
        .bind(id.0.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| map_row_to_pond(&r)).transpose()
    }

    async fn delete_pond(&self, id: PondId) -> Result<(), RegistryError> {
        let result = sqlx::query("DELETE FROM ponds WHERE id = ?")
            .bind(id.0.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(aquafarm_core::DomainError::not_found("pond", id.0.to_string()).into());
        }
        Ok(())
    }

    async fn list_ponds(&self, farm: Option<FarmId>) -> Result<Vec<Pond>, RegistryError> {
        let mut query_builder = QueryBuilder::new(
            "SELECT id, farm_id, kind, volume_liters, capacity_liters FROM ponds ",
        );

        if let Some(farm) = farm {
            query_builder
                .push(" WHERE farm_id = ")
                .push_bind(farm.0.to_string());
        }
        query_builder.push(" ORDER BY id");

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(map_row_to_pond).collect()
    }

    async fn create_sensor(&self, sensor: Sensor) -> Result<(), RegistryError> {
        sqlx::query("INSERT INTO sensors (id, name, unit, description) VALUES (?, ?, ?, ?)")
            .bind(sensor.id.0.to_string())
            .bind(&*sensor.name)
            .bind(&*sensor.unit)
            .bind(sensor.description.as_deref())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get_sensor(&self, id: SensorId) -> Result<Option<Sensor>, RegistryError> {
        let row = sqlx::query("SELECT id, name, unit, description FROM sensors WHERE id = ?")
            .bind(id.0.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| map_row_to_sensor(&r)).transpose()
    }

    async fn list_sensors(&self) -> Result<Vec<Sensor>, RegistryError> {
        let rows = sqlx::query("SELECT id, name, unit, description FROM sensors ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(map_row_to_sensor).collect()
    }
}

fn blob<T: serde::Serialize>(value: &Option<T>) -> Result<Option<String>, RegistryError> {
    value
        .as_ref()
        .map(serde_json::to_string)
        .transpose()
        .map_err(Into::into)
}

fn unblob<T: serde::de::DeserializeOwned>(
    value: Option<String>,
) -> Result<Option<T>, RegistryError> {
    value
        .map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(Into::into)
}

fn map_row_to_species(r: &sqlx::sqlite::SqliteRow) -> Result<Species, RegistryError> {
    let id = parse_ulid(r.try_get("id")?)?;

    let tolerance = ToleranceBands {
        temp_min: r.try_get::<Option<f64>, _>("temp_min")?.map(not_nan),
        temp_max: r.try_get::<Option<f64>, _>("temp_max")?.map(not_nan),
        ph_min: r.try_get::<Option<f64>, _>("ph_min")?.map(not_nan),
        ph_max: r.try_get::<Option<f64>, _>("ph_max")?.map(not_nan),
        oxygen_min: r.try_get::<Option<f64>, _>("oxygen_min")?.map(not_nan),
    };

    let nutrition: Option<NutritionInfo> = unblob(r.try_get("nutrition")?)?;
    let growth: Option<GrowthProfile> = unblob(r.try_get("growth")?)?;
    let reproduction: Option<ReproductionProfile> = unblob(r.try_get("reproduction")?)?;

    Ok(Species {
        id: SpeciesId(id),
        name: r.try_get::<String, _>("name")?.into(),
        scientific_name: r
            .try_get::<Option<String>, _>("scientific_name")?
            .map(Into::into),
        tolerance,
        nutrition,
        growth,
        reproduction,
        habitat: r.try_get::<Option<String>, _>("habitat")?.map(Into::into),
        diet: r.try_get::<Option<String>, _>("diet")?.map(Into::into),
        behavior: r.try_get::<Option<String>, _>("behavior")?.map(Into::into),
        stocking_density: r
            .try_get::<Option<String>, _>("stocking_density")?
            .map(Into::into),
    })
}

fn map_row_to_farm(r: &sqlx::sqlite::SqliteRow) -> Result<Farm, RegistryError> {
    Ok(Farm {
        id: FarmId(parse_ulid(r.try_get("id")?)?),
        name: r.try_get::<String, _>("name")?.into(),
        method: r.try_get::<String, _>("method")?.into(),
        location: r.try_get::<String, _>("location")?.into(),
        owner: UserId(parse_ulid(r.try_get("owner_id")?)?),
    })
}

fn map_row_to_pond(r: &sqlx::sqlite::SqliteRow) -> Result<Pond, RegistryError> {
    Ok(Pond {
        id: PondId(parse_ulid(r.try_get("id")?)?),
        farm_id: FarmId(parse_ulid(r.try_get("farm_id")?)?),
        kind: r.try_get::<String, _>("kind")?.into(),
        volume_liters: r.try_get("volume_liters")?,
        capacity_liters: r.try_get("capacity_liters")?,
    })
}

fn map_row_to_sensor(r: &sqlx::sqlite::SqliteRow) -> Result<Sensor, RegistryError> {
    Ok(Sensor {
        id: SensorId(parse_ulid(r.try_get("id")?)?),
        name: r.try_get::<String, _>("name")?.into(),
        unit: r.try_get::<String, _>("unit")?.into(),
        description: r
            .try_get::<Option<String>, _>("description")?
            .map(Into::into),
    })
}

#[cfg(test)]
mod tests {
    use aquafarm_core::{
        Farm, FarmId, GrowthProfile, Nutrient, NutritionInfo, Pond, PondId, Sensor, SensorId,
        Species, SpeciesId, ToleranceBands, User, UserId,
    };
    use jiff::Timestamp;
    use ordered_float::NotNan;
    use ulid::Ulid;

    use crate::registry::{CatalogRegistry, RegistryError, UserRegistry};
    use crate::registry::sqlite::{SqliteUserRegistry, connect_in_memory};

    use super::SqliteCatalogRegistry;

    fn nn(v: f64) -> Option<NotNan<f64>> {
        Some(NotNan::new(v).unwrap())
    }

    fn tilapia(id: SpeciesId) -> Species {
        Species {
            id,
            name: "Tilapia".into(),
            scientific_name: Some("Oreochromis niloticus".into()),
            tolerance: ToleranceBands {
                temp_min: nn(22.0),
                temp_max: nn(30.0),
                ph_min: nn(6.5),
                ph_max: nn(8.5),
                oxygen_min: nn(4.0),
            },
            nutrition: Some(NutritionInfo {
                proteins: "26g".into(),
                fats: "3g".into(),
                calories: "128kcal".into(),
                carbohydrates: None,
                fiber: None,
                sodium: Some("56mg".into()),
                vitamins: Box::new([Nutrient {
                    name: "B12".into(),
                    amount: "1.6µg".into(),
                }]),
                minerals: Box::new([]),
            }),
            growth: Some(GrowthProfile {
                description: "Fast grower in warm water".into(),
                monthly_growth: "80g".into(),
                time_to_max_weight: Some("8 months".into()),
                max_weight: None,
            }),
            reproduction: None,
            habitat: Some("Freshwater ponds".into()),
            diet: Some("Omnivorous".into()),
            behavior: None,
            stocking_density: Some("5/m3".into()),
        }
    }

    async fn seed_owner(pool: &sqlx::SqlitePool) -> UserId {
        let users = SqliteUserRegistry::with_pool(pool.clone());
        let id = UserId(Ulid::new());
        users
            .create_user(User {
                id,
                name: "Owner".into(),
                email: format!("owner-{}@example.com", id.0).into(),
                password_hash: "hash".into(),
                created_at: Timestamp::now(),
            })
            .await
            .unwrap();
        id
    }

    #[tokio::test]
    async fn species_roundtrip_with_reference_records() {
        let registry = SqliteCatalogRegistry::new_in_memory().await.unwrap();
        let id = SpeciesId(Ulid::new());

        registry.create_species(tilapia(id)).await.unwrap();

        let fetched = registry.get_species(id).await.unwrap().unwrap();
        assert_eq!(&*fetched.name, "Tilapia");
        assert_eq!(fetched.tolerance.temp_max, nn(30.0));
        let nutrition = fetched.nutrition.unwrap();
        assert_eq!(&*nutrition.vitamins[0].name, "B12");
        assert!(fetched.reproduction.is_none());
    }

    #[tokio::test]
    async fn species_update_and_delete() {
        let registry = SqliteCatalogRegistry::new_in_memory().await.unwrap();
        let id = SpeciesId(Ulid::new());
        registry.create_species(tilapia(id)).await.unwrap();

        let mut updated = tilapia(id);
        updated.tolerance.temp_max = nn(32.0);
        registry.update_species(id, updated).await.unwrap();

        let fetched = registry.get_species(id).await.unwrap().unwrap();
        assert_eq!(fetched.tolerance.temp_max, nn(32.0));

        registry.delete_species(id).await.unwrap();
        assert!(registry.get_species(id).await.unwrap().is_none());

        let err = registry.delete_species(id).await.unwrap_err();
        assert!(matches!(err, RegistryError::Domain(_)));
    }

    #[tokio::test]
    async fn farms_filtered_by_owner() {
        let pool = connect_in_memory().await.unwrap();
        let registry = SqliteCatalogRegistry::with_pool(pool.clone());
        let alice = seed_owner(&pool).await;
        let bob = seed_owner(&pool).await;

        for (name, owner) in [("La Esperanza", alice), ("El Roble", bob)] {
            registry
                .create_farm(Farm {
                    id: FarmId(Ulid::new()),
                    name: name.into(),
                    method: "extensive ponds".into(),
                    location: "Valle".into(),
                    owner,
                })
                .await
                .unwrap();
        }

        assert_eq!(registry.list_farms(None).await.unwrap().len(), 2);
        let mine = registry.list_farms(Some(alice)).await.unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(&*mine[0].name, "La Esperanza");
    }

    #[tokio::test]
    async fn ponds_listed_per_farm() {
        let pool = connect_in_memory().await.unwrap();
        let registry = SqliteCatalogRegistry::with_pool(pool.clone());
        let owner = seed_owner(&pool).await;

        let farm = FarmId(Ulid::new());
        registry
            .create_farm(Farm {
                id: farm,
                name: "La Esperanza".into(),
                method: "extensive ponds".into(),
                location: "Valle".into(),
                owner,
            })
            .await
            .unwrap();

        for _ in 0..3 {
            registry
                .create_pond(Pond {
                    id: PondId(Ulid::new()),
                    farm_id: farm,
                    kind: "earthen".into(),
                    volume_liters: 50_000,
                    capacity_liters: 60_000,
                })
                .await
                .unwrap();
        }

        let ponds = registry.list_ponds(Some(farm)).await.unwrap();
        assert_eq!(ponds.len(), 3);
        assert!(ponds.iter().all(|p| p.farm_id == farm));
    }

    #[tokio::test]
    async fn sensor_roundtrip() {
        let registry = SqliteCatalogRegistry::new_in_memory().await.unwrap();
        let id = SensorId(Ulid::new());

        registry
            .create_sensor(Sensor {
                id,
                name: "Temperatura".into(),
                unit: "°C".into(),
                description: None,
            })
            .await
            .unwrap();

        let fetched = registry.get_sensor(id).await.unwrap().unwrap();
        assert_eq!(&*fetched.unit, "°C");
        assert_eq!(registry.list_sensors().await.unwrap().len(), 1);
    }
}
