pub mod sqlite;

use aquafarm_core::{
    Alert, AlertId, AlertState, BatchId, Farm, FarmId, InventoryRecord, LifecycleId,
    LifecycleState, MonitoringReading, Pond, PondId, PondSplit, ReadingId, Sensor, SensorId,
    Species, SpeciesId, SplitId, SplitLogEntry, StockingBatch, StockingLifecycle, User, UserId,
    lifecycle::CommercializeRequest,
};
use async_trait::async_trait;

/// Storage-layer failures. Domain rejections pass through transparently so
/// the API layer can map them to status codes.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Domain(#[from] aquafarm_core::DomainError),
    #[error("sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(i64),
    #[error("invalid state value: {0}")]
    InvalidState(i64),
    #[error("invalid category value: {0}")]
    InvalidCategory(i64),
    #[error("invalid reference blob: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

/// Everything persisted by a stocking-batch creation: the batch itself, its
/// freshly seeded pending lifecycle and the inventory record after the
/// ledger addition.
#[derive(Debug, Clone)]
pub struct StockingCreated {
    pub batch: StockingBatch,
    pub lifecycle: StockingLifecycle,
    pub inventory: InventoryRecord,
}

/// Reference-data CRUD: species, farms, ponds, sensors.
#[async_trait]
pub trait CatalogRegistry: Clone + Send + Sync + 'static {
    async fn create_species(&self, species: Species) -> Result<(), RegistryError>;
    async fn get_species(&self, id: SpeciesId) -> Result<Option<Species>, RegistryError>;
    async fn update_species(&self, id: SpeciesId, new: Species) -> Result<(), RegistryError>;
    async fn delete_species(&self, id: SpeciesId) -> Result<(), RegistryError>;
    async fn list_species(&self) -> Result<Vec<Species>, RegistryError>;

    async fn create_farm(&self, farm: Farm) -> Result<(), RegistryError>;
    async fn get_farm(&self, id: FarmId) -> Result<Option<Farm>, RegistryError>;
    async fn update_farm(&self, id: FarmId, new: Farm) -> Result<(), RegistryError>;
    async fn delete_farm(&self, id: FarmId) -> Result<(), RegistryError>;
    async fn list_farms(&self, owner: Option<UserId>) -> Result<Vec<Farm>, RegistryError>;

    async fn create_pond(&self, pond: Pond) -> Result<(), RegistryError>;
    async fn get_pond(&self, id: PondId) -> Result<Option<Pond>, RegistryError>;
    async fn delete_pond(&self, id: PondId) -> Result<(), RegistryError>;
    async fn list_ponds(&self, farm: Option<FarmId>) -> Result<Vec<Pond>, RegistryError>;

    async fn create_sensor(&self, sensor: Sensor) -> Result<(), RegistryError>;
    async fn get_sensor(&self, id: SensorId) -> Result<Option<Sensor>, RegistryError>;
    async fn list_sensors(&self) -> Result<Vec<Sensor>, RegistryError>;
}

/// Stocking batches, their lifecycles, the inventory ledger and pond splits.
///
/// Every multi-step operation here runs inside a single transaction: a batch
/// creation seeds its lifecycle and feeds the ledger atomically, and a
/// commercialization persists the state change together with its ledger
/// reduction.
#[async_trait]
pub trait StockingRegistry: Clone + Send + Sync + 'static {
    /// Persist a new batch, seed its `Pending` lifecycle and add the batch
    /// quantity to the (species, farm) inventory, creating the record at
    /// zero first when absent.
    async fn create_batch(&self, batch: StockingBatch) -> Result<StockingCreated, RegistryError>;
    async fn get_batch(&self, id: BatchId) -> Result<Option<StockingBatch>, RegistryError>;
    async fn list_batches(&self, pond: Option<PondId>)
    -> Result<Vec<StockingBatch>, RegistryError>;

    async fn get_lifecycle(
        &self,
        id: LifecycleId,
    ) -> Result<Option<StockingLifecycle>, RegistryError>;
    async fn lifecycle_for_batch(
        &self,
        batch: BatchId,
    ) -> Result<Option<StockingLifecycle>, RegistryError>;
    async fn list_lifecycles(
        &self,
        state: Option<LifecycleState>,
    ) -> Result<Vec<StockingLifecycle>, RegistryError>;

    /// Commercialize a pending lifecycle and reduce the inventory by the
    /// computed fish count. A shortfall clamps the inventory to zero rather
    /// than failing the sale; a missing record is created at zero.
    async fn commercialize(
        &self,
        id: LifecycleId,
        request: CommercializeRequest,
    ) -> Result<StockingLifecycle, RegistryError>;
    async fn cancel(&self, id: LifecycleId) -> Result<StockingLifecycle, RegistryError>;

    /// Ledger addition. Creates the inventory record at zero when absent.
    /// Rejects a zero or negative `quantity` with `NonPositiveQuantity`.
    async fn add_quantity(
        &self,
        species: SpeciesId,
        farm: FarmId,
        quantity: i64,
    ) -> Result<InventoryRecord, RegistryError>;
    /// Ledger reduction. Rejects a zero or negative `quantity` with
    /// `NonPositiveQuantity`, and with `InsufficientInventory` when the
    /// count would go negative; no mutation happens in either case.
    async fn reduce_quantity(
        &self,
        species: SpeciesId,
        farm: FarmId,
        quantity: i64,
    ) -> Result<InventoryRecord, RegistryError>;
    async fn get_inventory(
        &self,
        species: SpeciesId,
        farm: FarmId,
    ) -> Result<Option<InventoryRecord>, RegistryError>;
    async fn list_inventory(
        &self,
        farm: Option<FarmId>,
        species: Option<SpeciesId>,
    ) -> Result<Vec<InventoryRecord>, RegistryError>;

    /// Record a split and its automatic audit-log entry in one transaction.
    async fn record_split(
        &self,
        split: PondSplit,
    ) -> Result<(PondSplit, SplitLogEntry), RegistryError>;
    async fn list_splits(&self, pond: Option<PondId>) -> Result<Vec<PondSplit>, RegistryError>;
    async fn split_log(&self, split: SplitId) -> Result<Vec<SplitLogEntry>, RegistryError>;
}

/// Monitoring readings and the alerts they raise.
#[async_trait]
pub trait MonitoringRegistry: Clone + Send + Sync + 'static {
    /// Persist a reading and evaluate it against every species with a
    /// pending batch in the pond, emitting at most one active alert per
    /// species, all inside the reading's transaction. Returns the raised
    /// alerts.
    async fn record_reading(
        &self,
        reading: MonitoringReading,
    ) -> Result<(MonitoringReading, Vec<Alert>), RegistryError>;
    async fn get_reading(
        &self,
        id: ReadingId,
    ) -> Result<Option<MonitoringReading>, RegistryError>;
    /// Readings for a pond, newest first. With `latest_per_sensor` only the
    /// most recent reading of each sensor is returned.
    async fn list_readings(
        &self,
        pond: PondId,
        latest_per_sensor: bool,
    ) -> Result<Vec<MonitoringReading>, RegistryError>;

    async fn get_alert(&self, id: AlertId) -> Result<Option<Alert>, RegistryError>;
    async fn list_alerts(
        &self,
        pond: Option<PondId>,
        state: Option<AlertState>,
    ) -> Result<Vec<Alert>, RegistryError>;
    async fn resolve_alert(&self, id: AlertId) -> Result<Alert, RegistryError>;
    async fn ignore_alert(&self, id: AlertId) -> Result<Alert, RegistryError>;
}

/// User accounts for token issuance.
#[async_trait]
pub trait UserRegistry: Clone + Send + Sync + 'static {
    /// Rejects with `DuplicateKey` when the email is already registered.
    async fn create_user(&self, user: User) -> Result<(), RegistryError>;
    async fn get_user(&self, id: UserId) -> Result<Option<User>, RegistryError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RegistryError>;
}
