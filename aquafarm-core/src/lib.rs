pub mod alert;
pub mod error;
pub mod lifecycle;

pub use error::DomainError;

use jiff::Timestamp;
use ordered_float::NotNan;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

// We use `Box<str>` and `Box<[T]>` for structures that don't need to be
// dynamically sized. This helps us keep allocations compact and avoid
// accidental cloning of large values.
type BoxStr = Box<str>;
type BoxList<T> = Box<[T]>;

/// Unique identifier for a registered user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub Ulid);

/// Unique identifier for a farm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FarmId(pub Ulid);

/// Unique identifier for a pond.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PondId(pub Ulid);

/// Unique identifier for a species.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpeciesId(pub Ulid);

/// Unique identifier for a stocking batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchId(pub Ulid);

/// Unique identifier for a stocking lifecycle record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LifecycleId(pub Ulid);

/// Unique identifier for an inventory record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InventoryId(pub Ulid);

/// Unique identifier for a sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SensorId(pub Ulid);

/// Unique identifier for a monitoring reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadingId(pub Ulid);

/// Unique identifier for an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AlertId(pub Ulid);

/// Unique identifier for a pond split event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitId(pub Ulid);

/// Unique identifier for a split audit-log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SplitLogId(pub Ulid);

/// A registered user account. Passwords are stored as bcrypt hashes only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: BoxStr,
    pub email: BoxStr,
    pub password_hash: BoxStr,
    pub created_at: Timestamp,
}

/// A farm operated by a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Farm {
    /// Stable identity of this farm.
    pub id: FarmId,
    pub name: BoxStr,
    /// Aquaculture method practiced on the farm (e.g. "extensive ponds").
    pub method: BoxStr,
    pub location: BoxStr,
    /// Owning user account.
    pub owner: UserId,
}

/// A pond belonging to exactly one farm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pond {
    pub id: PondId,
    pub farm_id: FarmId,
    /// Pond construction kind (e.g. "earthen", "concrete").
    pub kind: BoxStr,
    /// Current water volume in liters.
    pub volume_liters: i64,
    /// Maximum capacity in liters.
    pub capacity_liters: i64,
}

/// Species-specific acceptable ranges for environmental parameters.
///
/// Temperature and pH are bands; dissolved oxygen only has a lower bound.
/// Absent bounds are never evaluated.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ToleranceBands {
    pub temp_min: Option<NotNan<f64>>,
    pub temp_max: Option<NotNan<f64>>,
    pub ph_min: Option<NotNan<f64>>,
    pub ph_max: Option<NotNan<f64>>,
    pub oxygen_min: Option<NotNan<f64>>,
}

/// A named nutrient entry (vitamin or mineral) with its amount.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nutrient {
    pub name: BoxStr,
    pub amount: BoxStr,
}

/// Nutritional reference data for a species. Pure reference, no logic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionInfo {
    pub proteins: BoxStr,
    pub fats: BoxStr,
    pub calories: BoxStr,
    pub carbohydrates: Option<BoxStr>,
    pub fiber: Option<BoxStr>,
    pub sodium: Option<BoxStr>,
    pub vitamins: BoxList<Nutrient>,
    pub minerals: BoxList<Nutrient>,
}

/// Growth reference data for a species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrowthProfile {
    pub description: BoxStr,
    pub monthly_growth: BoxStr,
    pub time_to_max_weight: Option<BoxStr>,
    pub max_weight: Option<BoxStr>,
}

/// Reproduction reference data for a species.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReproductionProfile {
    pub frequency: BoxStr,
    pub eggs_per_spawn: BoxStr,
    pub incubation_period: BoxStr,
    pub maturity_age: Option<BoxStr>,
    pub method: Option<BoxStr>,
}

/// A cultivated species with its tolerance bands and reference records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    pub id: SpeciesId,
    pub name: BoxStr,
    pub scientific_name: Option<BoxStr>,
    pub tolerance: ToleranceBands,
    pub nutrition: Option<NutritionInfo>,
    pub growth: Option<GrowthProfile>,
    pub reproduction: Option<ReproductionProfile>,
    pub habitat: Option<BoxStr>,
    pub diet: Option<BoxStr>,
    pub behavior: Option<BoxStr>,
    pub stocking_density: Option<BoxStr>,
}

/// A discrete event of introducing a counted quantity of one species into
/// one pond on one date. Immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockingBatch {
    pub id: BatchId,
    pub species_id: SpeciesId,
    pub pond_id: PondId,
    /// Number of fish introduced.
    pub quantity: i64,
    pub stocked_at: Timestamp,
    /// Monetary investment for this batch.
    pub investment: f64,
}

/// Lifecycle state of a stocking batch.
///
/// `Pending` is the only non-terminal state; there is no transition out of
/// `Commercialized` or `Cancelled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Pending,
    Commercialized,
    Cancelled,
}

impl LifecycleState {
    pub fn as_str(self) -> &'static str {
        match self {
            LifecycleState::Pending => "PENDING",
            LifecycleState::Commercialized => "COMMERCIALIZED",
            LifecycleState::Cancelled => "CANCELLED",
        }
    }
}

/// Tracks a stocking batch from active growth through sale or cancellation.
///
/// Created automatically in `Pending` when its batch is created; never
/// instantiated independently by a client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockingLifecycle {
    pub id: LifecycleId,
    pub batch_id: BatchId,
    pub state: LifecycleState,
    pub commercialized_at: Option<Timestamp>,
    pub kilos_sold: f64,
    pub price_per_kilo: f64,
    /// Average weight per fish at sale time, in kilos.
    pub avg_kilos_per_fish: Option<f64>,
    /// Total harvested kilos.
    pub total_harvest_kilos: Option<f64>,
    /// Number of fish at commercialization, computed from harvest weight.
    pub fish_commercialized: Option<i64>,
    /// Mortality rate in percent. May be negative when the computed fish
    /// count exceeds the initial count; that is preserved, not clamped.
    pub mortality_rate: Option<f64>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The running per-species-per-farm count of live stock, derived from
/// stocking and commercialization events.
///
/// At most one record exists per (species, farm) pair. The count never goes
/// negative; mutations happen only through ledger add/reduce operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryRecord {
    pub id: InventoryId,
    pub species_id: SpeciesId,
    pub farm_id: FarmId,
    pub quantity: i64,
    pub updated_at: Timestamp,
}

impl InventoryRecord {
    /// Quantity after reducing by `requested`, or `InsufficientInventory`
    /// when the reduction would take the count below zero.
    pub fn checked_reduce(&self, requested: i64) -> Result<i64, DomainError> {
        if requested > self.quantity {
            return Err(DomainError::InsufficientInventory {
                available: self.quantity,
                requested,
            });
        }
        Ok(self.quantity - requested)
    }
}

/// A physical sensor installed at the farm. Readings reference it; the
/// alert engine classifies it by name and unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sensor {
    pub id: SensorId,
    pub name: BoxStr,
    /// Measurement unit string, e.g. "°C", "mg/L".
    pub unit: BoxStr,
    pub description: Option<BoxStr>,
}

/// A single measurement taken in a pond by a sensor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringReading {
    pub id: ReadingId,
    pub pond_id: PondId,
    pub sensor_id: SensorId,
    pub value: NotNan<f64>,
    pub measured_at: Timestamp,
}

/// Category of a threshold alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertCategory {
    Temperature,
    Ph,
    Oxygen,
    Other,
}

impl AlertCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertCategory::Temperature => "TEMPERATURE",
            AlertCategory::Ph => "PH",
            AlertCategory::Oxygen => "OXYGEN",
            AlertCategory::Other => "OTHER",
        }
    }
}

/// Alert state. `Active` is the only non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertState {
    Active,
    Resolved,
    Ignored,
}

impl AlertState {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertState::Active => "ACTIVE",
            AlertState::Resolved => "RESOLVED",
            AlertState::Ignored => "IGNORED",
        }
    }
}

/// An alert raised when a monitoring reading breaches a species tolerance
/// band. Owned by the triggering reading, independently resolvable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub reading_id: ReadingId,
    pub species_id: SpeciesId,
    pub category: AlertCategory,
    pub message: BoxStr,
    /// Value that caused the alert.
    pub measured: NotNan<f64>,
    /// Tolerance bound that was violated.
    pub limit: NotNan<f64>,
    pub state: AlertState,
    pub created_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
}

/// A transfer of a stocking batch's stock from one pond to another.
/// Logged as an event; carries no derived-state logic beyond its audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PondSplit {
    pub id: SplitId,
    pub batch_id: BatchId,
    pub source_pond_id: PondId,
    pub target_pond_id: PondId,
    pub occurred_at: Timestamp,
}

/// Audit-log entry created automatically when a split is recorded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitLogEntry {
    pub id: SplitLogId,
    pub split_id: SplitId,
    pub note: BoxStr,
    pub created_at: Timestamp,
}
