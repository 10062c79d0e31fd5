use aquafarm_core::{
    Alert, Farm, GrowthProfile, InventoryRecord, MonitoringReading, NutritionInfo, Pond,
    PondSplit, ReproductionProfile, Sensor, Species, SplitLogEntry, StockingBatch,
    StockingLifecycle, ToleranceBands, User,
};
use serde::{Deserialize, Serialize};

// Auth Request/Response Models
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id.0.to_string(),
            name: user.name.to_string(),
            email: user.email.to_string(),
            created_at: user.created_at.to_string(),
        }
    }
}

// Species Request/Response Models
//
// The reference records (nutrition, growth, reproduction) are carried as the
// domain structures directly; they are stored opaquely and have no
// API-specific shape.
#[derive(Debug, Deserialize)]
pub struct SpeciesCreateRequest {
    pub name: String,
    pub scientific_name: Option<String>,
    #[serde(default)]
    pub tolerance: ToleranceBands,
    pub nutrition: Option<NutritionInfo>,
    pub growth: Option<GrowthProfile>,
    pub reproduction: Option<ReproductionProfile>,
    pub habitat: Option<String>,
    pub diet: Option<String>,
    pub behavior: Option<String>,
    pub stocking_density: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SpeciesResponse {
    pub id: String,
    pub name: String,
    pub scientific_name: Option<String>,
    pub tolerance: ToleranceBands,
    pub nutrition: Option<NutritionInfo>,
    pub growth: Option<GrowthProfile>,
    pub reproduction: Option<ReproductionProfile>,
    pub habitat: Option<String>,
    pub diet: Option<String>,
    pub behavior: Option<String>,
    pub stocking_density: Option<String>,
}

impl From<Species> for SpeciesResponse {
    fn from(species: Species) -> Self {
        Self {
            id: species.id.0.to_string(),
            name: species.name.to_string(),
            scientific_name: species.scientific_name.map(|s| s.to_string()),
            tolerance: species.tolerance,
            nutrition: species.nutrition,
            growth: species.growth,
            reproduction: species.reproduction,
            habitat: species.habitat.map(|s| s.to_string()),
            diet: species.diet.map(|s| s.to_string()),
            behavior: species.behavior.map(|s| s.to_string()),
            stocking_density: species.stocking_density.map(|s| s.to_string()),
        }
    }
}

// Farm Request/Response Models
#[derive(Debug, Deserialize)]
pub struct FarmCreateRequest {
    pub name: String,
    pub method: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct FarmUpdateRequest {
    pub name: Option<String>,
    pub method: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct FarmResponse {
    pub id: String,
    pub name: String,
    pub method: String,
    pub location: String,
    pub owner_id: String,
}

impl From<Farm> for FarmResponse {
    fn from(farm: Farm) -> Self {
        Self {
            id: farm.id.0.to_string(),
            name: farm.name.to_string(),
            method: farm.method.to_string(),
            location: farm.location.to_string(),
            owner_id: farm.owner.0.to_string(),
        }
    }
}

// Pond Request/Response Models
#[derive(Debug, Deserialize)]
pub struct PondCreateRequest {
    pub farm_id: String,
    pub kind: String,
    pub volume_liters: i64,
    pub capacity_liters: i64,
}

#[derive(Debug, Serialize)]
pub struct PondResponse {
    pub id: String,
    pub farm_id: String,
    pub kind: String,
    pub volume_liters: i64,
    pub capacity_liters: i64,
}

impl From<Pond> for PondResponse {
    fn from(pond: Pond) -> Self {
        Self {
            id: pond.id.0.to_string(),
            farm_id: pond.farm_id.0.to_string(),
            kind: pond.kind.to_string(),
            volume_liters: pond.volume_liters,
            capacity_liters: pond.capacity_liters,
        }
    }
}

// Sensor Request/Response Models
#[derive(Debug, Deserialize)]
pub struct SensorCreateRequest {
    pub name: String,
    pub unit: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SensorResponse {
    pub id: String,
    pub name: String,
    pub unit: String,
    pub description: Option<String>,
}

impl From<Sensor> for SensorResponse {
    fn from(sensor: Sensor) -> Self {
        Self {
            id: sensor.id.0.to_string(),
            name: sensor.name.to_string(),
            unit: sensor.unit.to_string(),
            description: sensor.description.map(|s| s.to_string()),
        }
    }
}

// Stocking Request/Response Models
#[derive(Debug, Deserialize)]
pub struct BatchCreateRequest {
    pub species_id: String,
    pub pond_id: String,
    pub quantity: i64,
    /// RFC 3339 timestamp; defaults to now.
    pub stocked_at: Option<String>,
    pub investment: f64,
}

#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub id: String,
    pub species_id: String,
    pub pond_id: String,
    pub quantity: i64,
    pub stocked_at: String,
    pub investment: f64,
}

impl From<StockingBatch> for BatchResponse {
    fn from(batch: StockingBatch) -> Self {
        Self {
            id: batch.id.0.to_string(),
            species_id: batch.species_id.0.to_string(),
            pond_id: batch.pond_id.0.to_string(),
            quantity: batch.quantity,
            stocked_at: batch.stocked_at.to_string(),
            investment: batch.investment,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StockingCreatedResponse {
    pub batch: BatchResponse,
    pub lifecycle: LifecycleResponse,
    pub inventory: InventoryResponse,
}

#[derive(Debug, Serialize)]
pub struct LifecycleResponse {
    pub id: String,
    pub batch_id: String,
    pub state: String,
    pub commercialized_at: Option<String>,
    pub kilos_sold: f64,
    pub price_per_kilo: f64,
    pub avg_kilos_per_fish: Option<f64>,
    pub total_harvest_kilos: Option<f64>,
    pub fish_commercialized: Option<i64>,
    pub mortality_rate: Option<f64>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<StockingLifecycle> for LifecycleResponse {
    fn from(lifecycle: StockingLifecycle) -> Self {
        Self {
            id: lifecycle.id.0.to_string(),
            batch_id: lifecycle.batch_id.0.to_string(),
            state: lifecycle.state.as_str().to_string(),
            commercialized_at: lifecycle.commercialized_at.map(|t| t.to_string()),
            kilos_sold: lifecycle.kilos_sold,
            price_per_kilo: lifecycle.price_per_kilo,
            avg_kilos_per_fish: lifecycle.avg_kilos_per_fish,
            total_harvest_kilos: lifecycle.total_harvest_kilos,
            fish_commercialized: lifecycle.fish_commercialized,
            mortality_rate: lifecycle.mortality_rate,
            created_at: lifecycle.created_at.to_string(),
            updated_at: lifecycle.updated_at.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CommercializeRequestBody {
    /// RFC 3339 timestamp of the sale.
    pub commercialized_at: Option<String>,
    pub kilos_sold: Option<f64>,
    pub price_per_kilo: Option<f64>,
    pub avg_kilos_per_fish: Option<f64>,
    pub total_harvest_kilos: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct LifecycleMetricsResponse {
    pub state: String,
    pub total_revenue: f64,
    pub profitability_pct: Option<f64>,
    pub survival_pct: Option<f64>,
    pub mortality_rate: Option<f64>,
    pub cultivation_days: Option<i64>,
}

// Inventory Request/Response Models
#[derive(Debug, Deserialize)]
pub struct InventoryAdjustRequest {
    pub species_id: String,
    pub farm_id: String,
    pub quantity: i64,
}

#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    pub id: String,
    pub species_id: String,
    pub farm_id: String,
    pub quantity: i64,
    pub updated_at: String,
}

impl From<InventoryRecord> for InventoryResponse {
    fn from(record: InventoryRecord) -> Self {
        Self {
            id: record.id.0.to_string(),
            species_id: record.species_id.0.to_string(),
            farm_id: record.farm_id.0.to_string(),
            quantity: record.quantity,
            updated_at: record.updated_at.to_string(),
        }
    }
}

// Monitoring Request/Response Models
#[derive(Debug, Deserialize)]
pub struct ReadingCreateRequest {
    pub pond_id: String,
    pub sensor_id: String,
    pub value: f64,
    /// RFC 3339 timestamp; defaults to now.
    pub measured_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReadingResponse {
    pub id: String,
    pub pond_id: String,
    pub sensor_id: String,
    pub value: f64,
    pub measured_at: String,
}

impl From<MonitoringReading> for ReadingResponse {
    fn from(reading: MonitoringReading) -> Self {
        Self {
            id: reading.id.0.to_string(),
            pond_id: reading.pond_id.0.to_string(),
            sensor_id: reading.sensor_id.0.to_string(),
            value: reading.value.into_inner(),
            measured_at: reading.measured_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadingRecordedResponse {
    pub reading: ReadingResponse,
    pub alerts: Vec<AlertResponse>,
}

#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub id: String,
    pub reading_id: String,
    pub species_id: String,
    pub category: String,
    pub message: String,
    pub measured: f64,
    pub limit: f64,
    pub state: String,
    pub created_at: String,
    pub resolved_at: Option<String>,
}

impl From<Alert> for AlertResponse {
    fn from(alert: Alert) -> Self {
        Self {
            id: alert.id.0.to_string(),
            reading_id: alert.reading_id.0.to_string(),
            species_id: alert.species_id.0.to_string(),
            category: alert.category.as_str().to_string(),
            message: alert.message.to_string(),
            measured: alert.measured.into_inner(),
            limit: alert.limit.into_inner(),
            state: alert.state.as_str().to_string(),
            created_at: alert.created_at.to_string(),
            resolved_at: alert.resolved_at.map(|t| t.to_string()),
        }
    }
}

// Split Request/Response Models
#[derive(Debug, Deserialize)]
pub struct SplitCreateRequest {
    pub batch_id: String,
    pub source_pond_id: String,
    pub target_pond_id: String,
    /// RFC 3339 timestamp; defaults to now.
    pub occurred_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SplitResponse {
    pub id: String,
    pub batch_id: String,
    pub source_pond_id: String,
    pub target_pond_id: String,
    pub occurred_at: String,
}

impl From<PondSplit> for SplitResponse {
    fn from(split: PondSplit) -> Self {
        Self {
            id: split.id.0.to_string(),
            batch_id: split.batch_id.0.to_string(),
            source_pond_id: split.source_pond_id.0.to_string(),
            target_pond_id: split.target_pond_id.0.to_string(),
            occurred_at: split.occurred_at.to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SplitRecordedResponse {
    pub split: SplitResponse,
    pub log_entry: SplitLogResponse,
}

#[derive(Debug, Serialize)]
pub struct SplitLogResponse {
    pub id: String,
    pub split_id: String,
    pub note: String,
    pub created_at: String,
}

impl From<SplitLogEntry> for SplitLogResponse {
    fn from(entry: SplitLogEntry) -> Self {
        Self {
            id: entry.id.0.to_string(),
            split_id: entry.split_id.0.to_string(),
            note: entry.note.to_string(),
            created_at: entry.created_at.to_string(),
        }
    }
}

// Common Response Models
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub total: usize,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self {
            total: items.len(),
            items,
        }
    }
}

// Query Parameters
#[derive(Debug, Deserialize, Default)]
pub struct FarmListParams {
    pub owner: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct PondListParams {
    pub farm: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct BatchListParams {
    pub pond: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct LifecycleListParams {
    /// PENDING, COMMERCIALIZED or CANCELLED.
    pub state: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct InventoryListParams {
    pub farm: Option<String>,
    pub species: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ReadingListParams {
    /// When true, only the most recent reading of each sensor is returned.
    #[serde(default)]
    pub latest: bool,
}

#[derive(Debug, Deserialize, Default)]
pub struct AlertListParams {
    pub pond: Option<String>,
    /// ACTIVE, RESOLVED or IGNORED.
    pub state: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct SplitListParams {
    pub pond: Option<String>,
}
