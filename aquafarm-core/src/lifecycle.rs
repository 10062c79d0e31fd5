//! Stocking lifecycle state machine.
//!
//! A lifecycle starts in `Pending` when its batch is created and moves
//! one-way to `Commercialized` or `Cancelled`. Commercialization derives
//! the fish count and mortality rate from the harvest figures; the caller
//! is responsible for applying the matching inventory reduction.

use jiff::Timestamp;

use crate::{DomainError, LifecycleState, StockingBatch, StockingLifecycle};

/// Inputs for commercializing a pending lifecycle. Date, kilos sold and
/// price per kilo are required; the weight figures are optional and drive
/// the derived fish count when both are present.
#[derive(Debug, Clone, Default)]
pub struct CommercializeRequest {
    pub commercialized_at: Option<Timestamp>,
    pub kilos_sold: Option<f64>,
    pub price_per_kilo: Option<f64>,
    pub avg_kilos_per_fish: Option<f64>,
    pub total_harvest_kilos: Option<f64>,
}

/// Transition a lifecycle to `Commercialized`, computing the derived
/// figures. Returns the updated lifecycle; the stored record and the
/// inventory reduction are the caller's concern.
pub fn commercialize(
    lifecycle: &StockingLifecycle,
    batch: &StockingBatch,
    request: &CommercializeRequest,
    now: Timestamp,
) -> Result<StockingLifecycle, DomainError> {
    if lifecycle.state != LifecycleState::Pending {
        return Err(DomainError::transition(
            lifecycle.state.as_str(),
            LifecycleState::Commercialized.as_str(),
        ));
    }

    let commercialized_at = request
        .commercialized_at
        .ok_or(DomainError::MissingField("commercialized_at"))?;
    let kilos_sold = request
        .kilos_sold
        .ok_or(DomainError::MissingField("kilos_sold"))?;
    let price_per_kilo = request
        .price_per_kilo
        .ok_or(DomainError::MissingField("price_per_kilo"))?;

    let fish_commercialized = derive_fish_count(request);

    // Mortality may come out negative when the harvest-derived count exceeds
    // the initial count. It is recorded as computed, not clamped.
    let mortality_rate = fish_commercialized.map(|fish| {
        if batch.quantity > 0 {
            (batch.quantity - fish) as f64 / batch.quantity as f64 * 100.0
        } else {
            0.0
        }
    });

    Ok(StockingLifecycle {
        state: LifecycleState::Commercialized,
        commercialized_at: Some(commercialized_at),
        kilos_sold,
        price_per_kilo,
        avg_kilos_per_fish: request.avg_kilos_per_fish,
        total_harvest_kilos: request.total_harvest_kilos,
        fish_commercialized,
        mortality_rate,
        updated_at: now,
        ..lifecycle.clone()
    })
}

/// Transition a lifecycle to `Cancelled`. No inventory effect.
pub fn cancel(
    lifecycle: &StockingLifecycle,
    now: Timestamp,
) -> Result<StockingLifecycle, DomainError> {
    if lifecycle.state != LifecycleState::Pending {
        return Err(DomainError::transition(
            lifecycle.state.as_str(),
            LifecycleState::Cancelled.as_str(),
        ));
    }

    Ok(StockingLifecycle {
        state: LifecycleState::Cancelled,
        updated_at: now,
        ..lifecycle.clone()
    })
}

fn derive_fish_count(request: &CommercializeRequest) -> Option<i64> {
    match (request.total_harvest_kilos, request.avg_kilos_per_fish) {
        (Some(total), Some(avg)) if avg > 0.0 => Some((total / avg).floor() as i64),
        _ => None,
    }
}

impl StockingLifecycle {
    /// Total sale revenue.
    pub fn total_revenue(&self) -> f64 {
        self.kilos_sold * self.price_per_kilo
    }

    /// Profitability in percent against the batch investment. Undefined
    /// when the investment is not positive.
    pub fn profitability_pct(&self, investment: f64) -> Option<f64> {
        if investment > 0.0 {
            Some((self.total_revenue() - investment) / investment * 100.0)
        } else {
            None
        }
    }

    /// Survival percentage, the complement of the mortality rate.
    pub fn survival_pct(&self) -> Option<f64> {
        self.mortality_rate.map(|m| 100.0 - m)
    }

    /// Whole days between stocking and commercialization. Undefined until
    /// commercialized.
    pub fn cultivation_days(&self, stocked_at: Timestamp) -> Option<i64> {
        self.commercialized_at
            .map(|sold| (sold.as_second() - stocked_at.as_second()) / 86_400)
    }
}
