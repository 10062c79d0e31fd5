//! Threshold alert evaluation.
//!
//! A reading is evaluated once per distinct species with active stock in the
//! pond. The sensor is classified into a kind first; unrecognized sensors
//! never alert. Each evaluation yields at most one breach, min bound first.

use jiff::Timestamp;
use ordered_float::NotNan;

use crate::{Alert, AlertCategory, AlertState, DomainError, ToleranceBands};

/// Recognized sensor kinds. Classification is a pure mapping from the
/// sensor's name and unit strings; anything else is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorKind {
    Temperature,
    Ph,
    Oxygen,
    Unknown,
}

/// Which side of the tolerance band was violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachKind {
    BelowMinimum,
    AboveMaximum,
}

/// A single tolerance-band violation for one (reading, species) pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Breach {
    pub category: AlertCategory,
    pub kind: BreachKind,
    pub limit: NotNan<f64>,
}

/// Classify a sensor by its name and unit. Accepts the spellings found in
/// field deployments, including the Spanish ones the data originates from.
pub fn classify(name: &str, unit: &str) -> SensorKind {
    let name = name.to_lowercase();
    let unit = unit.to_lowercase();

    match name.as_str() {
        "temperatura" | "temp" | "temperature"
            if matches!(unit.as_str(), "°c" | "celsius" | "c") =>
        {
            SensorKind::Temperature
        }
        "ph" => SensorKind::Ph,
        "oxigeno" | "oxígeno" | "o2" | "oxygen" if matches!(unit.as_str(), "mg/l" | "ppm") => {
            SensorKind::Oxygen
        }
        _ => SensorKind::Unknown,
    }
}

/// Evaluate a reading value against a species' tolerance bands.
///
/// Returns at most one breach: the minimum bound is checked before the
/// maximum, and oxygen only has a minimum. Absent bounds are skipped.
pub fn evaluate(kind: SensorKind, value: NotNan<f64>, bands: &ToleranceBands) -> Option<Breach> {
    let band = |category, min: Option<NotNan<f64>>, max: Option<NotNan<f64>>| {
        if let Some(min) = min
            && value < min
        {
            return Some(Breach {
                category,
                kind: BreachKind::BelowMinimum,
                limit: min,
            });
        }
        if let Some(max) = max
            && value > max
        {
            return Some(Breach {
                category,
                kind: BreachKind::AboveMaximum,
                limit: max,
            });
        }
        None
    };

    match kind {
        SensorKind::Temperature => band(AlertCategory::Temperature, bands.temp_min, bands.temp_max),
        SensorKind::Ph => band(AlertCategory::Ph, bands.ph_min, bands.ph_max),
        SensorKind::Oxygen => band(AlertCategory::Oxygen, bands.oxygen_min, None),
        SensorKind::Unknown => None,
    }
}

/// Human-readable alert message embedding the species name, the measured
/// value and the violated limit.
pub fn breach_message(species_name: &str, value: NotNan<f64>, breach: &Breach) -> String {
    match (breach.category, breach.kind) {
        (AlertCategory::Temperature, BreachKind::BelowMinimum) => format!(
            "Low temperature detected: {value}°C. Minimum recommended for {species_name}: {}°C",
            breach.limit
        ),
        (AlertCategory::Temperature, BreachKind::AboveMaximum) => format!(
            "High temperature detected: {value}°C. Maximum recommended for {species_name}: {}°C",
            breach.limit
        ),
        (AlertCategory::Ph, BreachKind::BelowMinimum) => format!(
            "Low pH detected: {value}. Minimum recommended for {species_name}: {}",
            breach.limit
        ),
        (AlertCategory::Ph, BreachKind::AboveMaximum) => format!(
            "High pH detected: {value}. Maximum recommended for {species_name}: {}",
            breach.limit
        ),
        (AlertCategory::Oxygen, _) => format!(
            "Low dissolved oxygen detected: {value} mg/L. Minimum recommended for {species_name}: {} mg/L",
            breach.limit
        ),
        (AlertCategory::Other, _) => format!(
            "Out-of-range value detected for {species_name}: {value} (limit {})",
            breach.limit
        ),
    }
}

/// Mark an alert resolved. Only `Active` alerts can be resolved; a second
/// call is a rejected transition, not a silent re-stamp.
pub fn resolve(alert: &Alert, now: Timestamp) -> Result<Alert, DomainError> {
    close(alert, AlertState::Resolved, now)
}

/// Mark an alert ignored. Same transition rules as [`resolve`].
pub fn ignore(alert: &Alert, now: Timestamp) -> Result<Alert, DomainError> {
    close(alert, AlertState::Ignored, now)
}

fn close(alert: &Alert, target: AlertState, now: Timestamp) -> Result<Alert, DomainError> {
    if alert.state != AlertState::Active {
        return Err(DomainError::transition(
            alert.state.as_str(),
            target.as_str(),
        ));
    }

    Ok(Alert {
        state: target,
        resolved_at: Some(now),
        ..alert.clone()
    })
}

#[cfg(test)]
mod tests {
    use jiff::Timestamp;
    use ordered_float::NotNan;
    use ulid::Ulid;

    use super::{BreachKind, SensorKind, classify, evaluate, ignore, resolve};
    use crate::{
        Alert, AlertCategory, AlertId, AlertState, DomainError, ReadingId, SpeciesId,
        ToleranceBands,
    };

    fn nn(v: f64) -> NotNan<f64> {
        NotNan::new(v).unwrap()
    }

    fn tilapia_bands() -> ToleranceBands {
        ToleranceBands {
            temp_min: Some(nn(22.0)),
            temp_max: Some(nn(30.0)),
            ph_min: Some(nn(6.5)),
            ph_max: Some(nn(8.5)),
            oxygen_min: Some(nn(4.0)),
        }
    }

    #[test]
    fn classify_recognized_sensors() {
        assert_eq!(classify("Temperatura", "°C"), SensorKind::Temperature);
        assert_eq!(classify("temp", "celsius"), SensorKind::Temperature);
        assert_eq!(classify("temperature", "C"), SensorKind::Temperature);
        assert_eq!(classify("pH", "unitless"), SensorKind::Ph);
        assert_eq!(classify("Oxigeno", "mg/L"), SensorKind::Oxygen);
        assert_eq!(classify("O2", "ppm"), SensorKind::Oxygen);
    }

    #[test]
    fn classify_unrecognized_sensors() {
        assert_eq!(classify("salinity", "ppt"), SensorKind::Unknown);
        // Right name, wrong unit.
        assert_eq!(classify("temperatura", "F"), SensorKind::Unknown);
        assert_eq!(classify("oxigeno", "%"), SensorKind::Unknown);
    }

    #[test]
    fn temperature_above_maximum() {
        let breach = evaluate(SensorKind::Temperature, nn(35.0), &tilapia_bands()).unwrap();
        assert_eq!(breach.category, AlertCategory::Temperature);
        assert_eq!(breach.kind, BreachKind::AboveMaximum);
        assert_eq!(breach.limit, nn(30.0));
    }

    #[test]
    fn temperature_below_minimum_takes_precedence() {
        // Degenerate band where min > max: the min check fires first.
        let bands = ToleranceBands {
            temp_min: Some(nn(20.0)),
            temp_max: Some(nn(10.0)),
            ..ToleranceBands::default()
        };
        let breach = evaluate(SensorKind::Temperature, nn(15.0), &bands).unwrap();
        assert_eq!(breach.kind, BreachKind::BelowMinimum);
    }

    #[test]
    fn value_inside_band_is_quiet() {
        assert_eq!(
            evaluate(SensorKind::Temperature, nn(26.0), &tilapia_bands()),
            None
        );
        assert_eq!(evaluate(SensorKind::Ph, nn(7.0), &tilapia_bands()), None);
        assert_eq!(
            evaluate(SensorKind::Oxygen, nn(6.0), &tilapia_bands()),
            None
        );
    }

    #[test]
    fn oxygen_has_no_upper_bound() {
        assert_eq!(
            evaluate(SensorKind::Oxygen, nn(400.0), &tilapia_bands()),
            None
        );
        let breach = evaluate(SensorKind::Oxygen, nn(2.5), &tilapia_bands()).unwrap();
        assert_eq!(breach.category, AlertCategory::Oxygen);
        assert_eq!(breach.limit, nn(4.0));
    }

    #[test]
    fn absent_bounds_are_skipped() {
        let bands = ToleranceBands::default();
        assert_eq!(evaluate(SensorKind::Temperature, nn(90.0), &bands), None);
        assert_eq!(evaluate(SensorKind::Ph, nn(1.0), &bands), None);
        assert_eq!(evaluate(SensorKind::Oxygen, nn(0.0), &bands), None);
    }

    #[test]
    fn unknown_kind_never_alerts() {
        assert_eq!(
            evaluate(SensorKind::Unknown, nn(9999.0), &tilapia_bands()),
            None
        );
    }

    fn active_alert() -> Alert {
        Alert {
            id: AlertId(Ulid::new()),
            reading_id: ReadingId(Ulid::new()),
            species_id: SpeciesId(Ulid::new()),
            category: AlertCategory::Temperature,
            message: "High temperature detected".into(),
            measured: nn(35.0),
            limit: nn(30.0),
            state: AlertState::Active,
            created_at: Timestamp::now(),
            resolved_at: None,
        }
    }

    #[test]
    fn resolve_stamps_and_is_one_way() {
        let alert = active_alert();
        let resolved = resolve(&alert, Timestamp::now()).unwrap();
        assert_eq!(resolved.state, AlertState::Resolved);
        assert!(resolved.resolved_at.is_some());

        let err = resolve(&resolved, Timestamp::now()).unwrap_err();
        assert!(matches!(err, DomainError::InvalidStateTransition { .. }));
        assert!(ignore(&resolved, Timestamp::now()).is_err());
    }

    #[test]
    fn ignore_is_terminal_too() {
        let ignored = ignore(&active_alert(), Timestamp::now()).unwrap();
        assert_eq!(ignored.state, AlertState::Ignored);
        assert!(resolve(&ignored, Timestamp::now()).is_err());
    }
}
