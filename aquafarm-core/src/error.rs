/// Domain failure taxonomy.
///
/// None of these are transient faults: they are surfaced to the caller as
/// structured rejections and are never retried.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainError {
    #[error("insufficient inventory: available {available}, requested {requested}")]
    InsufficientInventory { available: i64, requested: i64 },

    #[error("quantity must be positive, got {0}")]
    NonPositiveQuantity(i64),

    #[error("invalid state transition: {current} -> {attempted}")]
    InvalidStateTransition {
        current: Box<str>,
        attempted: Box<str>,
    },

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("{entity} not found: {key}")]
    NotFound {
        entity: &'static str,
        key: Box<str>,
    },

    #[error("duplicate {entity}: {key}")]
    DuplicateKey {
        entity: &'static str,
        key: Box<str>,
    },
}

impl DomainError {
    pub fn not_found(entity: &'static str, key: impl Into<Box<str>>) -> Self {
        DomainError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn duplicate(entity: &'static str, key: impl Into<Box<str>>) -> Self {
        DomainError::DuplicateKey {
            entity,
            key: key.into(),
        }
    }

    pub fn transition(current: impl Into<Box<str>>, attempted: impl Into<Box<str>>) -> Self {
        DomainError::InvalidStateTransition {
            current: current.into(),
            attempted: attempted.into(),
        }
    }
}
