//! Admin error types.
//!
//! `AdminError` is what every use-case operation returns. The HTTP adapter
//! maps each variant onto a status code; nothing below the adapters layer
//! knows about HTTP.

use serde::Serialize;
use thiserror::Error;

/// A single rejected form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Name of the offending form field.
    pub field: &'static str,
    /// Human-readable reason.
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Which kind of record a lookup failed to find.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Order,
    OrderItem,
    Offer,
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Order => write!(f, "order"),
            Self::OrderItem => write!(f, "order item"),
            Self::Offer => write!(f, "offer"),
        }
    }
}

#[derive(Debug, Error)]
pub enum AdminError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: String },

    #[error("validation failed: {}", .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("; "))]
    Validation(Vec<ValidationError>),

    #[error("storage error: {0:#}")]
    Storage(#[from] anyhow::Error),
}

impl AdminError {
    pub fn not_found(entity: Entity, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<Vec<ValidationError>> for AdminError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

pub type AdminResult<T> = Result<T, AdminError>;
