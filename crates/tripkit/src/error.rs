use thiserror::Error;

use crate::ids::TripId;

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("Trip not found: {0}")]
    TripNotFound(TripId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Config error: {0}")]
    Config(#[from] confique::Error),

    #[error("Template error: {0}")]
    Template(String),
}

pub type Result<T> = std::result::Result<T, PlannerError>;
