use thiserror::Error;

use crate::spatial::LocationKey;

/// Rejections from the lifecycle handlers. Calculators never fail.
#[derive(Debug, Error, PartialEq)]
pub enum SimError {
    #[error("location {0} is outside the map")]
    OutOfBounds(LocationKey),
    #[error("location {0} is already occupied")]
    Occupied(LocationKey),
    #[error("unknown building definition '{0}'")]
    UnknownDefinition(String),
    #[error("no building at {0}")]
    NoBuilding(LocationKey),
    #[error("building at {0} is not under construction")]
    NotUnderConstruction(LocationKey),
    #[error("building at {0} is still under construction")]
    UnderConstruction(LocationKey),
}
