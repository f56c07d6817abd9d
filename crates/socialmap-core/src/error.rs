use crate::EntityId;
use thiserror::Error;

/// Shape errors detected while assembling the entity set.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Entity id must not be empty")]
    EmptyEntityId,
    #[error("Duplicate entity id: {0}")]
    DuplicateEntity(EntityId),
    #[error("Invalid role label: {0}")]
    InvalidRole(String),
    #[error("Invalid house label: {0}")]
    InvalidHouse(String),
}
