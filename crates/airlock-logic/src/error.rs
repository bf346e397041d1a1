//! Error types for airlock construction and settlement bookkeeping.
//!
//! Only structural problems are errors. Ordinary negative outcomes such as
//! a full chamber, a full reservation registry or a missing path are
//! reported as `false`/`None` by the operations themselves.

use crate::airlock::AirlockId;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AirlockError {
    #[error("airlock capacity must be at least one (got {capacity})")]
    InvalidCapacity { capacity: u32 },

    #[error("no airlock with id {0}")]
    UnknownAirlock(AirlockId),

    #[error("airlock id {0} is already registered")]
    DuplicateAirlock(AirlockId),

    #[error("invalid airlock spec: {0}")]
    InvalidSpec(String),
}

pub type Result<T> = std::result::Result<T, AirlockError>;
