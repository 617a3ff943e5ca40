//! Error types for the bounded pool

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Borrow was cancelled while waiting for a free slot")]
    Cancelled,

    #[error("No free slot became available within {0:?}")]
    Timeout(std::time::Duration),

    #[error("Pool is at maximum capacity - all slots are borrowed")]
    Exhausted,

    #[error("Pool is closed")]
    Closed,
}

pub type PoolResult<T> = Result<T, PoolError>;
