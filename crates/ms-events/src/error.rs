use thiserror::Error;

#[derive(Debug, Error)]
pub enum EventError {
    #[error("listener priority must be in 0..=9, got {0}")]
    InvalidPriority(u8),
}

/// Shorthand result type for `ms-events`.
pub type EventResult<T> = Result<T, EventError>;
