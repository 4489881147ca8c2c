//! Error types for the Hark core.
//!
//! Each concern gets its own enum so callers can tell registration-time
//! programmer errors ([`CoreError`], [`BusError`]) apart from runtime
//! failures that the robot recovers from ([`HandlerError`]) and from
//! transport failures ([`AdapterError`]).

use std::time::Duration;

use thiserror::Error;

/// A boxed, thread-safe error as returned by user handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

// =============================================================================
// Registration Errors
// =============================================================================

/// Errors raised while registering listeners.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The listener pattern is not a valid regular expression.
    #[error("invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        /// The pattern as given by the caller.
        pattern: String,
        /// The underlying compile error.
        #[source]
        source: regex::Error,
    },
}

// =============================================================================
// Event Bus Errors
// =============================================================================

/// Errors raised by the lifecycle [`EventBus`](crate::bus::EventBus).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BusError {
    /// The handler was never subscribed to this event type.
    #[error("handler is not subscribed to '{event_type}'")]
    SubscriptionNotFound {
        /// The event type passed to `unsubscribe`.
        event_type: String,
    },
}

// =============================================================================
// Handler Errors
// =============================================================================

/// A failure inside a listener or lifecycle handler.
///
/// These never escape [`Robot::receive`](crate::robot::Robot::receive) or
/// [`EventBus::publish`](crate::bus::EventBus::publish); they are logged and
/// reported as values.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("handler failed: {0}")]
    Failed(#[source] BoxError),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// The handler did not finish within the configured timeout.
    #[error("handler timed out after {0:?}")]
    TimedOut(Duration),
}

// =============================================================================
// Adapter Errors
// =============================================================================

/// Errors that can occur in adapter operations.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The underlying channel failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The adapter has already been closed.
    #[error("adapter is closed")]
    Closed,

    /// Adapter-specific failure.
    #[error("adapter error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for registration operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Result type for event bus operations.
pub type BusResult<T> = Result<T, BusError>;

/// Result type for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;
