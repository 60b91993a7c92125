//! Error handling.
//!
//! This module provides:
//! - Error type definitions for every stage of a run
//! - Categorization of `reqwest` failures into transport error kinds
//!
//! Errors fall into two groups:
//! - **User-visible**: `ConfigurationError` (bad case authoring, raised before any
//!   request) and `ConsistencyTimeoutError` (the gateway never settled)
//! - **Absorbed**: `TransportError` and `MalformedRedirectError`, which the poller
//!   records as non-matching observations and retries

mod categorization;
mod types;

// Re-export public API
pub use categorization::{categorize_reqwest_error, describe_error_chain};
pub use types::{
    ConfigurationError, ConsistencyTimeoutError, FailureSignature, InitializationError,
    MalformedRedirectError, RoundTripError, TransportError, TransportErrorKind,
};
