//! Application configuration and constants.
//!
//! This module provides:
//! - Default timing constants for polling and request execution
//! - The per-scenario `TimeoutConfig`
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{Config, GatewayScheme, LogFormat, LogLevel, TimeoutConfig};
