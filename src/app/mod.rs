//! Main application modules.
//!
//! This module provides the Ctrl-C handling and the report printing used by the
//! binary.

pub mod shutdown;
pub mod summary;

// Re-export public API
pub use shutdown::{cancel_on_ctrl_c, shutdown_gracefully};
pub use summary::{format_summary, print_report};
