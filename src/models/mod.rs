//! Data model for conformance checks.
//!
//! Everything here is built once per scenario from static definitions, read-only
//! while the scenario runs and dropped afterwards.

mod address;
mod case;
mod expectation;
mod observed;
mod request;

pub use address::GatewayAddress;
pub use case::TestCase;
pub(crate) use expectation::is_redirect_status;
pub use expectation::{HeaderMatch, RedirectTarget, ResponseExpectation};
pub use observed::{Observation, ObservedResponse};
pub use request::RequestDescriptor;
