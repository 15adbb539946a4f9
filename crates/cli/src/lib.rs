//! Scenario replay for the deduction engine.

pub mod scenario;

pub use scenario::{Report, Scenario, Step};
