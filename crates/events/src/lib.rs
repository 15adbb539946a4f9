//! Domain events and the envelope used to journal them.
//!
//! Stock movements are append-only facts; the ledger records each lifecycle
//! change (committed, amended, cancelled) as an enveloped event.

pub mod envelope;
pub mod event;

pub use envelope::EventEnvelope;
pub use event::Event;
