use serde::{Deserialize, Serialize};
use uuid::Uuid;

use larder_core::OrderId;

/// Envelope for an event, containing stream + correlation metadata.
///
/// This is the unit appended to a journal.
///
/// Notes:
/// - **Append-only**: `sequence_number` increases monotonically per journal.
/// - `correlation` ties the event back to the order that caused it, so the
///   journal can be filtered per order without decoding payloads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,

    stream_id: Uuid,
    stream_type: String,

    /// Monotonically increasing position in the journal.
    sequence_number: u64,

    correlation: Option<OrderId>,

    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        stream_id: Uuid,
        stream_type: impl Into<String>,
        sequence_number: u64,
        correlation: Option<OrderId>,
        payload: E,
    ) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            stream_id,
            stream_type: stream_type.into(),
            sequence_number,
            correlation,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn stream_id(&self) -> Uuid {
        self.stream_id
    }

    pub fn stream_type(&self) -> &str {
        &self.stream_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn correlation(&self) -> Option<OrderId> {
        self.correlation
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
