//! POS orders domain module (event-sourced).
//!
//! Order lifecycle rules (draft, submit, edit after submit, cancel, delete)
//! and the annotation channel. Deterministic domain logic only; stock side
//! effects of a transition are the deduction engine's concern.

pub mod order;

pub use order::{
    AddLine, Annotate, Annotation, CancelOrder, CreateOrder, DeleteOrder, LineAdded, LinesReplaced,
    OrderAnnotated, OrderCancelled, OrderCommand, OrderCreated, OrderDeleted, OrderEvent, OrderLine,
    OrderStatus, OrderSubmitted, PosOrder, ReplaceLines, SubmitOrder,
};
