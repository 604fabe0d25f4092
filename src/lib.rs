//! Interactive Gantt timeline layout and editing engine.
//!
//! Headless core for a hierarchical project schedule rendered as bars on
//! a time axis: drag/resize/bulk-move with day snapping, orthogonal
//! dependency-arrow routing, collapsible row grouping with incremental
//! offset recomputation, undo/redo, and confirm-before-commit semantics.
//!
//! The host feeds a [`model::RenderPayload`] and pointer/keyboard events
//! into a [`TimelineEngine`]; the engine answers with abstract draw
//! directives ([`draw::FrameOutput`]) and fire-and-forget
//! [`outbox::HostCommand`]s. Fetching, validating and persisting domain
//! data stays on the host side, as does all pixel rendering.

pub mod arrows;
pub mod confirm;
pub mod draw;
pub mod engine;
pub mod history;
pub mod interact;
pub mod layout;
pub mod model;
pub mod outbox;

pub use engine::TimelineEngine;
pub use model::{CollapseKey, IssueId, RelationKind, RenderPayload};
pub use outbox::HostCommand;
