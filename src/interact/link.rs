//! Dependency-creation gesture: drag a floating guide from a bar's link
//! handle onto another bar.

use egui::Pos2;

use crate::model::{suggested_kind, AnchorSide, BarGeom, IssueId, RelationKind};

/// Live state of a link gesture.
#[derive(Debug, Clone)]
pub struct LinkSession {
    pub from: IssueId,
    pub from_anchor: AnchorSide,
    /// Source anchor point the guide is drawn from.
    pub origin: Pos2,
    /// Latest pointer position, the guide's free end.
    pub pointer: Pos2,
    /// Bar currently under the pointer (never the source).
    pub candidate: Option<IssueId>,
}

impl LinkSession {
    pub fn new(from: IssueId, from_anchor: AnchorSide, origin: Pos2) -> Self {
        Self {
            from,
            from_anchor,
            origin,
            pointer: origin,
            candidate: None,
        }
    }
}

/// Target anchor inferred from which half of the candidate bar the pointer
/// occupies.
pub fn target_anchor(pointer_x: f32, candidate: &BarGeom) -> AnchorSide {
    let center = (candidate.start_x + candidate.end_x) / 2.0;
    if pointer_x < center {
        AnchorSide::Start
    } else {
        AnchorSide::End
    }
}

/// A completed link drop, waiting in the relation-kind chooser.
#[derive(Debug, Clone, PartialEq)]
pub struct RelationPrompt {
    pub from: IssueId,
    pub to: IssueId,
    pub from_anchor: AnchorSide,
    pub to_anchor: AnchorSide,
    pub suggested: RelationKind,
}

impl RelationPrompt {
    pub fn from_drop(session: &LinkSession, to: IssueId, to_anchor: AnchorSide) -> Self {
        Self {
            from: session.from,
            to,
            from_anchor: session.from_anchor,
            to_anchor,
            suggested: suggested_kind(session.from_anchor, to_anchor),
        }
    }
}
