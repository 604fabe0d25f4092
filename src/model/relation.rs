use serde::{Deserialize, Serialize};

use super::IssueId;

/// Server-assigned id of a persisted relation.
pub type RelationId = u64;

/// The kind of dependency between two issues.
///
/// Scheduling kinds constrain timing and route along bar edges;
/// informational kinds are cosmetic and route above/through rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Precedes,
    Blocks,
    Follows,
    Relates,
    Duplicates,
    CopiedTo,
}

impl RelationKind {
    pub fn is_scheduling(self) -> bool {
        matches!(self, Self::Precedes | Self::Blocks | Self::Follows)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Precedes => "precedes",
            Self::Blocks => "blocks",
            Self::Follows => "follows",
            Self::Relates => "relates",
            Self::Duplicates => "duplicates",
            Self::CopiedTo => "copied to",
        }
    }
}

/// Which edge of a bar an arrow endpoint attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorSide {
    Start,
    End,
}

impl AnchorSide {
    /// Outward horizontal direction away from the bar at this edge.
    pub fn outward(self) -> f32 {
        match self {
            Self::Start => -1.0,
            Self::End => 1.0,
        }
    }
}

/// Relation kind pre-seeded into the chooser from the pair of anchors a
/// link gesture connected.
pub fn suggested_kind(from: AnchorSide, to: AnchorSide) -> RelationKind {
    match (from, to) {
        (AnchorSide::End, AnchorSide::Start) => RelationKind::Precedes,
        (AnchorSide::Start, AnchorSide::End) => RelationKind::Follows,
        _ => RelationKind::Relates,
    }
}

/// Default anchor sides for a relation kind when the payload does not
/// carry explicit ones.
pub fn default_anchors(kind: RelationKind) -> (AnchorSide, AnchorSide) {
    match kind {
        RelationKind::Follows => (AnchorSide::Start, AnchorSide::End),
        _ => (AnchorSide::End, AnchorSide::Start),
    }
}

/// A dependency between two issues, drawn as an arrow between their bars.
/// Geometry is recomputed whenever either endpoint bar moves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    /// None until the server acknowledges a locally-created relation.
    pub id: Option<RelationId>,
    pub from: IssueId,
    pub to: IssueId,
    pub kind: RelationKind,
    /// Lag (positive) or lead (negative) in days, scheduling kinds only.
    pub delay: Option<i64>,
    pub from_anchor: AnchorSide,
    pub to_anchor: AnchorSide,
}

impl Relation {
    pub fn new(from: IssueId, to: IssueId, kind: RelationKind, delay: Option<i64>) -> Self {
        let (from_anchor, to_anchor) = default_anchors(kind);
        Self {
            id: None,
            from,
            to,
            kind,
            delay,
            from_anchor,
            to_anchor,
        }
    }

    pub fn touches(&self, issue_id: IssueId) -> bool {
        self.from == issue_id || self.to == issue_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finish_to_start_suggests_precedes() {
        assert_eq!(
            suggested_kind(AnchorSide::End, AnchorSide::Start),
            RelationKind::Precedes
        );
        assert_eq!(
            suggested_kind(AnchorSide::Start, AnchorSide::End),
            RelationKind::Follows
        );
        assert_eq!(
            suggested_kind(AnchorSide::End, AnchorSide::End),
            RelationKind::Relates
        );
    }

    #[test]
    fn scheduling_split_matches_kind() {
        assert!(RelationKind::Precedes.is_scheduling());
        assert!(RelationKind::Blocks.is_scheduling());
        assert!(!RelationKind::Relates.is_scheduling());
        assert!(!RelationKind::CopiedTo.is_scheduling());
    }
}
