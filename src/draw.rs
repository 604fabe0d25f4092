//! Abstract draw directives for one frame.
//!
//! The engine never paints; it hands the host a description of the
//! timeline surface — bar rectangles on candidate geometry, routed arrow
//! paths, tooltip, cursor, link guide — and the host turns that into
//! device drawing calls.

use egui::{CursorIcon, Pos2, Rect};

use crate::arrows::ArrowPath;
use crate::layout::IndentGuide;
use crate::model::{IssueId, RelationKind};

#[derive(Debug, Clone)]
pub struct BarDirective {
    pub issue_id: IssueId,
    pub rect: Rect,
    /// X of the done-ratio divider inside the bar.
    pub progress_split: f32,
    pub is_aggregate: bool,
    pub selected: bool,
    /// True while this bar's geometry is a drag candidate, not committed.
    pub dragging: bool,
    /// Edge-anchored label position, repositioned every drag frame.
    pub label_pos: Pos2,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct ArrowDirective {
    pub from: IssueId,
    pub to: IssueId,
    pub kind: RelationKind,
    pub path: ArrowPath,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tooltip {
    pub pos: Pos2,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct LinkGuide {
    pub from: Pos2,
    pub to: Pos2,
    /// Bar to highlight as the drop target.
    pub drop_candidate: Option<IssueId>,
}

#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    pub bars: Vec<BarDirective>,
    pub arrows: Vec<ArrowDirective>,
    /// Tree lines under expanded rows, one per visible branch.
    pub guides: Vec<IndentGuide>,
    pub tooltip: Option<Tooltip>,
    pub cursor: CursorIcon,
    pub link_guide: Option<LinkGuide>,
}
