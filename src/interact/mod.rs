//! Pointer-gesture state for the timeline surface.

pub mod drag;
pub mod link;
pub mod selection;

use egui::Pos2;

use crate::model::{BarGeom, IssueId};

pub use drag::{DragSession, ResizeSide};
pub use link::{LinkSession, RelationPrompt};
pub use selection::SelectionSet;

// ── Hit-test sizes ───────────────────────────────────────────────────────────

/// Width of the invisible resize zone straddling each bar edge.
pub const HANDLE_WIDTH: f32 = 7.0;
/// Width of the link-handle strip just outside each bar edge.
pub const LINK_HANDLE_WIDTH: f32 = 8.0;

/// The one active gesture. Ad hoc drag flags are deliberately absent;
/// every mode transition goes through this type.
#[derive(Debug, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Resizing {
        issue_id: IssueId,
        side: ResizeSide,
        session: DragSession,
    },
    Moving {
        issue_id: IssueId,
        session: DragSession,
    },
    BulkMoving {
        ids: Vec<IssueId>,
        session: DragSession,
    },
    Linking {
        session: LinkSession,
    },
}

impl Gesture {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }
}

/// What sits under a pointer position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    LeftHandle(IssueId),
    RightHandle(IssueId),
    LinkHandleStart(IssueId),
    LinkHandleEnd(IssueId),
    BarBody(IssueId),
    Background,
}

/// Classify a pointer position against one bar's geometry. Resize handles
/// win over the body; link handles sit just outside the edges.
pub fn hit_bar(pos: Pos2, geom: &BarGeom, row_height: f32, issue_id: IssueId) -> Option<Hit> {
    if pos.y < geom.row_y || pos.y > geom.row_y + row_height {
        return None;
    }
    let half = HANDLE_WIDTH / 2.0;
    if (pos.x - geom.start_x).abs() <= half {
        return Some(Hit::LeftHandle(issue_id));
    }
    if (pos.x - geom.end_x).abs() <= half {
        return Some(Hit::RightHandle(issue_id));
    }
    if pos.x >= geom.start_x && pos.x <= geom.end_x {
        return Some(Hit::BarBody(issue_id));
    }
    if pos.x < geom.start_x && pos.x >= geom.start_x - half - LINK_HANDLE_WIDTH {
        return Some(Hit::LinkHandleStart(issue_id));
    }
    if pos.x > geom.end_x && pos.x <= geom.end_x + half + LINK_HANDLE_WIDTH {
        return Some(Hit::LinkHandleEnd(issue_id));
    }
    None
}
