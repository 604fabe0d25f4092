use serde::{Deserialize, Serialize};

use super::{CollapseKey, DateScale};

/// Issue-tracker id of the item a bar represents. Host-assigned.
pub type IssueId = u64;

/// Pixel-space geometry of one bar. Mutated in place during a drag.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BarGeom {
    pub start_x: f32,
    pub end_x: f32,
    pub row_y: f32,
}

impl BarGeom {
    pub fn width(&self) -> f32 {
        self.end_x - self.start_x
    }

    pub fn translated_x(self, dx: f32) -> Self {
        Self {
            start_x: self.start_x + dx,
            end_x: self.end_x + dx,
            ..self
        }
    }
}

/// One schedule item's rectangle on the timeline.
///
/// Built from the host render payload, mutated in place during a drag, and
/// discarded on the next full render. `start_x < end_x` always holds, with a
/// minimum width of one day.
#[derive(Debug, Clone)]
pub struct TimelineBar {
    pub issue_id: IssueId,
    pub collapse_key: CollapseKey,
    pub name: String,
    pub geom: BarGeom,
    /// True for parent/version rows that aggregate their children's span.
    pub is_aggregate: bool,
    /// Done ratio, 0.0..=1.0.
    pub progress: f32,
    /// False while any ancestor row is collapsed.
    pub visible: bool,
}

impl TimelineBar {
    /// Derive pixel geometry from the bar's date span. Enforces the
    /// one-day minimum width.
    pub fn from_dates(
        issue_id: IssueId,
        collapse_key: CollapseKey,
        name: String,
        start: chrono::NaiveDate,
        due: chrono::NaiveDate,
        row_y: f32,
        scale: &DateScale,
    ) -> Self {
        let start_x = scale.date_to_x(start);
        let end_x = scale.due_to_x(due).max(start_x + scale.day_width);
        Self {
            issue_id,
            collapse_key,
            name,
            geom: BarGeom { start_x, end_x, row_y },
            is_aggregate: false,
            progress: 0.0,
            visible: true,
        }
    }
}
