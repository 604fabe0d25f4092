//! Snapped drag/resize geometry and the date summaries shown for commits.

use chrono::{Datelike, NaiveDate};
use egui::Pos2;

use crate::model::{BarGeom, DateScale, IssueId};

/// Which bar edge a resize gesture grabbed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeSide {
    Left,
    Right,
}

/// Captured at pointer-down; candidate geometry is always recomputed from
/// these originals plus the total pointer delta, never accumulated.
#[derive(Debug, Clone)]
pub struct DragSession {
    pub anchor: Pos2,
    pub originals: Vec<(IssueId, BarGeom)>,
    pub scroll_at_start: f32,
}

impl DragSession {
    pub fn original_of(&self, issue_id: IssueId) -> Option<BarGeom> {
        self.originals
            .iter()
            .find(|(id, _)| *id == issue_id)
            .map(|(_, g)| *g)
    }
}

/// Move: snap the shifted start to a day boundary, keep the width.
///
/// A bar due on the last rendered day overhangs the right edge by one
/// day cell, so its width can exceed the timeline width; the start bound
/// floors at zero and such a bar simply cannot move.
pub fn moved_geom(orig: BarGeom, dx: f32, scale: &DateScale) -> BarGeom {
    let width = orig.width();
    let max_start = (scale.timeline_width - width).max(0.0);
    let start_x = scale
        .snap_to_day((orig.start_x + dx).clamp(0.0, max_start))
        .min(max_start);
    BarGeom {
        start_x,
        end_x: start_x + width,
        ..orig
    }
}

/// Resize against the fixed opposite edge, one-day minimum width.
pub fn resized_geom(orig: BarGeom, side: ResizeSide, dx: f32, scale: &DateScale) -> BarGeom {
    match side {
        ResizeSide::Left => {
            let limit = orig.end_x - scale.day_width;
            let start_x = scale
                .snap_to_day((orig.start_x + dx).clamp(0.0, limit))
                .min(limit)
                .max(0.0);
            BarGeom { start_x, ..orig }
        }
        ResizeSide::Right => {
            // A bar starting on the last rendered day already ends past
            // the timeline edge; the ceiling stretches to keep the
            // one-day minimum from inverting the bounds.
            let limit = orig.start_x + scale.day_width;
            let ceiling = scale.timeline_width.max(limit);
            let end_x = scale
                .snap_to_day((orig.end_x + dx).clamp(limit, ceiling))
                .clamp(limit, ceiling);
            BarGeom { end_x, ..orig }
        }
    }
}

/// One snapped delta shared by every bar of a bulk move.
pub fn bulk_delta(dx: f32, scale: &DateScale) -> f32 {
    (dx / scale.day_width).round() * scale.day_width
}

/// Apply the shared bulk delta to one bar, clamped independently.
pub fn bulk_moved_geom(orig: BarGeom, delta: f32, scale: &DateScale) -> BarGeom {
    let width = orig.width();
    let start_x = (orig.start_x + delta).clamp(0.0, (scale.timeline_width - width).max(0.0));
    BarGeom {
        start_x,
        end_x: start_x + width,
        ..orig
    }
}

/// Dates a bar's candidate geometry maps back to.
pub fn geom_dates(geom: &BarGeom, scale: &DateScale) -> (NaiveDate, NaiveDate) {
    (scale.x_to_date(geom.start_x), scale.x_to_due(geom.end_x))
}

// ── Date summaries ───────────────────────────────────────────────────────────

fn format_day(d: NaiveDate) -> String {
    format!("{} {}", d.format("%b"), d.day())
}

/// Compact span like `Jun 1-5`, falling back to `Jun 28 - Jul 3` across a
/// month boundary and a single day for zero-length spans.
pub fn format_span(start: NaiveDate, due: NaiveDate) -> String {
    if start == due {
        format_day(start)
    } else if start.month() == due.month() && start.year() == due.year() {
        format!("{} {}-{}", start.format("%b"), start.day(), due.day())
    } else {
        format!("{} - {}", format_day(start), format_day(due))
    }
}

/// Human-readable date-delta summary for the confirmation dialog:
/// `Issue #42: Jun 1-5 → Jun 2-6`.
pub fn change_summary(
    issue_id: IssueId,
    old: (NaiveDate, NaiveDate),
    new: (NaiveDate, NaiveDate),
) -> String {
    format!(
        "Issue #{}: {} → {}",
        issue_id,
        format_span(old.0, old.1),
        format_span(new.0, new.1)
    )
}
