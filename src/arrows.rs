//! Orthogonal dependency-arrow routing.
//!
//! Pure geometry: two anchor points plus relation semantics in, a path of
//! straight segments with rounded corners and an oriented arrowhead out.
//! Re-invoked every frame for arrows whose endpoint bar is mid-drag, on
//! candidate geometry.

use egui::{Pos2, Vec2};

use crate::model::AnchorSide;

// ── Routing constants ────────────────────────────────────────────────────────

/// Below this horizontal span a scheduling arrow gets the compact
/// side-jog/vertical-run shape instead of the general route.
pub const SHORT_SPAN: f32 = 30.0;
/// Vertical tolerance for treating two anchors as "same row".
pub const SAME_ROW_TOLERANCE: f32 = 5.0;
/// Horizontal tolerance for treating two anchors as vertically aligned.
const ALIGNED_TOLERANCE: f32 = 0.5;
/// Radius of rounded corners.
const CORNER_RADIUS: f32 = 5.0;
/// Horizontal stub leaving/entering a bar edge.
const EDGE_JOG: f32 = 10.0;
/// Vertical clearance when looping over a bar or skirting a row.
const ROW_CLEARANCE: f32 = 14.0;
/// Height of the hop an informational same-row arrow makes above the row.
const HOP_HEIGHT: f32 = 12.0;

const HEAD_LENGTH: f32 = 6.0;
const HEAD_HALF_WIDTH: f32 = 3.5;

// ── Output shape ─────────────────────────────────────────────────────────────

/// One drawing step of an arrow path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathSeg {
    MoveTo(Pos2),
    LineTo(Pos2),
    QuadTo { ctrl: Pos2, to: Pos2 },
}

/// A routed arrow: path plus a filled triangular head at the target.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrowPath {
    pub segments: Vec<PathSeg>,
    /// Tip, then the two base corners.
    pub head: [Pos2; 3],
}

impl ArrowPath {
    /// SVG-style path string. Stable for identical inputs, which makes it
    /// the cheap determinism check for the router.
    pub fn to_path_string(&self) -> String {
        let mut out = String::new();
        for seg in &self.segments {
            match seg {
                PathSeg::MoveTo(p) => {
                    out.push_str(&format!("M{:.1},{:.1}", p.x, p.y));
                }
                PathSeg::LineTo(p) => {
                    out.push_str(&format!(" L{:.1},{:.1}", p.x, p.y));
                }
                PathSeg::QuadTo { ctrl, to } => {
                    out.push_str(&format!(
                        " Q{:.1},{:.1} {:.1},{:.1}",
                        ctrl.x, ctrl.y, to.x, to.y
                    ));
                }
            }
        }
        out
    }
}

// ── Path building ────────────────────────────────────────────────────────────

/// Turns an orthogonal waypoint polyline into segments with quadratic
/// corners. Corner radius shrinks to half the shorter adjacent segment so
/// short runs stay well-formed.
fn rounded(waypoints: &[Pos2]) -> Vec<PathSeg> {
    debug_assert!(waypoints.len() >= 2);
    let mut segs = vec![PathSeg::MoveTo(waypoints[0])];
    for i in 1..waypoints.len() - 1 {
        let prev = waypoints[i - 1];
        let corner = waypoints[i];
        let next = waypoints[i + 1];
        let into = corner - prev;
        let out = next - corner;
        let r = CORNER_RADIUS
            .min(into.length() / 2.0)
            .min(out.length() / 2.0);
        if r <= f32::EPSILON {
            segs.push(PathSeg::LineTo(corner));
            continue;
        }
        let before = corner - into.normalized() * r;
        let after = corner + out.normalized() * r;
        segs.push(PathSeg::LineTo(before));
        segs.push(PathSeg::QuadTo {
            ctrl: corner,
            to: after,
        });
    }
    segs.push(PathSeg::LineTo(*waypoints.last().unwrap()));
    segs
}

fn head_at(tip: Pos2, approach: Vec2) -> [Pos2; 3] {
    let dir = approach.normalized();
    let base = tip - dir * HEAD_LENGTH;
    let perp = Vec2::new(-dir.y, dir.x) * HEAD_HALF_WIDTH;
    [tip, base + perp, base - perp]
}

fn finish(waypoints: Vec<Pos2>) -> ArrowPath {
    let n = waypoints.len();
    let approach = waypoints[n - 1] - waypoints[n - 2];
    ArrowPath {
        head: head_at(waypoints[n - 1], approach),
        segments: rounded(&waypoints),
    }
}

// ── Router ───────────────────────────────────────────────────────────────────

/// Route an arrow from `from` to `to`.
///
/// Cases are ranked; the first match wins, so the output is fully
/// determined by the inputs.
pub fn route_arrow(
    from: Pos2,
    to: Pos2,
    from_side: AnchorSide,
    to_side: AnchorSide,
    is_scheduling: bool,
) -> ArrowPath {
    let dx = to.x - from.x;
    let dy = to.y - from.y;
    let same_row = dy.abs() <= SAME_ROW_TOLERANCE;

    if !is_scheduling {
        return route_informational(from, to, dx, same_row);
    }

    let out = from_side.outward();
    let inward = to_side.outward();

    // Case 4: same row, forward along the departure direction.
    if same_row && dx * out > 0.0 {
        return finish(vec![from, to]);
    }

    // Case 5: same row, backward. Loop up over the source bar and come
    // down into the target edge.
    if same_row {
        let lift = from.y - ROW_CLEARANCE;
        return finish(vec![
            from,
            Pos2::new(from.x + out * EDGE_JOG, from.y),
            Pos2::new(from.x + out * EDGE_JOG, lift),
            Pos2::new(to.x + inward * EDGE_JOG, lift),
            Pos2::new(to.x + inward * EDGE_JOG, to.y),
            to,
        ]);
    }

    // Case 6: short horizontal span with a consistent departure/arrival
    // side. Jog out, run vertically on the outside, jog back in.
    if dx.abs() < SHORT_SPAN && from_side == to_side {
        let x_run = if out > 0.0 {
            from.x.max(to.x) + EDGE_JOG
        } else {
            from.x.min(to.x) - EDGE_JOG
        };
        return finish(vec![
            from,
            Pos2::new(x_run, from.y),
            Pos2::new(x_run, to.y),
            to,
        ]);
    }

    // Case 7: general. Side jog at the source, horizontal run at the
    // target row height, jogging around the target when the run would
    // arrive on the wrong edge.
    let stub_x = from.x + out * EDGE_JOG;
    let arrival = to.x - stub_x;
    if arrival * inward < 0.0 {
        return finish(vec![from, Pos2::new(stub_x, from.y), Pos2::new(stub_x, to.y), to]);
    }
    let skirt = to.y - dy.signum() * ROW_CLEARANCE;
    finish(vec![
        from,
        Pos2::new(stub_x, from.y),
        Pos2::new(stub_x, skirt),
        Pos2::new(to.x + inward * EDGE_JOG, skirt),
        Pos2::new(to.x + inward * EDGE_JOG, to.y),
        to,
    ])
}

fn route_informational(from: Pos2, to: Pos2, dx: f32, same_row: bool) -> ArrowPath {
    // Case 1: same row, forward. Single hop above the row.
    if same_row && dx > 0.0 {
        let lift = from.y - HOP_HEIGHT;
        return finish(vec![
            from,
            Pos2::new(from.x, lift),
            Pos2::new(to.x, lift),
            to,
        ]);
    }

    // Case 2: vertically aligned centers. Straight vertical segment.
    if dx.abs() <= ALIGNED_TOLERANCE {
        return finish(vec![from, to]);
    }

    // Case 3: general. One horizontal jog at mid height.
    let mid = (from.y + to.y) / 2.0;
    finish(vec![
        from,
        Pos2::new(from.x, mid),
        Pos2::new(to.x, mid),
        to,
    ])
}
