//! End-to-end engine scenarios: render a small schedule, drive pointer
//! gestures, and observe draw directives plus outbound host commands.

use std::collections::HashMap;

use chrono::NaiveDate;
use egui::{Modifiers, Pos2};

use gantt_timeline_engine::history::UndoAction;
use gantt_timeline_engine::model::{
    BarSpec, CollapseKey, FeatureFlags, HostUpdate, RelationKind, RenderPayload, RowSpec,
    StripeSpec,
};
use gantt_timeline_engine::{HostCommand, TimelineEngine};

const ROW: f32 = 24.0;

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
}

fn row(key: &str, parent: Option<&str>, y: f32) -> RowSpec {
    RowSpec {
        collapse_key: key.into(),
        parent: parent.map(Into::into),
        y,
        height: ROW,
        expanded: true,
        contributions: parent
            .map(|p| HashMap::from([(CollapseKey::from(p), ROW)]))
            .unwrap_or_default(),
    }
}

fn bar(issue_id: u64, key: &str, name: &str, start: NaiveDate, due: NaiveDate) -> BarSpec {
    BarSpec {
        issue_id,
        collapse_key: key.into(),
        name: name.into(),
        start_date: start,
        due_date: due,
        is_aggregate: false,
        progress: 0.0,
    }
}

/// 2024-06-01..2024-07-01 over 600px: 20px per day. Two flat rows.
fn flat_payload() -> RenderPayload {
    RenderPayload {
        min_date: day(1),
        max_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        timeline_width: 600.0,
        rows: vec![row("issue-42", None, 0.0), row("issue-43", None, ROW)],
        bars: vec![
            bar(42, "issue-42", "Design", day(1), day(5)),
            bar(43, "issue-43", "Build", day(10), day(12)),
        ],
        relations: Vec::new(),
        stripes: StripeSpec {
            label_area_height: 48.0,
            column_heights: vec![48.0],
            timeline_height: 48.0,
        },
        flags: FeatureFlags::default(),
    }
}

fn drag(engine: &mut TimelineEngine, from: Pos2, to: Pos2) {
    engine.on_pointer_down(from, Modifiers::default());
    engine.on_pointer_move(to);
    engine.on_animation_frame();
    engine.on_pointer_up(to);
}

#[test]
fn one_day_drag_produces_the_documented_summary() {
    let mut engine = TimelineEngine::new(flat_payload());
    // Bar #42 spans x 0..100; drag its body right by one day-width.
    drag(&mut engine, Pos2::new(50.0, 12.0), Pos2::new(70.0, 12.0));

    assert_eq!(
        engine.confirmation_message(),
        Some("Issue #42: Jun 1-5 → Jun 2-6")
    );

    engine.confirm();
    let commands = engine.drain_commands();
    assert!(commands.contains(&HostCommand::UpdateDates {
        issue_id: 42,
        start_date: day(2),
        due_date: day(6),
    }));
    assert!(engine.history().can_undo());
}

#[test]
fn move_preserves_width() {
    let mut engine = TimelineEngine::new(flat_payload());
    let before = engine.bar(42).unwrap().geom;
    drag(&mut engine, Pos2::new(50.0, 12.0), Pos2::new(117.0, 12.0));
    engine.confirm();
    let after = engine.bar(42).unwrap().geom;
    assert_eq!(after.width(), before.width());
    assert_eq!(after.start_x % 20.0, 0.0, "snapped to a day boundary");
}

#[test]
fn resize_changes_only_the_grabbed_edge() {
    let mut engine = TimelineEngine::new(flat_payload());
    // Right edge of bar #42 sits at x=100.
    drag(&mut engine, Pos2::new(100.0, 12.0), Pos2::new(141.0, 12.0));
    engine.confirm();
    let geom = engine.bar(42).unwrap().geom;
    assert_eq!(geom.start_x, 0.0);
    assert_eq!(geom.end_x, 140.0);
}

#[test]
fn unchanged_drag_restores_silently() {
    let mut engine = TimelineEngine::new(flat_payload());
    engine.drain_commands();
    drag(&mut engine, Pos2::new(50.0, 12.0), Pos2::new(53.0, 12.0)); // < half a day
    assert_eq!(engine.confirmation_message(), None);
    let commands = engine.drain_commands();
    // Only the selection sync, never a date update.
    assert!(commands
        .iter()
        .all(|c| matches!(c, HostCommand::SetSelectedKey { .. })));
    assert_eq!(engine.bar(42).unwrap().geom.start_x, 0.0);
}

#[test]
fn cancel_rolls_back_geometry_and_scroll() {
    let mut engine = TimelineEngine::new(flat_payload());
    engine.on_scroll(120.0);
    engine.on_animation_frame();

    engine.on_pointer_down(Pos2::new(50.0, 12.0), Modifiers::default());
    engine.on_scroll(300.0); // user scrolls mid-drag
    engine.on_pointer_move(Pos2::new(130.0, 12.0));
    engine.on_animation_frame();
    engine.on_pointer_up(Pos2::new(130.0, 12.0));
    assert!(engine.confirmation_message().is_some());

    engine.cancel();
    assert_eq!(engine.bar(42).unwrap().geom.start_x, 0.0);
    assert_eq!(engine.scroll_px(), 120.0);
    assert!(!engine.history().can_undo());
}

#[test]
fn undo_then_redo_restores_dates_for_every_action_kind() {
    let mut engine = TimelineEngine::new(flat_payload());
    drag(&mut engine, Pos2::new(50.0, 12.0), Pos2::new(70.0, 12.0));
    engine.confirm();
    engine.drain_commands();

    assert!(engine.undo());
    assert_eq!(
        engine.drain_commands(),
        vec![HostCommand::UpdateDates {
            issue_id: 42,
            start_date: day(1),
            due_date: day(5),
        }]
    );
    assert!(engine.redo());
    assert_eq!(
        engine.drain_commands(),
        vec![HostCommand::UpdateDates {
            issue_id: 42,
            start_date: day(2),
            due_date: day(6),
        }]
    );
}

#[test]
fn new_action_clears_redo() {
    let mut engine = TimelineEngine::new(flat_payload());
    drag(&mut engine, Pos2::new(50.0, 12.0), Pos2::new(70.0, 12.0));
    engine.confirm();
    engine.undo();
    assert!(engine.history().can_redo());

    // A second edit while redo is available.
    drag(&mut engine, Pos2::new(200.0, 36.0), Pos2::new(220.0, 36.0));
    engine.confirm();
    assert!(!engine.history().can_redo());
}

#[test]
fn bulk_move_applies_one_delta_to_every_selected_bar() {
    let mut engine = TimelineEngine::new(flat_payload());
    engine.on_pointer_down(Pos2::new(50.0, 12.0), Modifiers::default());
    engine.on_pointer_up(Pos2::new(50.0, 12.0));
    let ctrl = Modifiers {
        ctrl: true,
        ..Default::default()
    };
    engine.on_pointer_down(Pos2::new(200.0, 36.0), ctrl);
    engine.on_pointer_up(Pos2::new(200.0, 36.0));
    assert_eq!(engine.selection().len(), 2);

    drag(&mut engine, Pos2::new(50.0, 12.0), Pos2::new(90.0, 12.0));
    let message = engine.confirmation_message().unwrap().to_string();
    assert!(message.contains("Issue #42: Jun 1-5 → Jun 3-7"), "{message}");
    assert!(message.contains("Issue #43: Jun 10-12 → Jun 12-14"), "{message}");

    engine.confirm();
    let updates: Vec<_> = engine
        .drain_commands()
        .into_iter()
        .filter(|c| matches!(c, HostCommand::UpdateDates { .. }))
        .collect();
    assert_eq!(updates.len(), 2);
    assert!(engine.history().can_undo());
}

#[test]
fn draft_mode_bypasses_the_gate() {
    let mut payload = flat_payload();
    payload.flags.draft_mode = true;
    let mut engine = TimelineEngine::new(payload);
    drag(&mut engine, Pos2::new(50.0, 12.0), Pos2::new(70.0, 12.0));
    assert_eq!(engine.confirmation_message(), None);
    assert!(engine.drain_commands().contains(&HostCommand::UpdateDates {
        issue_id: 42,
        start_date: day(2),
        due_date: day(6),
    }));
    assert!(engine.history().can_undo());
}

#[test]
fn link_gesture_creates_a_relation_with_async_id() {
    let mut engine = TimelineEngine::new(flat_payload());
    // Bar #42 ends at x=100; its end link handle sits just right of it.
    engine.on_pointer_down(Pos2::new(107.0, 12.0), Modifiers::default());
    // Drop on the left half of bar #43 (x 180..240, row y 24..48).
    engine.on_pointer_move(Pos2::new(190.0, 36.0));
    engine.on_animation_frame();
    assert!(engine.frame_output().link_guide.is_some());
    assert_eq!(
        engine.frame_output().link_guide.as_ref().unwrap().drop_candidate,
        Some(43)
    );
    engine.on_pointer_up(Pos2::new(190.0, 36.0));

    let prompt = engine.relation_prompt().expect("chooser should open");
    assert_eq!(prompt.from, 42);
    assert_eq!(prompt.to, 43);
    assert_eq!(prompt.suggested, RelationKind::Precedes);

    engine.choose_relation(RelationKind::Precedes, None);
    let commands = engine.drain_commands();
    let token = commands
        .iter()
        .find_map(|c| match c {
            HostCommand::CreateRelation {
                issue_id: 42,
                target_issue_id: 43,
                client_token,
                ..
            } => Some(*client_token),
            _ => None,
        })
        .expect("create command queued");
    assert_eq!(engine.frame_output().arrows.len(), 1);

    // Undo before the server answers: no delete possible yet.
    engine.undo();
    assert!(engine.drain_commands().is_empty());
    engine.redo();
    engine.drain_commands();

    engine.apply_update(HostUpdate::RelationIdAssigned {
        client_token: token,
        relation_id: 901,
    });
    engine.undo();
    assert_eq!(
        engine.drain_commands(),
        vec![HostCommand::DeleteRelation { relation_id: 901 }]
    );
}

#[test]
fn escape_aborts_linking_but_not_a_move() {
    let mut engine = TimelineEngine::new(flat_payload());
    engine.on_pointer_down(Pos2::new(107.0, 12.0), Modifiers::default());
    engine.on_escape();
    engine.on_pointer_up(Pos2::new(400.0, 200.0));
    assert!(engine.relation_prompt().is_none());
    assert_eq!(engine.frame_output().arrows.len(), 0);
    assert_eq!(engine.bar(42).unwrap().geom.start_x, 0.0);

    // Escape mid-move is ignored; release still resolves the drag.
    engine.on_pointer_down(Pos2::new(50.0, 12.0), Modifiers::default());
    engine.on_pointer_move(Pos2::new(70.0, 12.0));
    engine.on_animation_frame();
    engine.on_escape();
    engine.on_pointer_up(Pos2::new(70.0, 12.0));
    assert!(engine.confirmation_message().is_some());
}

#[test]
fn drop_on_empty_space_or_source_cancels() {
    let mut engine = TimelineEngine::new(flat_payload());
    engine.on_pointer_down(Pos2::new(107.0, 12.0), Modifiers::default());
    engine.on_pointer_up(Pos2::new(400.0, 300.0));
    assert!(engine.relation_prompt().is_none());

    engine.on_pointer_down(Pos2::new(107.0, 12.0), Modifiers::default());
    engine.on_pointer_move(Pos2::new(50.0, 12.0)); // back over the source
    engine.on_animation_frame();
    engine.on_pointer_up(Pos2::new(50.0, 12.0));
    assert!(engine.relation_prompt().is_none());
    assert!(engine.drain_commands().is_empty());
}

fn hierarchical_payload() -> RenderPayload {
    RenderPayload {
        min_date: day(1),
        max_date: NaiveDate::from_ymd_opt(2024, 7, 1).unwrap(),
        timeline_width: 600.0,
        rows: vec![
            row("p", None, 0.0),
            row("c1", Some("p"), 24.0),
            row("c2", Some("p"), 48.0),
            row("c3", Some("p"), 72.0),
            row("tail", None, 96.0),
        ],
        bars: vec![
            bar(1, "c1", "a", day(2), day(4)),
            bar(2, "c2", "b", day(5), day(7)),
            bar(3, "c3", "c", day(8), day(9)),
            bar(9, "tail", "t", day(3), day(6)),
        ],
        relations: vec![gantt_timeline_engine::model::RelationSpec {
            id: Some(700),
            from: 1,
            to: 2,
            kind: RelationKind::Precedes,
            delay: None,
        }],
        stripes: StripeSpec {
            label_area_height: 120.0,
            column_heights: vec![120.0, 120.0],
            timeline_height: 120.0,
        },
        flags: FeatureFlags::default(),
    }
}

#[test]
fn collapsing_three_children_removes_72px_below() {
    let mut engine = TimelineEngine::new(hierarchical_payload());
    engine.on_idle(); // build the row index
    assert_eq!(engine.frame_output().arrows.len(), 1);
    assert_eq!(engine.frame_output().guides.len(), 1);

    engine.toggle_collapse(&"p".into());
    assert_eq!(engine.bar(9).unwrap().geom.row_y, 24.0);
    assert!(!engine.bar(1).unwrap().visible);
    assert_eq!(engine.stripes().label_area_height, 48.0);
    assert_eq!(engine.stripes().timeline_height, 48.0);
    assert_eq!(engine.stripes().column_heights, vec![48.0, 48.0]);
    // Both relation endpoints are hidden, so the arrow disappears, and
    // the collapsed branch loses its indent guide.
    assert_eq!(engine.frame_output().arrows.len(), 0);
    assert!(engine.frame_output().guides.is_empty());
    assert!(engine
        .drain_commands()
        .contains(&HostCommand::CollapseStateSync {
            collapse_key: "p".into(),
            is_expanded: false,
        }));

    engine.toggle_collapse(&"p".into());
    assert_eq!(engine.bar(9).unwrap().geom.row_y, 96.0);
    assert_eq!(engine.bar(1).unwrap().geom.row_y, 24.0);
    assert_eq!(engine.frame_output().arrows.len(), 1);
    assert_eq!(engine.frame_output().guides.len(), 1);
}

#[test]
fn contribution_gaps_request_a_full_render() {
    let mut payload = hierarchical_payload();
    payload.rows[1].contributions.clear();
    let mut engine = TimelineEngine::new(payload);
    engine.drain_commands();
    engine.toggle_collapse(&"p".into());
    assert_eq!(
        engine.drain_commands(),
        vec![HostCommand::RequestFullRender]
    );
    // Offsets untouched.
    assert_eq!(engine.bar(9).unwrap().geom.row_y, 96.0);
}

#[test]
fn pointer_bursts_coalesce_to_the_latest_sample() {
    let mut engine = TimelineEngine::new(flat_payload());
    engine.on_pointer_down(Pos2::new(50.0, 12.0), Modifiers::default());
    for x in [52.0, 58.0, 63.0, 90.0] {
        engine.on_pointer_move(Pos2::new(x, 12.0));
    }
    engine.on_animation_frame();
    // Only the last sample shaped the candidate: +40px = two days.
    assert_eq!(engine.bar(42).unwrap().geom.start_x, 40.0);
    let tooltip = engine.frame_output().tooltip.clone().expect("live tooltip");
    assert_eq!(tooltip.text, "Jun 3-7");
}

#[test]
fn scroll_anchor_debounces_to_a_center_date() {
    let mut engine = TimelineEngine::new(flat_payload());
    engine.set_viewport_width(200.0);
    engine.on_scroll(100.0);
    assert_eq!(engine.scroll_anchor(), None);
    engine.on_animation_frame();
    // Center at x=200 -> 10 days in.
    assert_eq!(engine.scroll_anchor(), Some(day(11)));
}

#[test]
fn bulk_done_ratio_goes_out_for_the_selection() {
    let mut engine = TimelineEngine::new(flat_payload());
    engine.on_pointer_down(Pos2::new(50.0, 12.0), Modifiers::default());
    engine.on_pointer_up(Pos2::new(50.0, 12.0));
    let ctrl = Modifiers {
        ctrl: true,
        ..Default::default()
    };
    engine.on_pointer_down(Pos2::new(200.0, 36.0), ctrl);
    engine.on_pointer_up(Pos2::new(200.0, 36.0));
    engine.drain_commands();

    engine.set_done_ratio_for_selection(60);
    assert_eq!(
        engine.drain_commands(),
        vec![HostCommand::BulkSetDoneRatio {
            issue_ids: vec![42, 43],
            percentage: 60,
        }]
    );
    assert_eq!(engine.bar(42).unwrap().progress, 0.6);
}

#[test]
fn external_history_updates_join_the_local_stack() {
    let mut engine = TimelineEngine::new(flat_payload());
    engine.apply_update(HostUpdate::PushUndoAction {
        action: UndoAction::RelationDelete {
            relation_id: Some(5),
            from: 42,
            to: 43,
            kind: RelationKind::Blocks,
            delay: None,
        },
    });
    assert!(engine.undo());
    assert!(matches!(
        engine.drain_commands()[0],
        HostCommand::CreateRelation {
            issue_id: 42,
            target_issue_id: 43,
            ..
        }
    ));
}
