//! The timeline engine instance: one per displayed timeline.
//!
//! Owns every piece of mutable state — row index, bars, relations,
//! selection, gesture, history — and runs the cooperative frame loop:
//! pointer moves collapse to one recomputation per animation frame, index
//! construction waits for an idle window, scroll persistence is debounced,
//! and all host traffic is fire-and-forget through the outbox.

use std::collections::HashMap;
use std::mem;

use chrono::NaiveDate;
use egui::{CursorIcon, Modifiers, Pos2, Rect, Vec2};

use crate::arrows::route_arrow;
use crate::confirm::{CommitPlan, ConfirmGate, GateInput, GateOutcome};
use crate::draw::{ArrowDirective, BarDirective, FrameOutput, LinkGuide, Tooltip};
use crate::history::{DateChange, UndoAction, UndoHistory};
use crate::interact::{
    drag, hit_bar, link, DragSession, Gesture, Hit, LinkSession, RelationPrompt, ResizeSide,
    SelectionSet,
};
use crate::layout::RowIndex;
use crate::model::{
    AnchorSide, CollapseKey, DateScale, FeatureFlags, HostUpdate, IssueId, Relation,
    RelationKind, RenderPayload, StripeSpec, TimelineBar,
};
use crate::outbox::{HostCommand, Outbox};

/// Vertical inset so bars don't touch row edges.
const BAR_INSET: f32 = 3.0;
/// Gap between a bar's right edge and its trailing label.
const LABEL_GAP: f32 = 6.0;
const DEFAULT_ROW_HEIGHT: f32 = 24.0;

pub struct TimelineEngine {
    scale: DateScale,
    rows: RowIndex,
    bars: Vec<TimelineBar>,
    bar_index: HashMap<IssueId, usize>,
    relations: Vec<Relation>,
    stripes: StripeSpec,
    flags: FeatureFlags,

    selection: SelectionSet,
    gesture: Gesture,
    gate: ConfirmGate,
    history: UndoHistory,
    outbox: Outbox,
    pending_relation: Option<RelationPrompt>,

    // Frame coalescing: input bursts collapse to the most recent sample.
    frame_pending: bool,
    latest_pointer: Option<Pos2>,

    // Scroll persistence, debounced to the next animation frame.
    scroll_px: f32,
    scroll_dirty: bool,
    scroll_anchor: Option<NaiveDate>,
    viewport_width: f32,

    frame: FrameOutput,
}

impl TimelineEngine {
    pub fn new(payload: RenderPayload) -> Self {
        let mut engine = Self {
            scale: DateScale::new(payload.min_date, payload.max_date, payload.timeline_width),
            rows: RowIndex::default(),
            bars: Vec::new(),
            bar_index: HashMap::new(),
            relations: Vec::new(),
            stripes: StripeSpec::default(),
            flags: FeatureFlags::default(),
            selection: SelectionSet::default(),
            gesture: Gesture::Idle,
            gate: ConfirmGate::default(),
            history: UndoHistory::new(),
            outbox: Outbox::default(),
            pending_relation: None,
            frame_pending: false,
            latest_pointer: None,
            scroll_px: 0.0,
            scroll_dirty: false,
            scroll_anchor: None,
            viewport_width: payload.timeline_width,
            frame: FrameOutput::default(),
        };
        engine.render(payload);
        engine
    }

    /// Replace all layout state from a fresh host render. Any active
    /// gesture or pending confirmation dies with the old state; the undo
    /// history and undrained outbox survive.
    pub fn render(&mut self, payload: RenderPayload) {
        self.scale = DateScale::new(payload.min_date, payload.max_date, payload.timeline_width);
        self.rows = RowIndex::from_specs(&payload.rows);
        self.stripes = payload.stripes;
        self.flags = payload.flags;

        self.bars = payload
            .bars
            .iter()
            .map(|spec| {
                let row_y = self
                    .rows
                    .get(&spec.collapse_key)
                    .map(|n| n.y)
                    .unwrap_or(0.0);
                let mut bar = TimelineBar::from_dates(
                    spec.issue_id,
                    spec.collapse_key.clone(),
                    spec.name.clone(),
                    spec.start_date,
                    spec.due_date,
                    row_y,
                    &self.scale,
                );
                bar.is_aggregate = spec.is_aggregate;
                bar.progress = spec.progress.clamp(0.0, 1.0);
                bar.visible = self.rows.is_visible(&spec.collapse_key);
                bar
            })
            .collect();
        self.bar_index = self
            .bars
            .iter()
            .enumerate()
            .map(|(i, b)| (b.issue_id, i))
            .collect();

        self.relations = payload
            .relations
            .iter()
            .map(|spec| Relation {
                id: spec.id,
                ..Relation::new(spec.from, spec.to, spec.kind, spec.delay)
            })
            .collect();

        self.selection.clear();
        self.gesture = Gesture::Idle;
        self.gate = ConfirmGate::default();
        self.pending_relation = None;
        self.frame_pending = false;
        self.latest_pointer = None;
        self.rebuild_frame();
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn frame_output(&self) -> &FrameOutput {
        &self.frame
    }

    pub fn confirmation_message(&self) -> Option<&str> {
        self.gate.message()
    }

    pub fn relation_prompt(&self) -> Option<&RelationPrompt> {
        self.pending_relation.as_ref()
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn history(&self) -> &UndoHistory {
        &self.history
    }

    /// Restore a host-persisted history after a render.
    pub fn set_history(&mut self, history: UndoHistory) {
        self.history = history;
    }

    /// Center date of the viewport, the content-reflow-safe scroll anchor
    /// the host persists.
    pub fn scroll_anchor(&self) -> Option<NaiveDate> {
        self.scroll_anchor
    }

    pub fn scroll_px(&self) -> f32 {
        self.scroll_px
    }

    pub fn drain_commands(&mut self) -> Vec<HostCommand> {
        self.outbox.drain()
    }

    pub fn bar(&self, issue_id: IssueId) -> Option<&TimelineBar> {
        self.bar_index.get(&issue_id).map(|i| &self.bars[*i])
    }

    /// Hover tooltip content for a bar.
    pub fn bar_tooltip(&self, issue_id: IssueId) -> Option<String> {
        let bar = self.bar(issue_id)?;
        let (start, due) = drag::geom_dates(&bar.geom, &self.scale);
        Some(format!(
            "{}\n{}\n{}%",
            bar.name,
            drag::format_span(start, due),
            (bar.progress * 100.0).round() as i32
        ))
    }

    // ── Pointer input ────────────────────────────────────────────────────

    pub fn on_pointer_down(&mut self, pos: Pos2, modifiers: Modifiers) {
        // A click outside an open dialog cancels it; the press goes no
        // further.
        if self.gate.is_open() {
            self.gate_input(GateInput::OutsideClick);
            return;
        }
        if self.pending_relation.is_some() {
            self.cancel_relation();
            return;
        }
        if !self.gesture.is_idle() {
            return;
        }

        match self.hit_test(pos) {
            Hit::LeftHandle(id) => self.start_resize(id, ResizeSide::Left, pos),
            Hit::RightHandle(id) => self.start_resize(id, ResizeSide::Right, pos),
            Hit::LinkHandleStart(id) => self.start_link(id, AnchorSide::Start, pos),
            Hit::LinkHandleEnd(id) => self.start_link(id, AnchorSide::End, pos),
            Hit::BarBody(id) => {
                // A plain press on a member of a multi-selection starts a
                // bulk move; it must not collapse the selection first.
                let keep_bulk = !modifiers.ctrl
                    && !modifiers.shift
                    && self.selection.is_multi()
                    && self.selection.contains(id);
                if !keep_bulk {
                    self.update_selection(id, modifiers);
                }
                if !self.bar_is_aggregate(id) {
                    if self.selection.is_multi() && self.selection.contains(id) {
                        self.start_bulk_move(pos);
                    } else {
                        self.start_move(id, pos);
                    }
                }
            }
            Hit::Background => self.selection.clear(),
        }
        self.rebuild_frame();
    }

    /// Rate-limited: only the latest sample is kept until the next
    /// animation frame.
    pub fn on_pointer_move(&mut self, pos: Pos2) {
        self.latest_pointer = Some(pos);
        self.frame_pending = true;
    }

    pub fn on_pointer_up(&mut self, pos: Pos2) {
        // Flush the final sample so release sees current geometry.
        self.process_pointer(pos);
        let gesture = mem::take(&mut self.gesture);
        match gesture {
            Gesture::Idle => {}
            Gesture::Moving { issue_id, session } | Gesture::Resizing { issue_id, session, .. } => {
                self.finish_single_drag(issue_id, session);
            }
            Gesture::BulkMoving { ids, session } => self.finish_bulk_drag(&ids, session),
            Gesture::Linking { session } => self.finish_link(session),
        }
        self.rebuild_frame();
    }

    pub fn on_escape(&mut self) {
        if self.gate.is_open() {
            self.gate_input(GateInput::Escape);
        } else if self.pending_relation.is_some() {
            self.cancel_relation();
        } else if matches!(self.gesture, Gesture::Linking { .. }) {
            // Linking is the only escapable gesture; a move/resize always
            // resolves to a clamped value at release.
            self.gesture = Gesture::Idle;
            self.rebuild_frame();
        }
    }

    pub fn on_enter(&mut self) {
        if self.gate.is_open() {
            self.gate_input(GateInput::Enter);
        }
    }

    pub fn confirm(&mut self) {
        self.gate_input(GateInput::Confirm);
    }

    pub fn cancel(&mut self) {
        self.gate_input(GateInput::Cancel);
    }

    // ── Frame loop ───────────────────────────────────────────────────────

    /// Run the per-frame work: the coalesced pointer sample and the
    /// debounced scroll anchor.
    pub fn on_animation_frame(&mut self) {
        let started = std::time::Instant::now();

        if self.scroll_dirty {
            self.scroll_anchor =
                Some(self.scale.x_to_date(self.scroll_px + self.viewport_width / 2.0));
            self.scroll_dirty = false;
        }

        if self.frame_pending {
            self.frame_pending = false;
            if let Some(pos) = self.latest_pointer {
                self.process_pointer(pos);
                self.rebuild_frame();
            }
        }

        if self.flags.perf_debug {
            log::debug!("frame took {:?}", started.elapsed());
        }
    }

    /// Idle-window work: build the row-tree indices without delaying the
    /// first frame. Lookups fall back to full scans until this runs.
    pub fn on_idle(&mut self) {
        self.rows.build_index();
    }

    pub fn on_scroll(&mut self, scroll_px: f32) {
        self.scroll_px = scroll_px;
        self.scroll_dirty = true;
    }

    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport_width = width;
    }

    // ── Collapse/expand ──────────────────────────────────────────────────

    pub fn toggle_collapse(&mut self, key: &CollapseKey) {
        match self.rows.toggle(key, &mut self.stripes) {
            Ok(outcome) => {
                for (row_key, y) in &outcome.new_offsets {
                    for bar in self.bars.iter_mut().filter(|b| b.collapse_key == *row_key) {
                        bar.geom.row_y = *y;
                    }
                }
                for shown in &outcome.shown {
                    self.set_bar_visibility(shown, true);
                }
                for hidden in &outcome.hidden {
                    self.set_bar_visibility(hidden, false);
                }
                self.outbox.push(HostCommand::CollapseStateSync {
                    collapse_key: outcome.key.clone(),
                    is_expanded: outcome.expanded,
                });
                self.rebuild_frame();
            }
            Err(err) => {
                // Never guess at offsets; drift here is undetectable.
                log::warn!("collapse toggle aborted: {err}");
                self.outbox.push(HostCommand::RequestFullRender);
            }
        }
    }

    pub fn stripes(&self) -> &StripeSpec {
        &self.stripes
    }

    // ── Relations ────────────────────────────────────────────────────────

    /// Chooser confirmation: create the relation the link gesture drew.
    pub fn choose_relation(&mut self, kind: RelationKind, delay: Option<i64>) {
        let Some(prompt) = self.pending_relation.take() else {
            return;
        };
        let client_token = self.history.next_client_token();
        self.history.record(UndoAction::RelationCreate {
            client_token,
            relation_id: None,
            from: prompt.from,
            to: prompt.to,
            kind,
            delay,
        });
        self.outbox.push(HostCommand::CreateRelation {
            issue_id: prompt.from,
            target_issue_id: prompt.to,
            relation_type: kind,
            delay,
            client_token,
        });
        // Optimistic: draw the arrow now, along the gesture's anchors; the
        // host's next render carries the server id.
        self.relations.push(Relation {
            id: None,
            from: prompt.from,
            to: prompt.to,
            kind,
            delay,
            from_anchor: prompt.from_anchor,
            to_anchor: prompt.to_anchor,
        });
        self.rebuild_frame();
    }

    pub fn cancel_relation(&mut self) {
        self.pending_relation = None;
        self.rebuild_frame();
    }

    // ── History ──────────────────────────────────────────────────────────

    pub fn undo(&mut self) -> bool {
        self.history.undo(&mut self.outbox)
    }

    pub fn redo(&mut self) -> bool {
        self.history.redo(&mut self.outbox)
    }

    // ── Bulk edits ───────────────────────────────────────────────────────

    /// Queue a done-ratio edit for every selected bar and mirror it
    /// locally.
    pub fn set_done_ratio_for_selection(&mut self, percentage: u8) {
        let ids = self.selection.ids();
        if ids.is_empty() {
            return;
        }
        let ratio = f32::from(percentage.min(100)) / 100.0;
        for id in &ids {
            if let Some(&i) = self.bar_index.get(id) {
                self.bars[i].progress = ratio;
            }
        }
        self.outbox.push(HostCommand::BulkSetDoneRatio {
            issue_ids: ids,
            percentage: percentage.min(100),
        });
        self.rebuild_frame();
    }

    // ── Host updates ─────────────────────────────────────────────────────

    pub fn apply_update(&mut self, update: HostUpdate) {
        match update {
            HostUpdate::SetDraftMode { on } => self.flags.draft_mode = on,
            HostUpdate::SetPerfDebug { on } => self.flags.perf_debug = on,
            HostUpdate::SetProgress { issue_id, ratio } => {
                if let Some(&i) = self.bar_index.get(&issue_id) {
                    self.bars[i].progress = ratio.clamp(0.0, 1.0);
                    self.rebuild_frame();
                }
            }
            HostUpdate::PushUndoAction { action } => self.history.push_external(action),
            HostUpdate::PopUndoAction => {
                self.history.pop_external();
            }
            HostUpdate::ScrollToIssue { issue_id } => {
                if let Some(bar) = self.bar(issue_id) {
                    let center = (bar.geom.start_x + bar.geom.end_x) / 2.0;
                    self.scroll_px = (center - self.viewport_width / 2.0).max(0.0);
                    self.scroll_dirty = true;
                }
            }
            HostUpdate::RelationIdAssigned {
                client_token,
                relation_id,
            } => self.history.assign_relation_id(client_token, relation_id),
        }
    }

    // ── Gesture internals ────────────────────────────────────────────────

    fn bar_is_aggregate(&self, id: IssueId) -> bool {
        self.bar(id).map(|b| b.is_aggregate).unwrap_or(false)
    }

    fn row_height_of(&self, key: &CollapseKey) -> f32 {
        self.rows.get(key).map(|n| n.height).unwrap_or(DEFAULT_ROW_HEIGHT)
    }

    fn hit_test(&self, pos: Pos2) -> Hit {
        for bar in &self.bars {
            if !bar.visible {
                continue;
            }
            let row_height = self.row_height_of(&bar.collapse_key);
            if let Some(hit) = hit_bar(pos, &bar.geom, row_height, bar.issue_id) {
                return hit;
            }
        }
        Hit::Background
    }

    fn session_for(&self, ids: &[IssueId], pos: Pos2) -> DragSession {
        DragSession {
            anchor: pos,
            originals: ids
                .iter()
                .filter_map(|id| self.bar(*id).map(|b| (*id, b.geom)))
                .collect(),
            scroll_at_start: self.scroll_px,
        }
    }

    fn start_move(&mut self, id: IssueId, pos: Pos2) {
        self.gesture = Gesture::Moving {
            issue_id: id,
            session: self.session_for(&[id], pos),
        };
    }

    fn start_resize(&mut self, id: IssueId, side: ResizeSide, pos: Pos2) {
        if self.bar_is_aggregate(id) {
            return;
        }
        self.gesture = Gesture::Resizing {
            issue_id: id,
            side,
            session: self.session_for(&[id], pos),
        };
    }

    fn start_bulk_move(&mut self, pos: Pos2) {
        let ids = self.selection.ids();
        self.gesture = Gesture::BulkMoving {
            session: self.session_for(&ids, pos),
            ids,
        };
    }

    fn start_link(&mut self, id: IssueId, anchor: AnchorSide, pos: Pos2) {
        let Some(bar) = self.bar(id) else {
            return;
        };
        let origin = self.anchor_point(bar, anchor);
        let mut session = LinkSession::new(id, anchor, origin);
        session.pointer = pos;
        self.gesture = Gesture::Linking { session };
    }

    fn update_selection(&mut self, id: IssueId, modifiers: Modifiers) {
        if modifiers.ctrl {
            self.selection.toggle(id);
        } else if modifiers.shift {
            let range = self.display_range(self.selection.anchor(), id);
            self.selection.select_range(range);
        } else {
            self.selection.select(id);
            if let Some(bar) = self.bar(id) {
                self.outbox.push(HostCommand::SetSelectedKey {
                    collapse_key: bar.collapse_key.clone(),
                });
            }
        }
    }

    /// Issue ids of visible bars between two rows, inclusive, in display
    /// order.
    fn display_range(&self, anchor: Option<IssueId>, clicked: IssueId) -> Vec<IssueId> {
        let Some(anchor) = anchor else {
            return vec![clicked];
        };
        let index_of = |id: IssueId| {
            self.bar(id)
                .and_then(|b| self.rows.display_index(&b.collapse_key))
        };
        let (Some(a), Some(b)) = (index_of(anchor), index_of(clicked)) else {
            return vec![clicked];
        };
        let (lo, hi) = (a.min(b), a.max(b));
        self.bars
            .iter()
            .filter(|bar| bar.visible)
            .filter(|bar| {
                self.rows
                    .display_index(&bar.collapse_key)
                    .map(|i| i >= lo && i <= hi)
                    .unwrap_or(false)
            })
            .map(|bar| bar.issue_id)
            .collect()
    }

    fn process_pointer(&mut self, pos: Pos2) {
        match &mut self.gesture {
            Gesture::Idle => {}
            Gesture::Moving { issue_id, session } => {
                let id = *issue_id;
                let dx = pos.x - session.anchor.x;
                if let Some(orig) = session.original_of(id) {
                    let geom = drag::moved_geom(orig, dx, &self.scale);
                    if let Some(&i) = self.bar_index.get(&id) {
                        self.bars[i].geom = geom;
                    }
                }
            }
            Gesture::Resizing {
                issue_id,
                side,
                session,
            } => {
                let id = *issue_id;
                let side = *side;
                let dx = pos.x - session.anchor.x;
                if let Some(orig) = session.original_of(id) {
                    let geom = drag::resized_geom(orig, side, dx, &self.scale);
                    if let Some(&i) = self.bar_index.get(&id) {
                        self.bars[i].geom = geom;
                    }
                }
            }
            Gesture::BulkMoving { session, .. } => {
                let dx = pos.x - session.anchor.x;
                let delta = drag::bulk_delta(dx, &self.scale);
                let originals = session.originals.clone();
                for (id, orig) in originals {
                    let geom = drag::bulk_moved_geom(orig, delta, &self.scale);
                    if let Some(&i) = self.bar_index.get(&id) {
                        self.bars[i].geom = geom;
                    }
                }
            }
            Gesture::Linking { session } => {
                session.pointer = pos;
                session.candidate = Self::bar_under(&self.bars, &self.rows, pos, session.from);
            }
        }
    }

    fn bar_under(
        bars: &[TimelineBar],
        rows: &RowIndex,
        pos: Pos2,
        exclude: IssueId,
    ) -> Option<IssueId> {
        bars.iter()
            .filter(|b| b.visible && b.issue_id != exclude)
            .find(|b| {
                let h = rows.get(&b.collapse_key).map(|n| n.height).unwrap_or(DEFAULT_ROW_HEIGHT);
                pos.y >= b.geom.row_y
                    && pos.y <= b.geom.row_y + h
                    && pos.x >= b.geom.start_x
                    && pos.x <= b.geom.end_x
            })
            .map(|b| b.issue_id)
    }

    // ── Release handling ─────────────────────────────────────────────────

    fn finish_single_drag(&mut self, issue_id: IssueId, session: DragSession) {
        let Some(orig) = session.original_of(issue_id) else {
            return;
        };
        let Some(&i) = self.bar_index.get(&issue_id) else {
            return;
        };
        let candidate = self.bars[i].geom;
        if candidate == orig {
            // No effective change: silent restore, no host call.
            return;
        }
        let (old_start, old_due) = drag::geom_dates(&orig, &self.scale);
        let (new_start, new_due) = drag::geom_dates(&candidate, &self.scale);
        let change = DateChange {
            issue_id,
            old_start,
            old_due,
            new_start,
            new_due,
        };
        let plan = CommitPlan {
            action: UndoAction::SingleDateChange(change.clone()),
            commands: vec![HostCommand::UpdateDates {
                issue_id,
                start_date: new_start,
                due_date: new_due,
            }],
            rollback: vec![(issue_id, orig)],
            scroll_restore: Some(session.scroll_at_start),
        };
        let summary =
            drag::change_summary(issue_id, (old_start, old_due), (new_start, new_due));
        self.submit(plan, summary);
    }

    fn finish_bulk_drag(&mut self, ids: &[IssueId], session: DragSession) {
        let mut changes = Vec::new();
        let mut commands = Vec::new();
        let mut rollback = Vec::new();
        for id in ids {
            let (Some(orig), Some(&i)) = (session.original_of(*id), self.bar_index.get(id))
            else {
                continue;
            };
            let candidate = self.bars[i].geom;
            if candidate == orig {
                continue;
            }
            let (old_start, old_due) = drag::geom_dates(&orig, &self.scale);
            let (new_start, new_due) = drag::geom_dates(&candidate, &self.scale);
            changes.push(DateChange {
                issue_id: *id,
                old_start,
                old_due,
                new_start,
                new_due,
            });
            commands.push(HostCommand::UpdateDates {
                issue_id: *id,
                start_date: new_start,
                due_date: new_due,
            });
            rollback.push((*id, orig));
        }
        if changes.is_empty() {
            return;
        }
        let summary = changes
            .iter()
            .map(|c| {
                drag::change_summary(c.issue_id, (c.old_start, c.old_due), (c.new_start, c.new_due))
            })
            .collect::<Vec<_>>()
            .join("\n");
        let plan = CommitPlan {
            action: UndoAction::BulkDateChange { changes },
            commands,
            rollback,
            scroll_restore: Some(session.scroll_at_start),
        };
        self.submit(plan, summary);
    }

    /// Route a finished edit through the gate, or commit straight away in
    /// draft mode.
    fn submit(&mut self, plan: CommitPlan, summary: String) {
        if self.flags.draft_mode {
            self.commit(plan);
        } else {
            self.gate.request(summary, plan);
        }
    }

    fn commit(&mut self, plan: CommitPlan) {
        self.history.record(plan.action);
        for command in plan.commands {
            self.outbox.push(command);
        }
    }

    fn roll_back(&mut self, plan: CommitPlan) {
        for (id, geom) in plan.rollback {
            if let Some(&i) = self.bar_index.get(&id) {
                self.bars[i].geom = geom;
            }
        }
        if let Some(scroll) = plan.scroll_restore {
            self.scroll_px = scroll;
            self.scroll_dirty = true;
        }
    }

    fn gate_input(&mut self, input: GateInput) {
        match self.gate.resolve(input) {
            Some(GateOutcome::Confirmed(plan)) => self.commit(plan),
            Some(GateOutcome::Cancelled(plan)) => self.roll_back(plan),
            None => return,
        }
        self.rebuild_frame();
    }

    fn finish_link(&mut self, session: LinkSession) {
        let Some(target) = session.candidate else {
            return; // dropped on empty space
        };
        if target == session.from {
            return;
        }
        let Some(bar) = self.bar(target) else {
            return;
        };
        let to_anchor = link::target_anchor(session.pointer.x, &bar.geom);
        self.pending_relation = Some(RelationPrompt::from_drop(&session, target, to_anchor));
    }

    fn set_bar_visibility(&mut self, key: &CollapseKey, visible: bool) {
        for bar in self.bars.iter_mut().filter(|b| b.collapse_key == *key) {
            bar.visible = visible;
            if visible {
                if let Some(node) = self.rows.get(key) {
                    bar.geom.row_y = node.y;
                }
            }
        }
    }

    // ── Frame assembly ───────────────────────────────────────────────────

    fn anchor_point(&self, bar: &TimelineBar, side: AnchorSide) -> Pos2 {
        let row_height = self.row_height_of(&bar.collapse_key);
        let x = match side {
            AnchorSide::Start => bar.geom.start_x,
            AnchorSide::End => bar.geom.end_x,
        };
        Pos2::new(x, bar.geom.row_y + row_height / 2.0)
    }

    fn dragged_ids(&self) -> Vec<IssueId> {
        match &self.gesture {
            Gesture::Moving { issue_id, .. } | Gesture::Resizing { issue_id, .. } => {
                vec![*issue_id]
            }
            Gesture::BulkMoving { ids, .. } => ids.clone(),
            _ => Vec::new(),
        }
    }

    fn rebuild_frame(&mut self) {
        let dragged = self.dragged_ids();
        let mut frame = FrameOutput::default();

        for bar in self.bars.iter().filter(|b| b.visible) {
            let row_height = self.row_height_of(&bar.collapse_key);
            let rect = Rect::from_min_size(
                Pos2::new(bar.geom.start_x, bar.geom.row_y + BAR_INSET),
                Vec2::new(bar.geom.width(), row_height - BAR_INSET * 2.0),
            );
            frame.bars.push(BarDirective {
                issue_id: bar.issue_id,
                rect,
                progress_split: bar.geom.start_x + bar.geom.width() * bar.progress,
                is_aggregate: bar.is_aggregate,
                selected: self.selection.contains(bar.issue_id),
                dragging: dragged.contains(&bar.issue_id),
                label_pos: Pos2::new(bar.geom.end_x + LABEL_GAP, rect.center().y),
                name: bar.name.clone(),
            });
        }

        frame.guides = self.rows.indent_guides();

        for relation in &self.relations {
            let (Some(from), Some(to)) = (self.bar(relation.from), self.bar(relation.to)) else {
                continue;
            };
            if !from.visible || !to.visible {
                continue;
            }
            let path = route_arrow(
                self.anchor_point(from, relation.from_anchor),
                self.anchor_point(to, relation.to_anchor),
                relation.from_anchor,
                relation.to_anchor,
                relation.kind.is_scheduling(),
            );
            frame.arrows.push(ArrowDirective {
                from: relation.from,
                to: relation.to,
                kind: relation.kind,
                path,
            });
        }

        match &self.gesture {
            Gesture::Idle => {}
            Gesture::Moving { issue_id, .. } => {
                frame.cursor = CursorIcon::Grabbing;
                frame.tooltip = self.drag_tooltip(*issue_id);
            }
            Gesture::BulkMoving { ids, .. } => {
                frame.cursor = CursorIcon::Grabbing;
                if let Some(id) = ids.first() {
                    frame.tooltip = self.drag_tooltip(*id);
                }
            }
            Gesture::Resizing { issue_id, .. } => {
                frame.cursor = CursorIcon::ResizeHorizontal;
                frame.tooltip = self.drag_tooltip(*issue_id);
            }
            Gesture::Linking { session } => {
                frame.cursor = CursorIcon::Crosshair;
                frame.link_guide = Some(LinkGuide {
                    from: session.origin,
                    to: session.pointer,
                    drop_candidate: session.candidate,
                });
            }
        }

        self.frame = frame;
    }

    /// Live date tooltip next to the dragged bar.
    fn drag_tooltip(&self, issue_id: IssueId) -> Option<Tooltip> {
        let bar = self.bar(issue_id)?;
        let (start, due) = drag::geom_dates(&bar.geom, &self.scale);
        Some(Tooltip {
            pos: Pos2::new(bar.geom.end_x + LABEL_GAP, bar.geom.row_y),
            text: drag::format_span(start, due),
        })
    }
}
