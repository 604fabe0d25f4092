//! Confirm-before-commit gate for schedule edits.
//!
//! Holds at most one pending edit. Exactly one outcome fires exactly once,
//! whether resolution comes from the dialog buttons, Enter/Escape, or a
//! click outside the dialog. Draft-mode callers bypass the gate entirely.

use crate::history::UndoAction;
use crate::model::{BarGeom, IssueId};
use crate::outbox::HostCommand;

/// Everything needed to either commit a drag or roll it back.
#[derive(Debug, Clone)]
pub struct CommitPlan {
    pub action: UndoAction,
    pub commands: Vec<HostCommand>,
    /// Committed geometry to restore on cancel.
    pub rollback: Vec<(IssueId, BarGeom)>,
    /// Scroll offset at gesture start, restored on cancel.
    pub scroll_restore: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateInput {
    Confirm,
    Cancel,
    Enter,
    Escape,
    OutsideClick,
}

#[derive(Debug)]
pub enum GateOutcome {
    Confirmed(CommitPlan),
    Cancelled(CommitPlan),
}

#[derive(Debug)]
struct PendingConfirm {
    message: String,
    plan: CommitPlan,
}

#[derive(Debug, Default)]
pub struct ConfirmGate {
    pending: Option<PendingConfirm>,
}

impl ConfirmGate {
    pub fn is_open(&self) -> bool {
        self.pending.is_some()
    }

    /// Human-readable summary of the pending edit, for the host dialog.
    pub fn message(&self) -> Option<&str> {
        self.pending.as_ref().map(|p| p.message.as_str())
    }

    pub fn request(&mut self, message: String, plan: CommitPlan) {
        if self.pending.is_some() {
            // A gesture cannot start while the modal is up; a stacked
            // request means the host dropped a resolution.
            log::warn!("confirmation requested while another is pending; replacing");
        }
        self.pending = Some(PendingConfirm { message, plan });
    }

    /// Resolve the pending edit. Returns `None` when nothing is pending,
    /// so a repeated Escape or stray click cannot double-fire.
    pub fn resolve(&mut self, input: GateInput) -> Option<GateOutcome> {
        let pending = self.pending.take()?;
        match input {
            GateInput::Confirm | GateInput::Enter => Some(GateOutcome::Confirmed(pending.plan)),
            GateInput::Cancel | GateInput::Escape | GateInput::OutsideClick => {
                Some(GateOutcome::Cancelled(pending.plan))
            }
        }
    }
}
