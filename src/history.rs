//! Undo/redo over schedule edits.
//!
//! Two LIFO stacks of self-invertible actions. Undoing/redoing never
//! mutates engine geometry directly: each step emits the corresponding
//! host commands through the outbox and the host pushes a corrective
//! render back, the same path every other edit takes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::{IssueId, RelationId, RelationKind};
use crate::outbox::{HostCommand, Outbox};

/// One issue's date change, the unit shared by single and bulk edits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateChange {
    pub issue_id: IssueId,
    pub old_start: NaiveDate,
    pub old_due: NaiveDate,
    pub new_start: NaiveDate,
    pub new_due: NaiveDate,
}

impl DateChange {
    fn inverted(&self) -> Self {
        Self {
            issue_id: self.issue_id,
            old_start: self.new_start,
            old_due: self.new_due,
            new_start: self.old_start,
            new_due: self.old_due,
        }
    }

    fn command(&self) -> HostCommand {
        HostCommand::UpdateDates {
            issue_id: self.issue_id,
            start_date: self.new_start,
            due_date: self.new_due,
        }
    }
}

/// A reversible edit. Applying an action means emitting the host commands
/// that realize its "new" side; the inverse swaps old and new.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UndoAction {
    SingleDateChange(DateChange),
    BulkDateChange { changes: Vec<DateChange> },
    RelationCreate {
        /// Correlates the server-assigned id arriving after creation.
        client_token: u64,
        /// None until the server acknowledges.
        relation_id: Option<RelationId>,
        from: IssueId,
        to: IssueId,
        kind: RelationKind,
        delay: Option<i64>,
    },
    RelationDelete {
        /// None when inverted from a create the server has not
        /// acknowledged yet; `emit` has nothing to delete with then.
        relation_id: Option<RelationId>,
        from: IssueId,
        to: IssueId,
        kind: RelationKind,
        delay: Option<i64>,
    },
}

impl UndoAction {
    pub fn inverted(&self) -> UndoAction {
        match self {
            Self::SingleDateChange(change) => Self::SingleDateChange(change.inverted()),
            Self::BulkDateChange { changes } => Self::BulkDateChange {
                changes: changes.iter().map(DateChange::inverted).collect(),
            },
            Self::RelationCreate {
                relation_id,
                from,
                to,
                kind,
                delay,
                ..
            } => Self::RelationDelete {
                relation_id: *relation_id,
                from: *from,
                to: *to,
                kind: *kind,
                delay: *delay,
            },
            Self::RelationDelete {
                relation_id,
                from,
                to,
                kind,
                delay,
            } => Self::RelationCreate {
                client_token: 0,
                relation_id: *relation_id,
                from: *from,
                to: *to,
                kind: *kind,
                delay: *delay,
            },
        }
    }

    /// Emit the host commands that apply this action forward.
    fn emit(&self, outbox: &mut Outbox) {
        match self {
            Self::SingleDateChange(change) => outbox.push(change.command()),
            Self::BulkDateChange { changes } => {
                for change in changes {
                    outbox.push(change.command());
                }
            }
            Self::RelationCreate {
                client_token,
                from,
                to,
                kind,
                delay,
                ..
            } => outbox.push(HostCommand::CreateRelation {
                issue_id: *from,
                target_issue_id: *to,
                relation_type: *kind,
                delay: *delay,
                client_token: *client_token,
            }),
            Self::RelationDelete { relation_id, .. } => match relation_id {
                Some(id) => outbox.push(HostCommand::DeleteRelation { relation_id: *id }),
                None => log::warn!("relation delete skipped: server id not assigned yet"),
            },
        }
    }
}

/// Two-stack undo history. Serializable so the host can persist it across
/// renders.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UndoHistory {
    undo: Vec<UndoAction>,
    redo: Vec<UndoAction>,
    next_token: u64,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh client token for correlating an async relation id.
    pub fn next_client_token(&mut self) -> u64 {
        self.next_token += 1;
        self.next_token
    }

    /// Record a freshly-performed action. Always clears the redo stack.
    pub fn record(&mut self, action: UndoAction) {
        self.undo.push(action);
        self.redo.clear();
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Pop the newest action, emit its inverse, and park it for redo.
    pub fn undo(&mut self, outbox: &mut Outbox) -> bool {
        let Some(action) = self.undo.pop() else {
            return false;
        };
        action.inverted().emit(outbox);
        self.redo.push(action);
        true
    }

    /// Reapply the most recently undone action.
    pub fn redo(&mut self, outbox: &mut Outbox) -> bool {
        let Some(action) = self.redo.pop() else {
            return false;
        };
        action.emit(outbox);
        self.undo.push(action);
        true
    }

    /// External edit sources may push actions into the shared history.
    pub fn push_external(&mut self, action: UndoAction) {
        self.record(action);
    }

    /// Drop the newest action without emitting anything.
    pub fn pop_external(&mut self) -> Option<UndoAction> {
        self.undo.pop()
    }

    /// Patch the server-assigned relation id into whichever stack holds
    /// the matching create action.
    pub fn assign_relation_id(&mut self, client_token: u64, id: RelationId) {
        for action in self.undo.iter_mut().chain(self.redo.iter_mut()) {
            if let UndoAction::RelationCreate {
                client_token: token,
                relation_id,
                ..
            } = action
            {
                if *token == client_token {
                    *relation_id = Some(id);
                    return;
                }
            }
        }
        log::warn!("relation id {id} arrived for unknown client token {client_token}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn date_change() -> UndoAction {
        UndoAction::SingleDateChange(DateChange {
            issue_id: 42,
            old_start: day(1),
            old_due: day(5),
            new_start: day(2),
            new_due: day(6),
        })
    }

    #[test]
    fn undo_emits_old_dates_redo_emits_new() {
        let mut history = UndoHistory::new();
        let mut outbox = Outbox::default();
        history.record(date_change());

        assert!(history.undo(&mut outbox));
        assert_eq!(
            outbox.drain(),
            vec![HostCommand::UpdateDates {
                issue_id: 42,
                start_date: day(1),
                due_date: day(5),
            }]
        );

        assert!(history.redo(&mut outbox));
        assert_eq!(
            outbox.drain(),
            vec![HostCommand::UpdateDates {
                issue_id: 42,
                start_date: day(2),
                due_date: day(6),
            }]
        );
    }

    #[test]
    fn record_clears_redo() {
        let mut history = UndoHistory::new();
        let mut outbox = Outbox::default();
        history.record(date_change());
        history.undo(&mut outbox);
        assert!(history.can_redo());
        history.record(date_change());
        assert!(!history.can_redo());
    }

    #[test]
    fn bulk_undo_inverts_element_wise() {
        let mut history = UndoHistory::new();
        let mut outbox = Outbox::default();
        history.record(UndoAction::BulkDateChange {
            changes: vec![
                DateChange {
                    issue_id: 1,
                    old_start: day(1),
                    old_due: day(2),
                    new_start: day(3),
                    new_due: day(4),
                },
                DateChange {
                    issue_id: 2,
                    old_start: day(5),
                    old_due: day(6),
                    new_start: day(7),
                    new_due: day(8),
                },
            ],
        });
        history.undo(&mut outbox);
        let commands = outbox.drain();
        assert_eq!(commands.len(), 2);
        assert_eq!(
            commands[0],
            HostCommand::UpdateDates {
                issue_id: 1,
                start_date: day(1),
                due_date: day(2),
            }
        );
    }

    #[test]
    fn relation_create_undo_waits_for_server_id() {
        let mut history = UndoHistory::new();
        let mut outbox = Outbox::default();
        let token = history.next_client_token();
        history.record(UndoAction::RelationCreate {
            client_token: token,
            relation_id: None,
            from: 1,
            to: 2,
            kind: RelationKind::Precedes,
            delay: None,
        });

        // Undo before the id arrives: nothing to delete with.
        history.undo(&mut outbox);
        assert!(outbox.is_empty());
        history.redo(&mut outbox);
        outbox.drain();

        history.assign_relation_id(token, 901);
        history.undo(&mut outbox);
        assert_eq!(
            outbox.drain(),
            vec![HostCommand::DeleteRelation { relation_id: 901 }]
        );
    }

    #[test]
    fn unassigned_create_inverts_to_an_unsendable_delete() {
        let action = UndoAction::RelationCreate {
            client_token: 7,
            relation_id: None,
            from: 1,
            to: 2,
            kind: RelationKind::Relates,
            delay: None,
        };
        assert!(matches!(
            action.inverted(),
            UndoAction::RelationDelete {
                relation_id: None,
                ..
            }
        ));
    }

    #[test]
    fn relation_delete_undo_recreates() {
        let mut history = UndoHistory::new();
        let mut outbox = Outbox::default();
        history.record(UndoAction::RelationDelete {
            relation_id: Some(55),
            from: 1,
            to: 2,
            kind: RelationKind::Blocks,
            delay: Some(2),
        });
        history.undo(&mut outbox);
        let commands = outbox.drain();
        assert!(matches!(
            commands[0],
            HostCommand::CreateRelation {
                issue_id: 1,
                target_issue_id: 2,
                relation_type: RelationKind::Blocks,
                delay: Some(2),
                ..
            }
        ));
        // Serializable for host persistence.
        let json = serde_json::to_string(&history).unwrap();
        let back: UndoHistory = serde_json::from_str(&json).unwrap();
        assert_eq!(back.redo_len(), 1);
    }
}
