//! Fire-and-forget engine → host commands.
//!
//! The engine enqueues an intent and never awaits a reply; the host reacts
//! later with a fresh render or an incremental update.

use std::collections::VecDeque;

use chrono::NaiveDate;
use serde::Serialize;

use crate::model::{CollapseKey, IssueId, RelationId, RelationKind};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum HostCommand {
    UpdateDates {
        issue_id: IssueId,
        start_date: NaiveDate,
        due_date: NaiveDate,
    },
    CreateRelation {
        issue_id: IssueId,
        target_issue_id: IssueId,
        relation_type: RelationKind,
        delay: Option<i64>,
        /// Correlates the eventual server-assigned relation id back to the
        /// undo entry.
        client_token: u64,
    },
    DeleteRelation {
        relation_id: RelationId,
    },
    BulkSetDoneRatio {
        issue_ids: Vec<IssueId>,
        percentage: u8,
    },
    CollapseStateSync {
        collapse_key: CollapseKey,
        is_expanded: bool,
    },
    SetSelectedKey {
        collapse_key: CollapseKey,
    },
    /// Local layout update was aborted; the host should push a full
    /// render.
    RequestFullRender,
}

#[derive(Debug, Default)]
pub struct Outbox {
    queue: VecDeque<HostCommand>,
}

impl Outbox {
    pub fn push(&mut self, command: HostCommand) {
        log::debug!("outbox: {command:?}");
        self.queue.push_back(command);
    }

    pub fn drain(&mut self) -> Vec<HostCommand> {
        self.queue.drain(..).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
