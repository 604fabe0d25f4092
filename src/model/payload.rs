use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::history::UndoAction;

use super::{CollapseKey, IssueId, RelationId, RelationKind};

/// Feature flags carried by the render payload. Toggleable afterwards via
/// [`HostUpdate`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Queue edits immediately instead of confirming them.
    #[serde(default)]
    pub draft_mode: bool,
    /// Emit per-frame timing through the log facade.
    #[serde(default)]
    pub perf_debug: bool,
}

/// One row of the hierarchy, in display order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RowSpec {
    pub collapse_key: CollapseKey,
    pub parent: Option<CollapseKey>,
    /// Vertical offset of the row top, pixels.
    pub y: f32,
    /// Row height, pixels.
    pub height: f32,
    pub expanded: bool,
    /// Height this row contributes to each ancestor stripe, keyed by the
    /// stripe's collapse key.
    #[serde(default)]
    pub contributions: HashMap<CollapseKey, f32>,
}

/// One bar, tied to a row by collapse key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarSpec {
    pub issue_id: IssueId,
    pub collapse_key: CollapseKey,
    pub name: String,
    pub start_date: NaiveDate,
    pub due_date: NaiveDate,
    #[serde(default)]
    pub is_aggregate: bool,
    #[serde(default)]
    pub progress: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationSpec {
    pub id: Option<RelationId>,
    pub from: IssueId,
    pub to: IssueId,
    pub kind: RelationKind,
    #[serde(default)]
    pub delay: Option<i64>,
}

/// Heights of the spanning containers that grow and shrink with the row
/// area: the label column, each data column, and the timeline itself.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StripeSpec {
    pub label_area_height: f32,
    #[serde(default)]
    pub column_heights: Vec<f32>,
    pub timeline_height: f32,
}

/// A full render from the host. Replaces all engine state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderPayload {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub timeline_width: f32,
    pub rows: Vec<RowSpec>,
    pub bars: Vec<BarSpec>,
    #[serde(default)]
    pub relations: Vec<RelationSpec>,
    #[serde(default)]
    pub stripes: StripeSpec,
    #[serde(default)]
    pub flags: FeatureFlags,
}

/// Incremental host → engine updates between full renders.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "update", rename_all = "snake_case")]
pub enum HostUpdate {
    SetDraftMode { on: bool },
    SetPerfDebug { on: bool },
    /// Update one bar's done ratio in place.
    SetProgress { issue_id: IssueId, ratio: f32 },
    /// An edit recorded by an external source joins the local history.
    PushUndoAction { action: UndoAction },
    /// Drop the most recent local action (external source took it over).
    PopUndoAction,
    ScrollToIssue { issue_id: IssueId },
    /// The server acknowledged a locally-created relation.
    RelationIdAssigned {
        client_token: u64,
        relation_id: RelationId,
    },
}
