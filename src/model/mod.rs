pub mod bar;
pub mod payload;
pub mod relation;
pub mod scale;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use bar::{BarGeom, IssueId, TimelineBar};
pub use payload::{BarSpec, FeatureFlags, HostUpdate, RelationSpec, RenderPayload, RowSpec, StripeSpec};
pub use relation::{suggested_kind, AnchorSide, Relation, RelationId, RelationKind};
pub use scale::DateScale;

/// Stable identifier for a row/group, used to persist and look up
/// expand/collapse state. Assigned by the host (e.g. `"issue-42"`,
/// `"project-7"`); the engine never mints keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CollapseKey(pub String);

impl CollapseKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollapseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CollapseKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}
