//! Hierarchical row index and collapse/expand layout.
//!
//! One arena of rows in display order plus derived parent/child indices.
//! The derived indices are built lazily from an idle callback; until then
//! every lookup falls back to a full scan of the arena, slower but giving
//! the same answers.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::model::{CollapseKey, RowSpec, StripeSpec};

/// Failures that would cause silent layout drift if ignored. The engine
/// reacts by requesting a full re-render from the host.
#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("unknown collapse key `{0}`")]
    UnknownKey(CollapseKey),
    #[error("no height contribution for `{node}` in stripe `{stripe}`")]
    MissingContribution {
        stripe: CollapseKey,
        node: CollapseKey,
    },
    #[error("zero height delta for non-empty branch under `{0}`")]
    InconsistentContribution(CollapseKey),
}

#[derive(Debug, Clone)]
pub struct RowNode {
    pub key: CollapseKey,
    pub parent: Option<CollapseKey>,
    pub y: f32,
    pub height: f32,
    pub expanded: bool,
    pub visible: bool,
    /// Height this row contributes to each ancestor stripe.
    pub contributions: HashMap<CollapseKey, f32>,
}

/// Result of one collapse/expand toggle, for the engine to apply to bars,
/// arrows and spanning containers.
#[derive(Debug, Clone, PartialEq)]
pub struct ToggleOutcome {
    pub key: CollapseKey,
    /// New expanded state of the toggled node.
    pub expanded: bool,
    /// Signed height change (positive on expand).
    pub delta: f32,
    pub shown: Vec<CollapseKey>,
    pub hidden: Vec<CollapseKey>,
    /// New vertical offset for every row that moved.
    pub new_offsets: Vec<(CollapseKey, f32)>,
}

/// The vertical tree line under an expanded row, spanning its visible
/// descendants. Depth tells the host how far to indent it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndentGuide {
    pub key: CollapseKey,
    pub depth: usize,
    pub top_y: f32,
    pub bottom_y: f32,
}

#[derive(Debug, Default)]
pub struct RowIndex {
    nodes: Vec<RowNode>,
    by_key: HashMap<CollapseKey, usize>,
    children: HashMap<usize, Vec<usize>>,
    index_built: bool,
}

impl RowIndex {
    pub fn from_specs(rows: &[RowSpec]) -> Self {
        let mut index = Self {
            nodes: rows
                .iter()
                .map(|r| RowNode {
                    key: r.collapse_key.clone(),
                    parent: r.parent.clone(),
                    y: r.y,
                    height: r.height,
                    expanded: r.expanded,
                    visible: true,
                    contributions: r.contributions.clone(),
                })
                .collect(),
            by_key: rows
                .iter()
                .enumerate()
                .map(|(i, r)| (r.collapse_key.clone(), i))
                .collect(),
            children: HashMap::new(),
            index_built: false,
        };
        for i in 0..index.nodes.len() {
            index.nodes[i].visible = index.ancestors_expanded(i, None);
        }
        index
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_index_built(&self) -> bool {
        self.index_built
    }

    /// Build the child adjacency cache. Deferred to an idle window so a
    /// large tree never delays the first frame.
    pub fn build_index(&mut self) {
        if self.index_built {
            return;
        }
        let mut children: HashMap<usize, Vec<usize>> = HashMap::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if let Some(parent) = node.parent.as_ref().and_then(|p| self.by_key.get(p)) {
                children.entry(*parent).or_default().push(i);
            }
        }
        self.children = children;
        self.index_built = true;
        log::debug!("row index built over {} rows", self.nodes.len());
    }

    pub fn get(&self, key: &CollapseKey) -> Option<&RowNode> {
        self.by_key.get(key).map(|i| &self.nodes[*i])
    }

    /// Display-order position of a row, the implicit index for range
    /// selection.
    pub fn display_index(&self, key: &CollapseKey) -> Option<usize> {
        self.by_key.get(key).copied()
    }

    pub fn node_at(&self, display_index: usize) -> Option<&RowNode> {
        self.nodes.get(display_index)
    }

    pub fn is_visible(&self, key: &CollapseKey) -> bool {
        self.get(key).map(|n| n.visible).unwrap_or(false)
    }

    fn children_of(&self, idx: usize) -> Vec<usize> {
        if self.index_built {
            self.children.get(&idx).cloned().unwrap_or_default()
        } else {
            // Fallback scan until the idle build has run.
            let key = &self.nodes[idx].key;
            self.nodes
                .iter()
                .enumerate()
                .filter(|(_, n)| n.parent.as_ref() == Some(key))
                .map(|(i, _)| i)
                .collect()
        }
    }

    /// True when every ancestor of `idx`, stopping below `until`, is
    /// expanded.
    fn ancestors_expanded(&self, idx: usize, until: Option<usize>) -> bool {
        let mut cursor = self.nodes[idx].parent.clone();
        while let Some(parent_key) = cursor {
            let Some(&p) = self.by_key.get(&parent_key) else {
                return false;
            };
            if Some(p) == until {
                return true;
            }
            if !self.nodes[p].expanded {
                return false;
            }
            cursor = self.nodes[p].parent.clone();
        }
        true
    }

    fn all_descendants(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        let mut stack = self.children_of(idx);
        stack.reverse();
        while let Some(i) = stack.pop() {
            out.push(i);
            let mut kids = self.children_of(i);
            kids.reverse();
            stack.extend(kids);
        }
        out
    }

    /// Pre-order descendants visible when `idx` itself is expanded:
    /// children always, deeper rows only through expanded branches.
    fn visible_descendants(&self, idx: usize) -> Vec<usize> {
        let mut out = Vec::new();
        self.walk_visible(idx, &mut out);
        out
    }

    fn walk_visible(&self, idx: usize, out: &mut Vec<usize>) {
        for child in self.children_of(idx) {
            out.push(child);
            if self.nodes[child].expanded {
                self.walk_visible(child, out);
            }
        }
    }

    /// Flip the expand/collapse state of `key` and recompute offsets.
    ///
    /// The height delta is summed from the per-stripe contribution table;
    /// a missing entry, or a zero sum over a non-empty branch, aborts with
    /// an error so the caller can fall back to a full re-render instead of
    /// drifting.
    pub fn toggle(
        &mut self,
        key: &CollapseKey,
        stripes: &mut StripeSpec,
    ) -> Result<ToggleOutcome, LayoutError> {
        let idx = *self
            .by_key
            .get(key)
            .ok_or_else(|| LayoutError::UnknownKey(key.clone()))?;
        let expanding = !self.nodes[idx].expanded;

        let affected = self.visible_descendants(idx);
        let mut outcome = ToggleOutcome {
            key: key.clone(),
            expanded: expanding,
            delta: 0.0,
            shown: Vec::new(),
            hidden: Vec::new(),
            new_offsets: Vec::new(),
        };

        if affected.is_empty() {
            self.nodes[idx].expanded = expanding;
            return Ok(outcome);
        }

        let mut magnitude = 0.0;
        for &d in &affected {
            let node = &self.nodes[d];
            let contribution =
                node.contributions
                    .get(key)
                    .ok_or_else(|| LayoutError::MissingContribution {
                        stripe: key.clone(),
                        node: node.key.clone(),
                    })?;
            magnitude += contribution;
        }
        if magnitude == 0.0 {
            return Err(LayoutError::InconsistentContribution(key.clone()));
        }
        let delta = if expanding { magnitude } else { -magnitude };

        // Shift rows below the toggled node that are outside its branch,
        // judged on original offsets.
        let branch: HashSet<usize> = self.all_descendants(idx).into_iter().collect();
        let pivot_y = self.nodes[idx].y;
        for i in 0..self.nodes.len() {
            if i == idx || branch.contains(&i) {
                continue;
            }
            if self.nodes[i].y > pivot_y {
                self.nodes[i].y += delta;
                outcome
                    .new_offsets
                    .push((self.nodes[i].key.clone(), self.nodes[i].y));
            }
        }

        if expanding {
            // Newly visible rows get strictly increasing offsets from the
            // toggled row downward.
            let mut cursor = pivot_y + self.nodes[idx].height;
            for &d in &affected {
                self.nodes[d].y = cursor;
                cursor += self.nodes[d].height;
                self.nodes[d].visible = true;
                outcome.shown.push(self.nodes[d].key.clone());
                outcome
                    .new_offsets
                    .push((self.nodes[d].key.clone(), self.nodes[d].y));
            }
        } else {
            // `affected` is exactly the visible part of the branch, in
            // pre-order, so `hidden` comes out deterministic.
            for &d in &affected {
                if self.nodes[d].visible {
                    self.nodes[d].visible = false;
                    outcome.hidden.push(self.nodes[d].key.clone());
                }
            }
        }

        self.nodes[idx].expanded = expanding;
        outcome.delta = delta;

        stripes.label_area_height += delta;
        stripes.timeline_height += delta;
        for column in &mut stripes.column_heights {
            *column += delta;
        }

        Ok(outcome)
    }

    fn depth_of(&self, idx: usize) -> usize {
        let mut depth = 0;
        let mut cursor = self.nodes[idx].parent.clone();
        while let Some(key) = cursor {
            let Some(&p) = self.by_key.get(&key) else {
                break;
            };
            depth += 1;
            cursor = self.nodes[p].parent.clone();
        }
        depth
    }

    /// One guide per visible expanded row with descendants on screen.
    /// Recomputed after every toggle, so a collapsed branch drops its
    /// guides along with its rows.
    pub fn indent_guides(&self) -> Vec<IndentGuide> {
        let mut out = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            if !node.visible || !node.expanded {
                continue;
            }
            let descendants = self.visible_descendants(i);
            let Some(&last) = descendants.last() else {
                continue;
            };
            out.push(IndentGuide {
                key: node.key.clone(),
                depth: self.depth_of(i),
                top_y: node.y + node.height,
                bottom_y: self.nodes[last].y + self.nodes[last].height,
            });
        }
        out
    }

    /// Visible rows sorted by vertical offset.
    pub fn visible_rows(&self) -> Vec<&RowNode> {
        let mut rows: Vec<&RowNode> = self.nodes.iter().filter(|n| n.visible).collect();
        rows.sort_by(|a, b| a.y.total_cmp(&b.y));
        rows
    }

    /// Check the post-toggle invariant: visible rows form a gapless,
    /// non-overlapping vertical sequence matching pre-order traversal of
    /// expanded branches.
    #[cfg(test)]
    pub fn assert_contiguous(&self) {
        let rows = self.visible_rows();
        for pair in rows.windows(2) {
            let expected = pair[0].y + pair[0].height;
            assert!(
                (pair[1].y - expected).abs() < 0.01,
                "gap between `{}` (ends {}) and `{}` (starts {})",
                pair[0].key,
                expected,
                pair[1].key,
                pair[1].y
            );
        }
    }
}
