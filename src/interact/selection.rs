//! Selected bars, feeding bulk move and bulk done-ratio edits.

use std::collections::HashSet;

use crate::model::IssueId;

#[derive(Debug, Default)]
pub struct SelectionSet {
    ids: HashSet<IssueId>,
    /// Anchor for range selection, in display order.
    anchor: Option<IssueId>,
}

impl SelectionSet {
    pub fn select(&mut self, id: IssueId) {
        self.ids.clear();
        self.ids.insert(id);
        self.anchor = Some(id);
    }

    /// Ctrl-click behavior.
    pub fn toggle(&mut self, id: IssueId) {
        if !self.ids.remove(&id) {
            self.ids.insert(id);
            self.anchor = Some(id);
        } else if self.anchor == Some(id) {
            self.anchor = self.ids.iter().copied().next();
        }
    }

    /// Shift-click behavior: the caller resolves display order between the
    /// anchor and the clicked row and hands over the covered ids.
    pub fn select_range(&mut self, range: impl IntoIterator<Item = IssueId>) {
        self.ids.clear();
        self.ids.extend(range);
    }

    pub fn anchor(&self) -> Option<IssueId> {
        self.anchor
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.anchor = None;
    }

    pub fn contains(&self, id: IssueId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// True when a drag on a member should become a bulk move.
    pub fn is_multi(&self) -> bool {
        self.ids.len() > 1
    }

    /// Members in stable order.
    pub fn ids(&self) -> Vec<IssueId> {
        let mut ids: Vec<IssueId> = self.ids.iter().copied().collect();
        ids.sort_unstable();
        ids
    }
}
