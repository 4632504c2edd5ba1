//! FILENAME: pivot-engine/src/expansion.rs
//! Expansion Tracker - which tree nodes are currently expanded.
//!
//! A plain set of `PathId`s with no knowledge of tree shape. It survives
//! tree rebuilds; a path that matches no node simply has no effect until a
//! node with that path appears again.

use rustc_hash::FxHashSet;

use crate::tree::PathId;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpansionState {
    expanded: FxHashSet<PathId>,
}

impl ExpansionState {
    pub fn new() -> Self {
        ExpansionState::default()
    }

    /// Flips the state of `path`. Two toggles restore the original state.
    /// Returns whether the path is expanded afterwards.
    pub fn toggle(&mut self, path: &PathId) -> bool {
        if self.expanded.remove(path) {
            false
        } else {
            self.expanded.insert(path.clone());
            true
        }
    }

    pub fn is_expanded(&self, path: &PathId) -> bool {
        self.expanded.contains(path)
    }

    pub fn expand(&mut self, path: PathId) {
        self.expanded.insert(path);
    }

    pub fn collapse(&mut self, path: &PathId) {
        self.expanded.remove(path);
    }

    /// Collapses everything.
    pub fn clear(&mut self) {
        self.expanded.clear();
    }

    pub fn len(&self) -> usize {
        self.expanded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expanded.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathId> {
        self.expanded.iter()
    }
}

impl FromIterator<PathId> for ExpansionState {
    fn from_iter<I: IntoIterator<Item = PathId>>(iter: I) -> Self {
        ExpansionState {
            expanded: iter.into_iter().collect(),
        }
    }
}
