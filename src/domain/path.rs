//! Path resolution and subtree relocation on [`ParamTree`].
//!
//! Paths are slices of entry names resolved from the root, e.g.
//! `["state", "evaluators"]`. Every resolved segment must be a parameter
//! list; scalar entries are only reachable through their parent list.

use generational_arena::Index;
use itertools::Itertools;
use tracing::instrument;

use crate::domain::error::{DomainError, TreeResult};
use crate::domain::tree::{ParamTree, ParamValue};

fn missing_path(path: &[&str]) -> DomainError {
    DomainError::MissingPath {
        path: path.iter().join("/"),
    }
}

impl ParamTree {
    /// Look up a direct child of `list` by name, or fail with context.
    pub fn child_by_name(&self, list: Index, name: &str) -> TreeResult<Index> {
        self.try_child(list, name).ok_or_else(|| {
            let p = self.node(list);
            if p.is_list() {
                DomainError::MissingName {
                    name: name.to_string(),
                    parent: p.name.clone(),
                }
            } else {
                DomainError::NotAList {
                    name: p.name.clone(),
                }
            }
        })
    }

    /// Resolve a list by walking `path` from the root.
    ///
    /// The empty path resolves to the root list. Fails with `MissingPath`
    /// when a segment is absent and `NotAList` when it names a scalar entry.
    pub fn find_path(&self, path: &[&str]) -> TreeResult<Index> {
        let mut cur = self.root();
        for (i, segment) in path.iter().enumerate() {
            cur = self
                .try_child(cur, segment)
                .ok_or_else(|| missing_path(&path[..=i]))?;
            if !self.node(cur).is_list() {
                return Err(DomainError::NotAList {
                    name: segment.to_string(),
                });
            }
        }
        Ok(cur)
    }

    /// Like [`ParamTree::find_path`] but absence is not an error.
    pub fn try_find_path(&self, path: &[&str]) -> Option<Index> {
        let mut cur = self.root();
        for segment in path {
            cur = self.try_child(cur, segment)?;
            if !self.node(cur).is_list() {
                return None;
            }
        }
        Some(cur)
    }

    /// Get the sublist named `name` under `list`, creating it when absent.
    #[instrument(level = "debug", skip(self))]
    pub fn sublist(&mut self, list: Index, name: &str) -> TreeResult<Index> {
        match self.try_child(list, name) {
            Some(idx) if self.node(idx).is_list() => Ok(idx),
            Some(_) => Err(DomainError::NotAList {
                name: name.to_string(),
            }),
            None => self.append_list(list, name),
        }
    }

    /// Remove the entry addressed by `path` and free its subtree.
    ///
    /// With `must_exist` unset, a missing segment anywhere along the path
    /// yields `Ok(false)` instead of an error.
    #[instrument(level = "debug", skip(self))]
    pub fn remove_at(&mut self, path: &[&str], must_exist: bool) -> TreeResult<bool> {
        let (last, parent_path) = path.split_last().ok_or_else(|| missing_path(path))?;
        let parent = match self.try_find_path(parent_path) {
            Some(idx) => idx,
            None => {
                if must_exist {
                    self.find_path(parent_path)?;
                }
                return Ok(false);
            }
        };
        if self.try_child(parent, last).is_none() {
            if must_exist {
                return Err(DomainError::MissingName {
                    name: last.to_string(),
                    parent: self.node(parent).name.clone(),
                });
            }
            return Ok(false);
        }
        self.remove_child(parent, last)
    }

    /// Move the entry at `from` to the end of the list at `to`.
    ///
    /// The destination is validated before anything is detached, so a failed
    /// move leaves the tree unchanged.
    #[instrument(level = "debug", skip(self))]
    pub fn move_subtree(&mut self, from: &[&str], to: &[&str]) -> TreeResult<Index> {
        let (last, parent_path) = from.split_last().ok_or_else(|| missing_path(from))?;
        let src_parent = self.find_path(parent_path)?;
        let src = self.child_by_name(src_parent, last)?;

        let dest = self.find_path(to)?;
        if self.try_child(dest, last).is_some() {
            return Err(DomainError::DuplicateName {
                name: last.to_string(),
                parent: self.node(dest).name.clone(),
            });
        }
        if dest == src || self.is_ancestor(src, dest) {
            return Err(DomainError::MoveIntoSelf {
                name: last.to_string(),
            });
        }

        let detached = self.detach_child(src_parent, last)?;
        self.attach(dest, detached)
    }

    /// Indices of the immediate child lists of `list`, in document order.
    ///
    /// Scalar children are skipped; this is how soil type sublists are
    /// enumerated.
    pub fn child_lists(&self, list: Index) -> Vec<Index> {
        self.node(list)
            .children()
            .iter()
            .copied()
            .filter(|&c| self.node(c).is_list())
            .collect()
    }

    /// Read the string entry named `name` under `list`.
    pub fn str_at(&self, list: Index, name: &str) -> TreeResult<&str> {
        let idx = self.child_by_name(list, name)?;
        self.node(idx)
            .value()
            .and_then(ParamValue::as_str)
            .ok_or(DomainError::TypeMismatch {
                name: name.to_string(),
                expected: "string",
            })
    }

    /// Read the double entry named `name` under `list`.
    pub fn double_at(&self, list: Index, name: &str) -> TreeResult<f64> {
        let idx = self.child_by_name(list, name)?;
        self.node(idx)
            .value()
            .and_then(ParamValue::as_double)
            .ok_or(DomainError::TypeMismatch {
                name: name.to_string(),
                expected: "double",
            })
    }

    /// Read an optional double entry: absent is `Ok(None)`, a present entry
    /// of another type is still an error.
    pub fn try_double_at(&self, list: Index, name: &str) -> TreeResult<Option<f64>> {
        match self.try_child(list, name) {
            None => Ok(None),
            Some(idx) => self
                .node(idx)
                .value()
                .and_then(ParamValue::as_double)
                .map(Some)
                .ok_or(DomainError::TypeMismatch {
                    name: name.to_string(),
                    expected: "double",
                }),
        }
    }

    /// Create or overwrite the scalar entry named `name` under `list`.
    #[instrument(level = "debug", skip(self))]
    pub fn set_leaf(&mut self, list: Index, name: &str, value: ParamValue) -> TreeResult<Index> {
        match self.try_child(list, name) {
            Some(idx) => {
                self.set_value(idx, value)?;
                Ok(idx)
            }
            None => self.append_leaf(list, name, value),
        }
    }

    fn is_ancestor(&self, ancestor: Index, node: Index) -> bool {
        let mut cur = self.node(node).parent;
        while let Some(idx) = cur {
            if idx == ancestor {
                return true;
            }
            cur = self.node(idx).parent;
        }
        false
    }
}
