//! Arena-based parameter tree: the in-memory form of an input deck.

use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::{DomainError, TreeResult};

/// Scalar payload of a parameter entry.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// `type="string"`
    Str(String),
    /// `type="double"`
    Double(f64),
    /// Any other declared type, kept verbatim so untouched entries round-trip.
    Other { ty: String, raw: String },
}

impl ParamValue {
    pub fn type_name(&self) -> &str {
        match self {
            ParamValue::Str(_) => "string",
            ParamValue::Double(_) => "double",
            ParamValue::Other { ty, .. } => ty,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            ParamValue::Double(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamValue::Str(s) => write!(f, "{}", s),
            // Debug formatting keeps the shortest round-trip form ("2.0", "1e-9")
            ParamValue::Double(v) => write!(f, "{:?}", v),
            ParamValue::Other { raw, .. } => write!(f, "{}", raw),
        }
    }
}

/// What a node holds: a scalar entry or an ordered list of children.
#[derive(Debug)]
pub enum NodeKind {
    Leaf(ParamValue),
    List(Vec<Index>),
}

/// Tree node stored in the arena.
#[derive(Debug)]
pub struct ParamNode {
    /// Entry name, unique among its siblings
    pub name: String,
    /// Index of parent node in the arena, None for the root
    pub parent: Option<Index>,
    /// Scalar payload or child indices
    pub kind: NodeKind,
}

impl ParamNode {
    pub fn is_list(&self) -> bool {
        matches!(self.kind, NodeKind::List(_))
    }

    pub fn value(&self) -> Option<&ParamValue> {
        match &self.kind {
            NodeKind::Leaf(v) => Some(v),
            NodeKind::List(_) => None,
        }
    }

    /// Child indices in document order, empty for scalar entries.
    pub fn children(&self) -> &[Index] {
        match &self.kind {
            NodeKind::List(children) => children,
            NodeKind::Leaf(_) => &[],
        }
    }
}

/// Owned handle to a subtree that has been unhooked from its parent.
///
/// The nodes stay in the arena; the handle must be re-attached exactly once
/// or passed to [`ParamTree::discard`], which frees the slots.
#[must_use = "a detached subtree must be re-attached or discarded"]
#[derive(Debug)]
pub struct DetachedNode {
    root: Index,
}

impl DetachedNode {
    /// Arena index of the subtree root.
    pub fn index(&self) -> Index {
        self.root
    }
}

/// Arena-based tree of named parameter lists and scalar entries.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Indices are only valid for the tree that produced them; methods taking an
/// [`Index`] panic if handed an index from another tree.
#[derive(Debug)]
pub struct ParamTree {
    /// Arena storage for all tree nodes
    arena: Arena<ParamNode>,
    /// Index of the root list
    root: Index,
}

impl ParamTree {
    /// Create a tree holding a single empty root list.
    pub fn new(root_name: &str) -> Self {
        let mut arena = Arena::new();
        let root = arena.insert(ParamNode {
            name: root_name.to_string(),
            parent: None,
            kind: NodeKind::List(Vec::new()),
        });
        Self { arena, root }
    }

    pub fn root(&self) -> Index {
        self.root
    }

    pub fn get_node(&self, idx: Index) -> Option<&ParamNode> {
        self.arena.get(idx)
    }

    /// Panics if `idx` does not belong to this tree.
    pub fn node(&self, idx: Index) -> &ParamNode {
        &self.arena[idx]
    }

    /// Look up a direct child of `list` by name.
    pub fn try_child(&self, list: Index, name: &str) -> Option<Index> {
        match &self.arena.get(list)?.kind {
            NodeKind::List(children) => children
                .iter()
                .copied()
                .find(|&c| self.arena.get(c).is_some_and(|n| n.name == name)),
            NodeKind::Leaf(_) => None,
        }
    }

    /// Append a scalar entry under `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn append_leaf(&mut self, parent: Index, name: &str, value: ParamValue) -> TreeResult<Index> {
        self.append_node(
            parent,
            ParamNode {
                name: name.to_string(),
                parent: Some(parent),
                kind: NodeKind::Leaf(value),
            },
        )
    }

    /// Append an empty sublist under `parent`.
    #[instrument(level = "trace", skip(self))]
    pub fn append_list(&mut self, parent: Index, name: &str) -> TreeResult<Index> {
        self.append_node(
            parent,
            ParamNode {
                name: name.to_string(),
                parent: Some(parent),
                kind: NodeKind::List(Vec::new()),
            },
        )
    }

    fn append_node(&mut self, parent: Index, node: ParamNode) -> TreeResult<Index> {
        let parent_name = {
            let p = self.node(parent);
            if !p.is_list() {
                return Err(DomainError::NotAList {
                    name: p.name.clone(),
                });
            }
            p.name.clone()
        };
        if self.try_child(parent, &node.name).is_some() {
            return Err(DomainError::DuplicateName {
                name: node.name.clone(),
                parent: parent_name,
            });
        }

        let idx = self.arena.insert(node);
        if let NodeKind::List(children) = &mut self.arena[parent].kind {
            children.push(idx);
        }
        Ok(idx)
    }

    /// Replace the payload of a scalar entry.
    #[instrument(level = "trace", skip(self))]
    pub fn set_value(&mut self, idx: Index, value: ParamValue) -> TreeResult<()> {
        let node = &mut self.arena[idx];
        match &mut node.kind {
            NodeKind::Leaf(v) => {
                *v = value;
                Ok(())
            }
            NodeKind::List(_) => Err(DomainError::TypeMismatch {
                name: node.name.clone(),
                expected: "scalar",
            }),
        }
    }

    /// Unhook the child named `name` from `parent`, keeping its subtree alive.
    #[instrument(level = "trace", skip(self))]
    pub fn detach_child(&mut self, parent: Index, name: &str) -> TreeResult<DetachedNode> {
        let child = self
            .try_child(parent, name)
            .ok_or_else(|| self.missing_child(parent, name))?;
        if let NodeKind::List(children) = &mut self.arena[parent].kind {
            children.retain(|&c| c != child);
        }
        self.arena[child].parent = None;
        Ok(DetachedNode { root: child })
    }

    /// Remove the child named `name` from `parent` and free its subtree.
    ///
    /// Returns `Ok(false)` when no such child exists.
    #[instrument(level = "trace", skip(self))]
    pub fn remove_child(&mut self, parent: Index, name: &str) -> TreeResult<bool> {
        let p = self.node(parent);
        if !p.is_list() {
            return Err(DomainError::NotAList {
                name: p.name.clone(),
            });
        }
        match self.try_child(parent, name) {
            Some(_) => {
                let detached = self.detach_child(parent, name)?;
                self.discard(detached);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Hook a detached subtree under `parent`, at the end of its children.
    ///
    /// On error (target is not a list, or already has an entry of that name)
    /// the subtree is discarded.
    #[instrument(level = "trace", skip(self))]
    pub fn attach(&mut self, parent: Index, node: DetachedNode) -> TreeResult<Index> {
        let idx = node.root;
        let name = self.node(idx).name.clone();

        let parent_node = self.node(parent);
        let check = if !parent_node.is_list() {
            Some(DomainError::NotAList {
                name: parent_node.name.clone(),
            })
        } else if self.try_child(parent, &name).is_some() {
            Some(DomainError::DuplicateName {
                name,
                parent: parent_node.name.clone(),
            })
        } else {
            None
        };
        if let Some(err) = check {
            self.discard(node);
            return Err(err);
        }

        self.arena[idx].parent = Some(parent);
        if let NodeKind::List(children) = &mut self.arena[parent].kind {
            children.push(idx);
        }
        Ok(idx)
    }

    /// Free all arena slots of a detached subtree.
    #[instrument(level = "trace", skip(self))]
    pub fn discard(&mut self, node: DetachedNode) {
        let mut stack = vec![node.root];
        while let Some(idx) = stack.pop() {
            if let Some(removed) = self.arena.remove(idx) {
                if let NodeKind::List(children) = removed.kind {
                    stack.extend(children);
                }
            }
        }
    }

    /// Pre-order traversal over `(index, node)` pairs, children in document order.
    pub fn iter(&self) -> TreeIterator<'_> {
        TreeIterator::new(self)
    }

    fn missing_child(&self, parent: Index, name: &str) -> DomainError {
        let p = self.node(parent);
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
    }

    fn subtree_eq(&self, a: Index, other: &ParamTree, b: Index) -> bool {
        let (na, nb) = match (self.arena.get(a), other.arena.get(b)) {
            (Some(x), Some(y)) => (x, y),
            _ => return false,
        };
        if na.name != nb.name {
            return false;
        }
        match (&na.kind, &nb.kind) {
            (NodeKind::Leaf(va), NodeKind::Leaf(vb)) => va == vb,
            (NodeKind::List(ca), NodeKind::List(cb)) => {
                ca.len() == cb.len()
                    && ca
                        .iter()
                        .zip(cb)
                        .all(|(&x, &y)| self.subtree_eq(x, other, y))
            }
            _ => false,
        }
    }
}

/// Structural equality: same names, same values, same child order.
/// Arena indices and vacancy layout do not participate.
impl PartialEq for ParamTree {
    fn eq(&self, other: &Self) -> bool {
        self.subtree_eq(self.root, other, other.root)
    }
}

pub struct TreeIterator<'a> {
    tree: &'a ParamTree,
    stack: Vec<Index>,
}

impl<'a> TreeIterator<'a> {
    fn new(tree: &'a ParamTree) -> Self {
        Self {
            tree,
            stack: vec![tree.root],
        }
    }
}

impl<'a> Iterator for TreeIterator<'a> {
    type Item = (Index, &'a ParamNode);

    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.stack.pop()?;
        let node = self.tree.arena.get(idx)?;
        // Push children in reverse order for left-to-right traversal
        if let NodeKind::List(children) = &node.kind {
            for &child in children.iter().rev() {
                self.stack.push(child);
            }
        }
        Some((idx, node))
    }
}
