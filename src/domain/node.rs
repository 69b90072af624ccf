//! Node identity, arena node, and the by-value transfer record.

use std::fmt;
use std::str::FromStr;

use generational_arena::{Arena, Index};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::error::{DomainError, DomainResult};

/// Longest label accepted by the value-mutation entry points.
pub const MAX_VALUE_LEN: usize = 10;

/// Unique identifier of a node, a random 128-bit token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(Uuid);

impl NodeId {
    /// Fresh random identifier.
    pub fn new_v4() -> Self {
        NodeId(Uuid::new_v4())
    }

    /// First eight hex digits, for compact display.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for NodeId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(NodeId)
    }
}

/// Check a label against the 1..=10 character rule.
///
/// Characters are counted as Unicode scalar values.
pub fn validate_value(id: Option<NodeId>, value: &str) -> DomainResult<()> {
    let length = value.chars().count();
    if length == 0 || length > MAX_VALUE_LEN {
        return Err(DomainError::InvalidValue { id, length });
    }
    Ok(())
}

/// Tree node in the arena-backed forest.
///
/// Parent and children are arena indices; the arena owns every node.
#[derive(Debug, Clone)]
pub struct TreeNode {
    id: NodeId,
    pub(crate) value: String,
    pub(crate) tombstoned: bool,
    /// Index of parent node in the arena, None for root nodes
    pub(crate) parent: Option<Index>,
    /// Indices of child nodes in insertion order
    pub(crate) children: Vec<Index>,
}

impl TreeNode {
    /// Detached node: no parent, no children.
    pub fn new(id: NodeId, value: impl Into<String>, tombstoned: bool) -> Self {
        Self {
            id,
            value: value.into(),
            tombstoned,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_tombstoned(&self) -> bool {
        self.tombstoned
    }

    pub fn parent(&self) -> Option<Index> {
        self.parent
    }

    pub fn children(&self) -> &[Index] {
        &self.children
    }

    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Wire `child` under `parent`.
///
/// Low-level primitive: the caller detaches `child` from its previous
/// container first.
pub(crate) fn attach_child(arena: &mut Arena<TreeNode>, parent: Index, child: Index) {
    if parent == child {
        return;
    }
    if let (Some(parent_node), Some(child_node)) = arena.get2_mut(parent, child) {
        child_node.parent = Some(parent);
        parent_node.children.push(child);
    }
}

/// A node copied out of a forest by value.
///
/// This is how nodes travel between forests: identifiers only, never shared
/// node objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    #[serde(default)]
    pub parent: Option<NodeId>,
    pub value: String,
    #[serde(default)]
    pub tombstoned: bool,
    #[serde(default)]
    pub children: Vec<NodeId>,
}

impl NodeRecord {
    pub fn new(id: NodeId, value: impl Into<String>) -> Self {
        Self {
            id,
            parent: None,
            value: value.into(),
            tombstoned: false,
            children: Vec::new(),
        }
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_children(mut self, children: Vec<NodeId>) -> Self {
        self.children = children;
        self
    }

    pub fn tombstoned(mut self, tombstoned: bool) -> Self {
        self.tombstoned = tombstoned;
        self
    }
}
