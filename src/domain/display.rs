/*
Presentation model of a forest: a nested tree of plain values, detached from
the arena. Collaborators render it as text (termtree) or JSON (serde).
 */
use std::collections::HashMap;

use generational_arena::Index;
use serde::Serialize;
use termtree::Tree;
use tracing::instrument;

use crate::domain::forest::Forest;
use crate::domain::node::TreeNode;

/// One node of the display tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayNode {
    pub id: String,
    pub label: String,
    pub tombstoned: bool,
    pub children: Vec<DisplayNode>,
}

impl DisplayNode {
    fn leaf(node: &TreeNode) -> Self {
        Self {
            id: node.id().to_string(),
            label: node.value().to_string(),
            tombstoned: node.is_tombstoned(),
            children: Vec::new(),
        }
    }

    /// Map `node` and all its descendants.
    pub fn from_node(forest: &Forest, node: &TreeNode) -> Self {
        let walk: Vec<_> = forest.iter_from(node.id()).collect();
        let Some(&(top, _)) = walk.first() else {
            return Self::leaf(node);
        };
        let mut built = assemble(&walk);
        built.remove(&top).unwrap_or_else(|| Self::leaf(node))
    }
}

/// Build display nodes from a pre-order walk, children before parents.
///
/// Every entry ends up in the map, nested under its parent when the parent
/// is part of the walk.
fn assemble(walk: &[(Index, &TreeNode)]) -> HashMap<Index, DisplayNode> {
    let mut built: HashMap<Index, DisplayNode> = HashMap::with_capacity(walk.len());
    for &(idx, node) in walk.iter().rev() {
        let mut display = DisplayNode::leaf(node);
        display.children = node
            .children()
            .iter()
            .filter_map(|c| built.remove(c))
            .collect();
        built.insert(idx, display);
    }
    built
}

/// Display tree of every root, tombstoned nodes included.
#[instrument(level = "debug", skip(forest))]
pub fn display_forest(forest: &Forest) -> Vec<DisplayNode> {
    let walk: Vec<_> = forest.iter().collect();
    let roots: Vec<Index> = walk
        .iter()
        .filter(|(_, node)| node.is_root())
        .map(|&(idx, _)| idx)
        .collect();
    let mut built = assemble(&walk);
    roots.iter().filter_map(|idx| built.remove(idx)).collect()
}

/// Drop tombstoned nodes (and with them their subtrees).
pub fn retain_live(mut nodes: Vec<DisplayNode>) -> Vec<DisplayNode> {
    let mut pending: Vec<&mut Vec<DisplayNode>> = vec![&mut nodes];
    while let Some(level) = pending.pop() {
        level.retain(|n| !n.tombstoned);
        pending.extend(level.iter_mut().map(|n| &mut n.children));
    }
    nodes
}

pub trait TreeNodeConvert {
    fn to_tree_string(&self) -> Tree<String>;
}

impl TreeNodeConvert for DisplayNode {
    fn to_tree_string(&self) -> Tree<String> {
        let short_id: String = self.id.chars().take(8).collect();
        let text = if self.tombstoned {
            format!("{} [{}] (deleted)", self.label, short_id)
        } else {
            format!("{} [{}]", self.label, short_id)
        };

        let leaves: Vec<_> = self.children.iter().map(|c| c.to_tree_string()).collect();

        Tree::new(text).with_leaves(leaves)
    }
}

/// Text tree titled `title` with one branch per root.
pub fn forest_tree(title: &str, nodes: &[DisplayNode]) -> Tree<String> {
    if nodes.is_empty() {
        return Tree::new(format!("{title} (empty)"));
    }
    Tree::new(title.to_string()).with_leaves(nodes.iter().map(|n| n.to_tree_string()))
}
