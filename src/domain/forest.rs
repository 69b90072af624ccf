use std::collections::HashMap;
use std::fmt;

use generational_arena::{Arena, Index};
use itertools::Itertools;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::node::{attach_child, validate_value, NodeId, NodeRecord, TreeNode};

/// Arena-based forest: any number of roots, nodes addressed by `NodeId`.
///
/// Nodes are never removed. Deleting a node sets its tombstone flag (and the
/// flags of its whole subtree), leaving structure and index untouched.
#[derive(Debug, Clone, Default)]
pub struct Forest {
    /// Arena storage for all nodes
    arena: Arena<TreeNode>,
    /// Identifier index of every node ever inserted
    index: HashMap<NodeId, Index>,
    /// Nodes without parent, in insertion order
    roots: Vec<Index>,
}

/// Outcome counters of a `Forest::merge` call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeReport {
    pub updated: usize,
    pub inserted: usize,
    pub tombstoned: usize,
}

impl fmt::Display for MergeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} updated, {} inserted, {} tombstoned",
            self.updated, self.inserted, self.tombstoned
        )
    }
}

impl Forest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    #[instrument(level = "trace", skip(self))]
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.index.get(&id).and_then(|&idx| self.arena.get(idx))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.index.contains_key(&id)
    }

    /// Alias of [`Forest::contains`].
    pub fn has_node(&self, id: NodeId) -> bool {
        self.contains(id)
    }

    /// Node by arena index, as found in `TreeNode::parent`/`children`.
    pub fn node(&self, idx: Index) -> Option<&TreeNode> {
        self.arena.get(idx)
    }

    pub fn parent_id(&self, node: &TreeNode) -> Option<NodeId> {
        node.parent().and_then(|p| self.node(p)).map(TreeNode::id)
    }

    pub fn child_ids(&self, node: &TreeNode) -> Vec<NodeId> {
        node.children()
            .iter()
            .filter_map(|&c| self.node(c))
            .map(TreeNode::id)
            .collect()
    }

    /// Current roots in insertion order.
    pub fn roots(&self) -> Vec<&TreeNode> {
        self.roots.iter().filter_map(|&r| self.node(r)).collect()
    }

    /// Pre-order traversal over every root in root order.
    pub fn iter(&self) -> PreOrderIter<'_> {
        PreOrderIter::new(self, self.roots.clone())
    }

    /// Pre-order traversal of the subtree at `id`; empty for unknown ids.
    pub fn iter_from(&self, id: NodeId) -> PreOrderIter<'_> {
        let starts = self.index.get(&id).copied().into_iter().collect();
        PreOrderIter::new(self, starts)
    }

    /// Pre-order flattening of the subtree at `id`, or of the whole forest
    /// when `id` is `None`. Unknown ids yield an empty list.
    #[instrument(level = "trace", skip(self))]
    pub fn subtree(&self, id: Option<NodeId>) -> Vec<&TreeNode> {
        match id {
            None => self.iter().map(|(_, node)| node).collect(),
            Some(id) => self.iter_from(id).map(|(_, node)| node).collect(),
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack: Vec<(Index, usize)> = self.roots.iter().map(|&r| (r, 1)).collect();
        while let Some((idx, level)) = stack.pop() {
            if let Some(node) = self.node(idx) {
                deepest = deepest.max(level);
                stack.extend(node.children.iter().map(|&c| (c, level + 1)));
            }
        }
        deepest
    }

    /// Insert a node, wiring it under `parent_id` and adopting `child_ids`.
    ///
    /// This is the bulk/import path and does not validate the value. An
    /// unknown `parent_id` makes the node a root; unknown child ids are
    /// skipped, as are child ids that are ancestors of the new node. A
    /// tombstoned node, or a node landing under a tombstoned parent, has its
    /// whole subtree (adopted children included) tombstoned.
    #[instrument(level = "debug", skip(self, value, child_ids))]
    pub fn insert(
        &mut self,
        id: NodeId,
        parent_id: Option<NodeId>,
        value: impl Into<String>,
        tombstoned: bool,
        child_ids: &[NodeId],
    ) -> DomainResult<()> {
        if self.index.contains_key(&id) {
            return Err(DomainError::DuplicateIdentifier(id));
        }

        self.insert_new(id, parent_id, value.into(), tombstoned, child_ids);
        Ok(())
    }

    /// Wire a node whose id is known to be absent from the index.
    fn insert_new(
        &mut self,
        id: NodeId,
        parent_id: Option<NodeId>,
        value: String,
        tombstoned: bool,
        child_ids: &[NodeId],
    ) {
        let node_idx = self.arena.insert(TreeNode::new(id, value, tombstoned));

        match parent_id.and_then(|p| self.index.get(&p).copied()) {
            Some(parent_idx) => attach_child(&mut self.arena, parent_idx, node_idx),
            None => {
                if let Some(missing) = parent_id {
                    debug!("parent {} not in forest, inserting {} as root", missing, id);
                }
                self.roots.push(node_idx);
            }
        }

        for child_id in child_ids {
            let Some(&child_idx) = self.index.get(child_id) else {
                debug!("child {} not in forest, skipped", child_id);
                continue;
            };
            if self.is_ancestor(child_idx, node_idx) {
                warn!("refusing to adopt ancestor {} under {}", child_id, id);
                continue;
            }
            self.detach(child_idx);
            attach_child(&mut self.arena, node_idx, child_idx);
        }

        let parent_tombstoned = self
            .node(node_idx)
            .and_then(TreeNode::parent)
            .and_then(|p| self.node(p))
            .is_some_and(TreeNode::is_tombstoned);
        if tombstoned || parent_tombstoned {
            self.tombstone_subtree(node_idx);
        }

        self.index.insert(id, node_idx);
    }

    /// Insert a record as produced by [`Forest::records`].
    pub fn insert_record(&mut self, record: &NodeRecord) -> DomainResult<()> {
        self.insert(
            record.id,
            record.parent,
            record.value.clone(),
            record.tombstoned,
            &record.children,
        )
    }

    /// Replace the value of an existing node.
    #[instrument(level = "debug", skip(self))]
    pub fn set_value(&mut self, id: NodeId, new_value: &str) -> DomainResult<()> {
        let idx = *self.index.get(&id).ok_or(DomainError::NotFound(id))?;
        validate_value(Some(id), new_value)?;
        if let Some(node) = self.arena.get_mut(idx) {
            node.value = new_value.to_string();
        }
        Ok(())
    }

    /// Tombstone the node and its entire subtree. Returns false for unknown ids.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, id: NodeId) -> bool {
        match self.index.get(&id) {
            Some(&idx) => {
                let count = self.tombstone_subtree(idx);
                debug!("tombstoned {} node(s) under {}", count, id);
                true
            }
            None => false,
        }
    }

    /// By-value copy of a single node.
    pub fn record(&self, id: NodeId) -> Option<NodeRecord> {
        self.get(id).map(|node| self.to_record(node))
    }

    /// By-value copy of `subtree(id)`, in the same pre-order.
    pub fn records(&self, id: Option<NodeId>) -> Vec<NodeRecord> {
        self.subtree(id)
            .into_iter()
            .map(|node| self.to_record(node))
            .collect()
    }

    /// Reconcile a flat list of records into this forest.
    ///
    /// Every value is validated before anything is touched; a rejected value
    /// fails the whole batch with the forest unchanged. Records whose id is
    /// known update the value (and cascade a tombstone when flagged); unknown
    /// ids are inserted as by [`Forest::insert`]. A later record with the id
    /// of an earlier inserted one updates it.
    #[instrument(level = "debug", skip(self, incoming), fields(records = incoming.len()))]
    pub fn merge(&mut self, incoming: &[NodeRecord]) -> DomainResult<MergeReport> {
        for record in incoming {
            validate_value(Some(record.id), &record.value)?;
        }

        let report = self.apply_records(incoming);
        info!("merged {} record(s): {}", incoming.len(), report);
        Ok(report)
    }

    /// Application pass of [`Forest::merge`]; cannot fail once values are
    /// validated.
    fn apply_records(&mut self, incoming: &[NodeRecord]) -> MergeReport {
        let mut report = MergeReport::default();
        for record in incoming {
            match self.index.get(&record.id).copied() {
                Some(idx) => {
                    if let Some(node) = self.arena.get_mut(idx) {
                        node.value = record.value.clone();
                    }
                    report.updated += 1;
                    if record.tombstoned {
                        self.tombstone_subtree(idx);
                        report.tombstoned += 1;
                    }
                }
                None => {
                    self.insert_new(
                        record.id,
                        record.parent,
                        record.value.clone(),
                        record.tombstoned,
                        &record.children,
                    );
                    report.inserted += 1;
                }
            }
        }
        report
    }

    fn to_record(&self, node: &TreeNode) -> NodeRecord {
        NodeRecord {
            id: node.id(),
            parent: self.parent_id(node),
            value: node.value().to_string(),
            tombstoned: node.is_tombstoned(),
            children: self.child_ids(node),
        }
    }

    fn tombstone_subtree(&mut self, idx: Index) -> usize {
        let subtree: Vec<Index> = PreOrderIter::new(self, vec![idx])
            .map(|(i, _)| i)
            .collect();
        for &i in &subtree {
            if let Some(node) = self.arena.get_mut(i) {
                node.tombstoned = true;
            }
        }
        subtree.len()
    }

    /// Remove `idx` from its parent's children, or from the root list.
    fn detach(&mut self, idx: Index) {
        let parent = self.node(idx).and_then(TreeNode::parent);
        match parent {
            Some(parent_idx) => {
                if let Some(parent_node) = self.arena.get_mut(parent_idx) {
                    parent_node.children.retain(|&c| c != idx);
                }
                if let Some(node) = self.arena.get_mut(idx) {
                    node.parent = None;
                }
            }
            None => self.roots.retain(|&r| r != idx),
        }
    }

    /// True if `candidate` is `node` or one of its ancestors.
    fn is_ancestor(&self, candidate: Index, node: Index) -> bool {
        let mut current = Some(node);
        while let Some(idx) = current {
            if idx == candidate {
                return true;
            }
            current = self.node(idx).and_then(TreeNode::parent);
        }
        false
    }
}

impl fmt::Display for Forest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let labels = self.iter().map(|(_, node)| node.value()).join(", ");
        write!(f, "Forest[{}]", labels)
    }
}

/// Pre-order iterator yielding `(arena index, node)` pairs.
pub struct PreOrderIter<'a> {
    forest: &'a Forest,
    stack: Vec<Index>,
}

impl<'a> PreOrderIter<'a> {
    fn new(forest: &'a Forest, mut starts: Vec<Index>) -> Self {
        starts.reverse();
        Self {
            forest,
            stack: starts,
        }
    }
}

impl<'a> Iterator for PreOrderIter<'a> {
    type Item = (Index, &'a TreeNode);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.forest.node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                for &child in node.children.iter().rev() {
                    self.stack.push(child);
                }
                return Some((current_idx, node));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(nodes: &[&TreeNode]) -> Vec<NodeId> {
        nodes.iter().map(|n| n.id()).collect()
    }

    #[test]
    fn given_empty_forest_when_queried_then_everything_is_empty() {
        let forest = Forest::new();
        assert!(forest.is_empty());
        assert!(forest.roots().is_empty());
        assert!(forest.subtree(None).is_empty());
        assert_eq!(forest.depth(), 0);
        assert!(forest.get(NodeId::new_v4()).is_none());
    }

    #[test]
    fn given_unknown_parent_when_inserting_then_node_becomes_root() {
        let mut forest = Forest::new();
        let id = NodeId::new_v4();

        forest
            .insert(id, Some(NodeId::new_v4()), "orphan", false, &[])
            .unwrap();

        assert_eq!(ids(&forest.roots()), vec![id]);
        assert!(forest.get(id).unwrap().is_root());
    }

    #[test]
    fn given_child_with_parent_when_adopted_then_leaves_previous_parent() {
        let mut forest = Forest::new();
        let (p1, p2, c) = (NodeId::new_v4(), NodeId::new_v4(), NodeId::new_v4());
        forest.insert(p1, None, "p1", false, &[]).unwrap();
        forest.insert(c, Some(p1), "c", false, &[]).unwrap();

        forest.insert(p2, None, "p2", false, &[c]).unwrap();

        assert!(forest.child_ids(forest.get(p1).unwrap()).is_empty());
        assert_eq!(forest.child_ids(forest.get(p2).unwrap()), vec![c]);
        assert_eq!(forest.parent_id(forest.get(c).unwrap()), Some(p2));
        assert_eq!(forest.len(), 3);
    }

    #[test]
    fn given_ancestor_in_child_ids_when_inserting_then_ancestor_is_not_adopted() {
        let mut forest = Forest::new();
        let (a, b, c) = (NodeId::new_v4(), NodeId::new_v4(), NodeId::new_v4());
        forest.insert(a, None, "a", false, &[]).unwrap();
        forest.insert(b, Some(a), "b", false, &[]).unwrap();

        forest.insert(c, Some(b), "c", false, &[a]).unwrap();

        assert_eq!(ids(&forest.roots()), vec![a]);
        assert_eq!(ids(&forest.subtree(None)), vec![a, b, c]);
        assert_eq!(forest.depth(), 3);
    }

    #[test]
    fn given_repeated_child_id_when_inserting_then_child_attached_once() {
        let mut forest = Forest::new();
        let (a, c) = (NodeId::new_v4(), NodeId::new_v4());
        forest.insert(a, None, "a", false, &[]).unwrap();

        forest.insert(c, None, "c", false, &[a, a]).unwrap();

        assert_eq!(forest.child_ids(forest.get(c).unwrap()), vec![a]);
    }

    #[test]
    fn given_tombstoned_insert_when_adopting_then_adopted_subtree_is_tombstoned() {
        let mut forest = Forest::new();
        let (a, a1, c) = (NodeId::new_v4(), NodeId::new_v4(), NodeId::new_v4());
        forest.insert(a, None, "a", false, &[]).unwrap();
        forest.insert(a1, Some(a), "a1", false, &[]).unwrap();

        forest.insert(c, None, "c", true, &[a]).unwrap();

        assert!(forest.subtree(None).iter().all(|n| n.is_tombstoned()));
    }

    #[test]
    fn given_tombstoned_parent_when_inserting_then_new_node_is_tombstoned() {
        let mut forest = Forest::new();
        let (p, c) = (NodeId::new_v4(), NodeId::new_v4());
        forest.insert(p, None, "p", true, &[]).unwrap();

        forest.insert(c, Some(p), "c", false, &[]).unwrap();

        assert!(forest.get(c).unwrap().is_tombstoned());
    }

    #[test]
    fn given_insert_path_when_value_too_long_then_accepted() {
        let mut forest = Forest::new();
        let id = NodeId::new_v4();
        forest
            .insert(id, None, "far-too-long-label", false, &[])
            .unwrap();
        assert_eq!(forest.get(id).unwrap().value(), "far-too-long-label");
    }

    #[test]
    fn given_unknown_id_when_setting_value_then_not_found_wins_over_invalid_value() {
        let mut forest = Forest::new();
        let id = NodeId::new_v4();
        assert_eq!(forest.set_value(id, ""), Err(DomainError::NotFound(id)));
    }

    #[test]
    fn given_node_when_recorded_then_carries_parent_and_children() {
        let mut forest = Forest::new();
        let (r, a, b) = (NodeId::new_v4(), NodeId::new_v4(), NodeId::new_v4());
        forest.insert(r, None, "r", false, &[]).unwrap();
        forest.insert(a, Some(r), "a", false, &[]).unwrap();
        forest.insert(b, Some(r), "b", false, &[]).unwrap();

        let record = forest.record(r).unwrap();
        assert_eq!(record.parent, None);
        assert_eq!(record.children, vec![a, b]);
        assert_eq!(forest.record(a).unwrap().parent, Some(r));
        assert_eq!(forest.records(Some(a)).len(), 1);
        assert_eq!(forest.records(None).len(), 3);
    }

    fn chain_records(len: usize) -> Vec<NodeRecord> {
        let ids: Vec<NodeId> = (0..len).map(|_| NodeId::new_v4()).collect();
        ids.iter()
            .enumerate()
            .map(|(i, &id)| {
                let record = NodeRecord::new(id, "link");
                match i.checked_sub(1) {
                    Some(p) => record.with_parent(ids[p]),
                    None => record,
                }
            })
            .collect()
    }

    #[test]
    fn given_very_deep_chain_when_merged_then_depth_and_traversal_complete() {
        let mut forest = Forest::new();

        forest.merge(&chain_records(100_000)).unwrap();

        assert_eq!(forest.depth(), 100_000);
        assert_eq!(forest.iter().count(), 100_000);
        let root = forest.roots()[0].id();
        assert!(forest.remove(root));
        assert!(forest.iter().all(|(_, n)| n.is_tombstoned()));
    }

    #[test]
    fn given_same_unknown_id_twice_when_merging_then_insert_then_update() {
        let mut forest = Forest::new();
        let id = NodeId::new_v4();
        let batch = vec![
            NodeRecord::new(id, "a"),
            NodeRecord::new(id, "b").tombstoned(true),
        ];

        let report = forest.merge(&batch).unwrap();

        assert_eq!(
            report,
            MergeReport {
                updated: 1,
                inserted: 1,
                tombstoned: 1
            }
        );
        assert_eq!(forest.len(), 1);
        let node = forest.get(id).unwrap();
        assert_eq!(node.value(), "b");
        assert!(node.is_tombstoned());
    }

    #[test]
    fn given_forest_when_displayed_then_lists_labels_in_pre_order() {
        let mut forest = Forest::new();
        let (r, a) = (NodeId::new_v4(), NodeId::new_v4());
        forest.insert(r, None, "r", false, &[]).unwrap();
        forest.insert(a, Some(r), "a", false, &[]).unwrap();
        assert_eq!(forest.to_string(), "Forest[r, a]");
    }

    #[test]
    fn given_merge_report_when_displayed_then_lists_counters() {
        let report = MergeReport {
            updated: 2,
            inserted: 1,
            tombstoned: 0,
        };
        assert_eq!(report.to_string(), "2 updated, 1 inserted, 0 tombstoned");
    }
}
