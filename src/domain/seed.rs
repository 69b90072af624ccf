//! Demonstration topology used to initialize a fresh store.

use std::collections::HashMap;

use tracing::instrument;

use crate::domain::error::DomainResult;
use crate::domain::forest::Forest;
use crate::domain::node::NodeId;

/// `(label, parent label)` in insertion order; parents precede children.
const SEED_LAYOUT: &[(&str, Option<&str>)] = &[
    ("root", None),
    ("node1", Some("root")),
    ("node2", Some("root")),
    ("node11", Some("node1")),
    ("node12", Some("node1")),
    ("node21", Some("node2")),
    ("node111", Some("node11")),
    ("node112", Some("node11")),
    ("node121", Some("node12")),
    ("node211", Some("node21")),
    ("node212", Some("node21")),
    ("node1111", Some("node111")),
    ("node2111", Some("node211")),
    ("node11111", Some("node1111")),
    ("node21111", Some("node2111")),
];

/// Single-rooted demo forest, six levels deep with two main branches.
///
/// Identifiers are random on every call.
#[instrument(level = "debug")]
pub fn default_seed() -> DomainResult<Forest> {
    let mut forest = Forest::new();
    let mut ids: HashMap<&str, NodeId> = HashMap::new();

    for &(label, parent) in SEED_LAYOUT {
        let id = NodeId::new_v4();
        let parent_id = parent.and_then(|p| ids.get(p).copied());
        forest.insert(id, parent_id, label, false, &[])?;
        ids.insert(label, id);
    }

    Ok(forest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_default_seed_when_built_then_single_root_with_two_branches() {
        let forest = default_seed().unwrap();

        let roots = forest.roots();
        assert_eq!(roots.len(), 1);
        assert_eq!(roots[0].value(), "root");
        assert_eq!(roots[0].children().len(), 2);
        assert_eq!(forest.len(), SEED_LAYOUT.len());
        assert!(forest.depth() >= 5);
        assert!(forest.subtree(None).iter().all(|n| !n.is_tombstoned()));
    }

    #[test]
    fn given_two_seeds_when_built_then_identifiers_differ() {
        let a = default_seed().unwrap();
        let b = default_seed().unwrap();
        let root_a = a.roots()[0].id();
        assert!(!b.contains(root_a));
    }
}
