//! Domain layer: the forest and its nodes
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod display;
pub mod error;
pub mod forest;
pub mod node;
pub mod seed;

pub use display::{display_forest, forest_tree, retain_live, DisplayNode, TreeNodeConvert};
pub use error::{DomainError, DomainResult};
pub use forest::{Forest, MergeReport, PreOrderIter};
pub use node::{validate_value, NodeId, NodeRecord, TreeNode, MAX_VALUE_LEN};
pub use seed::default_seed;
