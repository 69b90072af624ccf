//! Two-forest staging workspace
//!
//! Edits go to the scratch forest; `apply` merges the scratch forest into the
//! store and starts a fresh scratch forest.

use tracing::{debug, info, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::config::{SeedKind, Settings};
use crate::domain::{
    default_seed, display_forest, retain_live, validate_value, DisplayNode, Forest, MergeReport,
    NodeId,
};

/// Build the store forest for the configured seed.
fn seed_forest(seed: SeedKind) -> ApplicationResult<Forest> {
    match seed {
        SeedKind::Demo => Ok(default_seed()?),
        SeedKind::Empty => Ok(Forest::new()),
    }
}

/// The persistent store and the scratch forest edits accumulate in.
#[derive(Debug, Clone)]
pub struct Workspace {
    settings: Settings,
    store: Forest,
    scratch: Forest,
}

impl Workspace {
    /// Create a workspace with the store seeded per `settings`.
    pub fn new(settings: Settings) -> ApplicationResult<Self> {
        let store = seed_forest(settings.seed)?;
        debug!("workspace created, store has {} node(s)", store.len());
        Ok(Self {
            settings,
            store,
            scratch: Forest::new(),
        })
    }

    /// Create a workspace around existing forests.
    pub fn with_forests(settings: Settings, store: Forest, scratch: Forest) -> Self {
        Self {
            settings,
            store,
            scratch,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn store(&self) -> &Forest {
        &self.store
    }

    pub fn scratch(&self) -> &Forest {
        &self.scratch
    }

    /// Add a new node to the scratch forest.
    ///
    /// An unknown `parent` makes the new node a scratch root.
    #[instrument(level = "debug", skip(self))]
    pub fn add(&mut self, value: &str, parent: Option<NodeId>) -> ApplicationResult<NodeId> {
        validate_value(None, value)?;
        let id = NodeId::new_v4();
        self.scratch.insert(id, parent, value, false, &[])?;
        info!("added {} ({}) to scratch", id, value);
        Ok(id)
    }

    /// Change the value of a scratch node.
    #[instrument(level = "debug", skip(self))]
    pub fn edit(&mut self, id: Option<NodeId>, value: &str) -> ApplicationResult<()> {
        let id = id.ok_or(ApplicationError::NoSelection { action: "edit" })?;
        self.scratch.set_value(id, value)?;
        info!("edited {} to {}", id, value);
        Ok(())
    }

    /// Tombstone a scratch node and its subtree. Unknown ids return false.
    #[instrument(level = "debug", skip(self))]
    pub fn remove(&mut self, id: Option<NodeId>) -> ApplicationResult<bool> {
        let id = id.ok_or(ApplicationError::NoSelection { action: "remove" })?;
        let removed = self.scratch.remove(id);
        info!("remove {}: {}", id, removed);
        Ok(removed)
    }

    /// Copy a store node (by value) into the scratch forest.
    ///
    /// The copy keeps the store's parent and child identifiers, so it lands
    /// under an already-copied parent and adopts already-copied children.
    #[instrument(level = "debug", skip(self))]
    pub fn copy_from_store(&mut self, id: NodeId) -> ApplicationResult<()> {
        let record = self.store.record(id).ok_or(ApplicationError::NotInStore(id))?;
        if self.scratch.has_node(id) {
            return Err(ApplicationError::AlreadyCopied(id));
        }
        self.scratch.insert_record(&record)?;
        info!("copied {} ({}) to scratch", id, record.value);
        Ok(())
    }

    /// Merge the scratch forest into the store and clear the scratch forest.
    ///
    /// On failure neither forest changes.
    #[instrument(level = "debug", skip(self))]
    pub fn apply(&mut self) -> ApplicationResult<MergeReport> {
        let records = self.scratch.records(None);
        let report = self.store.merge(&records)?;
        self.scratch = Forest::new();
        info!("applied scratch to store: {}", report);
        Ok(report)
    }

    /// Restore the seeded store and an empty scratch forest.
    #[instrument(level = "debug", skip(self))]
    pub fn reset(&mut self) -> ApplicationResult<()> {
        self.store = seed_forest(self.settings.seed)?;
        self.scratch = Forest::new();
        info!("workspace reset ({} seed)", self.settings.seed);
        Ok(())
    }

    pub fn store_view(&self) -> Vec<DisplayNode> {
        self.view(&self.store)
    }

    pub fn scratch_view(&self) -> Vec<DisplayNode> {
        self.view(&self.scratch)
    }

    fn view(&self, forest: &Forest) -> Vec<DisplayNode> {
        let nodes = display_forest(forest);
        if self.settings.show_tombstoned {
            nodes
        } else {
            retain_live(nodes)
        }
    }
}
