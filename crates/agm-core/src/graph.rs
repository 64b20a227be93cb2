//! In-memory dependency graph fact source
//!
//! Edges point from an asset to what it depends on. Assets explicitly
//! placed in a group are bundle roots; every other asset is pulled into the
//! bundles of the explicit assets that reach it.

use crate::collaborators::DependencyFactSource;
use crate::error::FactSourceError;
use agm_asset::{AssetGuid, AssetPath, DependencyFact, GroupRef};
use petgraph::graphmap::DiGraphMap;
use petgraph::Direction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Graph construction errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    /// Asset depends on itself
    #[error("asset {0} depends on itself")]
    SelfLoop(AssetGuid),

    /// Edge endpoint was never added
    #[error("unknown asset {0}")]
    UnknownAsset(AssetGuid),
}

/// One asset in a serialized graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphAsset {
    /// Identity
    pub guid: AssetGuid,
    /// Location
    pub path: AssetPath,
    /// Explicit group, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Assets this one depends on
    #[serde(default)]
    pub depends_on: Vec<AssetGuid>,
}

/// Asset dependency graph
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: DiGraphMap<AssetGuid, ()>,
    paths: BTreeMap<AssetGuid, AssetPath>,
    explicit: BTreeMap<AssetGuid, GroupRef>,
}

impl DependencyGraph {
    /// Empty graph
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from serialized assets
    ///
    /// # Errors
    /// Returns [`GraphError`] for self-dependencies or dangling edges
    pub fn from_assets(assets: &[GraphAsset]) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for asset in assets {
            match &asset.group {
                Some(group) => graph.add_explicit(asset.guid, asset.path.clone(), GroupRef::named(group)),
                None => graph.add_asset(asset.guid, asset.path.clone()),
            }
        }
        for asset in assets {
            for dependency in &asset.depends_on {
                graph.add_dependency(asset.guid, *dependency)?;
            }
        }
        Ok(graph)
    }

    /// Add an asset with no explicit group
    pub fn add_asset(&mut self, guid: AssetGuid, path: AssetPath) {
        self.edges.add_node(guid);
        self.paths.insert(guid, path);
    }

    /// Add an asset explicitly placed in `group`
    pub fn add_explicit(&mut self, guid: AssetGuid, path: AssetPath, group: GroupRef) {
        self.add_asset(guid, path);
        self.explicit.insert(guid, group);
    }

    /// `from` depends on `to`
    ///
    /// # Errors
    /// Returns [`GraphError`] for a self-dependency or an unknown endpoint
    pub fn add_dependency(&mut self, from: AssetGuid, to: AssetGuid) -> Result<(), GraphError> {
        if from == to {
            return Err(GraphError::SelfLoop(from));
        }
        for guid in [from, to] {
            if !self.paths.contains_key(&guid) {
                return Err(GraphError::UnknownAsset(guid));
            }
        }
        self.edges.add_edge(from, to, ());
        Ok(())
    }

    /// Place an asset explicitly in `group`
    ///
    /// Returns false if the asset is unknown.
    pub fn assign(&mut self, guid: AssetGuid, group: GroupRef) -> bool {
        if !self.paths.contains_key(&guid) {
            return false;
        }
        self.explicit.insert(guid, group);
        true
    }

    /// Explicit group of an asset
    #[must_use]
    pub fn group_of(&self, guid: &AssetGuid) -> Option<&GroupRef> {
        self.explicit.get(guid)
    }

    /// Number of assets
    #[must_use]
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Whether the graph has no assets
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Groups whose bundles pull `guid` in
    ///
    /// Walks dependents upward, stopping at explicit assets.
    fn pulling_groups(&self, guid: AssetGuid) -> BTreeSet<GroupRef> {
        let mut groups = BTreeSet::new();
        let mut seen = BTreeSet::from([guid]);
        let mut stack: Vec<_> = self.dependents(guid).collect();
        while let Some(current) = stack.pop() {
            if !seen.insert(current) {
                continue;
            }
            match self.explicit.get(&current) {
                Some(group) => {
                    groups.insert(group.clone());
                }
                None => stack.extend(self.dependents(current)),
            }
        }
        groups
    }

    fn dependents(&self, guid: AssetGuid) -> impl Iterator<Item = AssetGuid> + '_ {
        self.edges.neighbors_directed(guid, Direction::Incoming)
    }

    /// Facts for every asset, ordered by guid
    #[must_use]
    pub fn facts(&self) -> Vec<DependencyFact> {
        self.paths
            .iter()
            .map(|(guid, path)| {
                let dependents: BTreeSet<_> = self.dependents(*guid).collect();
                match self.explicit.get(guid) {
                    Some(group) => DependencyFact {
                        dependents,
                        ..DependencyFact::explicit(*guid, path.clone(), group.clone())
                    },
                    None => {
                        let bundle_groups = self.pulling_groups(*guid);
                        DependencyFact {
                            asset: *guid,
                            path: path.clone(),
                            is_duplicate: bundle_groups.len() > 1,
                            is_implicit_root: !dependents.is_empty(),
                            dependents,
                            bundle_groups,
                        }
                    }
                }
            })
            .collect()
    }
}

impl DependencyFactSource for DependencyGraph {
    fn duplicate_roots(&mut self) -> Result<Vec<DependencyFact>, FactSourceError> {
        Ok(self.facts())
    }

    fn record_assignment(&mut self, asset: AssetGuid, group: &GroupRef) {
        if !self.assign(asset, group.clone()) {
            tracing::warn!(%asset, "assignment for asset outside the graph");
        }
    }
}
