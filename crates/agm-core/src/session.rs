//! Reconciliation and promotion session
//!
//! A [`Session`] owns everything that lives between opening a project and
//! closing it: the three stores, the comparer registry, the configured
//! selectors and a per-path cache of comparison trees. Nothing is global;
//! dropping or [finishing](Session::finish) the session discards it all.

use crate::applicator::StoreApplicator;
use crate::collaborators::DependencyFactSource;
use crate::config::AgmConfig;
use crate::driver::{PromotionDriver, PromotionReport};
use crate::error::Result;
use agm_asset::AssetPath;
use agm_reconcile::{ComparerRegistry, ComparisonTree, EntryId, ReconcileReport, Reconciler, StoreSet};
use agm_selector::SelectorRegistry;
use agm_store::StoreKind;
use std::collections::HashMap;

/// Session-scoped state
#[derive(Debug)]
pub struct Session {
    stores: StoreSet,
    registry: ComparerRegistry,
    selectors: SelectorRegistry,
    config: AgmConfig,
    trees: HashMap<AssetPath, ComparisonTree>,
}

impl Session {
    /// Open a session over `stores`
    ///
    /// # Errors
    /// Returns a config error if a configured selector cannot be built
    pub fn open(stores: StoreSet, config: AgmConfig) -> Result<Self> {
        config.validate()?;
        let selectors = config.selector_registry()?;
        tracing::info!(
            simulated = stores.get(StoreKind::Simulated).len(),
            sidecar = stores.get(StoreKind::Sidecar).len(),
            live = stores.get(StoreKind::Live).len(),
            "session opened"
        );
        Ok(Self {
            stores,
            registry: ComparerRegistry::with_defaults(),
            selectors,
            config,
            trees: HashMap::new(),
        })
    }

    /// Replace the comparer registry; cached trees are dropped
    #[must_use]
    pub fn with_registry(mut self, registry: ComparerRegistry) -> Self {
        self.registry = registry;
        self.trees.clear();
        self
    }

    /// Stores under reconciliation
    #[must_use]
    pub fn stores(&self) -> &StoreSet {
        &self.stores
    }

    /// Active configuration
    #[must_use]
    pub fn config(&self) -> &AgmConfig {
        &self.config
    }

    /// Configured selectors
    #[must_use]
    pub fn selectors(&self) -> &SelectorRegistry {
        &self.selectors
    }

    /// Comparison tree for `path`, built on first use
    pub fn diff(&mut self, path: &AssetPath) -> &ComparisonTree {
        let engine = Reconciler::new(&self.registry);
        let stores = &self.stores;
        self.trees
            .entry(path.clone())
            .or_insert_with(|| engine.create_entry(stores, path))
    }

    /// Compare every path; does not touch the cache
    #[must_use]
    pub fn diff_all(&self) -> ReconcileReport {
        Reconciler::new(&self.registry).reconcile_all(&self.stores)
    }

    /// Copy `source`'s value at `entry` of `path`'s tree into `dest`
    ///
    /// # Errors
    /// Returns the engine's [`ReconcileError`](agm_reconcile::ReconcileError)
    pub fn merge_copy(
        &mut self,
        path: &AssetPath,
        entry: EntryId,
        source: StoreKind,
        dest: StoreKind,
    ) -> Result<()> {
        let engine = Reconciler::new(&self.registry);
        let stores = &mut self.stores;
        let tree = self
            .trees
            .entry(path.clone())
            .or_insert_with(|| engine.create_entry(stores, path));
        engine.merge_copy(tree, stores, entry, source, dest)?;
        Ok(())
    }

    /// Rebuild the cached tree for `path`
    pub fn refresh(&mut self, path: &AssetPath) -> &ComparisonTree {
        self.trees.remove(path);
        self.diff(path)
    }

    /// Run duplicate-root promotion against the live store
    ///
    /// Labels are seeded from the live store as it was when the run
    /// started. Cached trees are dropped afterwards.
    ///
    /// # Errors
    /// Returns a selector error if the configured selector is missing, or a
    /// promotion error if facts cannot be derived.
    pub fn promote<S>(&mut self, source: S) -> Result<PromotionReport>
    where
        S: DependencyFactSource,
    {
        let selector = self.selectors.get(&self.config.promotion.selector)?;
        let simplifier = self.config.promotion.address.simplifier();
        let seed = self.stores.get(StoreKind::Live).clone();
        let mut applicator = StoreApplicator::new(self.stores.get_mut(StoreKind::Live));

        let mut driver = PromotionDriver::new(source)
            .with_max_rounds(self.config.effective_max_rounds())
            .with_shared_label(self.config.promotion.shared_label.clone());
        let report = driver.run(selector, simplifier.as_ref(), &seed, &mut applicator)?;

        self.trees.clear();
        Ok(report)
    }

    /// Close the session, returning the stores
    #[must_use]
    pub fn finish(self) -> StoreSet {
        tracing::info!(cached = self.trees.len(), "session closed");
        self.stores
    }
}
