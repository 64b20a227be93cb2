//! Duplicate-root promotion driver
//!
//! An asset that is only in a build because other assets depend on it, and
//! that ends up in more than one build output, is a *duplicate root*. The
//! driver moves each one into a shared group chosen from its dependents'
//! groups, then re-derives facts and repeats until no duplicate roots are
//! left or the round cap is hit.

use crate::collaborators::{Applicator, DependencyFactSource, LabelSource};
use crate::error::PromotionError;
use crate::state::{validate_transition, DriverState};
use agm_asset::{
    AddressSimplifier, AssetGuid, AssetPath, DependencyFact, GroupRef, Labels,
    SHARED_RESOURCES_LABEL,
};
use agm_selector::{GroupSelector, SelectionKey};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

/// Hard cap on fixpoint rounds
pub const MAX_PROMOTION_ROUNDS: usize = 10;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromotionOutcome {
    /// A round found no duplicate roots
    Converged,
    /// Stopped by the round cap with duplicates possibly left
    RoundCapReached,
}

/// One applied promotion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promotion {
    /// Round it happened in, from 1
    pub round: usize,
    /// Promoted asset
    pub asset: AssetGuid,
    /// Asset path
    pub path: AssetPath,
    /// Chosen group
    pub group: GroupRef,
    /// Assigned address
    pub address: String,
    /// Assigned labels
    pub labels: Labels,
}

/// One asset left alone for a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skip {
    /// Round it happened in, from 1
    pub round: usize,
    /// Skipped asset
    pub asset: AssetGuid,
    /// Asset path
    pub path: AssetPath,
    /// Why
    pub reason: String,
}

/// Result of [`PromotionDriver::run`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromotionReport {
    /// Rounds executed, including the final scan that found nothing
    pub rounds: usize,
    /// Applied promotions in order
    pub promotions: Vec<Promotion>,
    /// Skipped assets in order
    pub skipped: Vec<Skip>,
    /// How the run ended
    pub outcome: PromotionOutcome,
}

impl PromotionReport {
    /// Whether the last round found no duplicates
    #[must_use]
    pub fn converged(&self) -> bool {
        self.outcome == PromotionOutcome::Converged
    }
}

/// Fixpoint loop over a [`DependencyFactSource`]
#[derive(Debug)]
pub struct PromotionDriver<S> {
    source: S,
    max_rounds: usize,
    shared_label: String,
    state: DriverState,
}

impl<S: DependencyFactSource> PromotionDriver<S> {
    /// Driver with the full round cap and the default shared label
    pub fn new(source: S) -> Self {
        Self {
            source,
            max_rounds: MAX_PROMOTION_ROUNDS,
            shared_label: SHARED_RESOURCES_LABEL.to_string(),
            state: DriverState::Done,
        }
    }

    /// Lower the round cap; values above [`MAX_PROMOTION_ROUNDS`] are
    /// clamped and zero becomes one
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds.clamp(1, MAX_PROMOTION_ROUNDS);
        self
    }

    /// Label added to every promoted asset
    #[must_use]
    pub fn with_shared_label(mut self, label: impl Into<String>) -> Self {
        self.shared_label = label.into();
        self
    }

    /// Effective round cap
    #[inline]
    #[must_use]
    pub fn max_rounds(&self) -> usize {
        self.max_rounds
    }

    /// Current state
    #[inline]
    #[must_use]
    pub fn state(&self) -> DriverState {
        self.state
    }

    /// Fact source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Give the fact source back
    pub fn into_source(self) -> S {
        self.source
    }

    fn transition(&mut self, to: DriverState) -> Result<(), PromotionError> {
        validate_transition(self.state, to)?;
        self.state = to;
        Ok(())
    }

    /// Run rounds until no duplicate roots remain or the cap is hit
    ///
    /// Each duplicate root is handled on its own: a selection or applicator
    /// failure skips that asset for the round and is recorded in the
    /// report. Skipped assets are retried next round if the fresh facts
    /// still mark them.
    ///
    /// # Errors
    /// Returns [`PromotionError::FactSource`] if facts cannot be derived;
    /// the driver is left in [`DriverState::Done`].
    pub fn run<G, A, L, P>(
        &mut self,
        selector: &G,
        simplifier: &A,
        labels: &L,
        applicator: &mut P,
    ) -> Result<PromotionReport, PromotionError>
    where
        G: GroupSelector + ?Sized,
        A: AddressSimplifier + ?Sized,
        L: LabelSource + ?Sized,
        P: Applicator + ?Sized,
    {
        let mut report = PromotionReport {
            rounds: 0,
            promotions: Vec::new(),
            skipped: Vec::new(),
            outcome: PromotionOutcome::RoundCapReached,
        };

        while report.rounds < self.max_rounds {
            report.rounds += 1;
            let round = report.rounds;
            self.transition(DriverState::Scanning)?;

            let facts = match self.source.duplicate_roots() {
                Ok(facts) => facts,
                Err(err) => {
                    self.state = DriverState::Done;
                    return Err(err.into());
                }
            };
            let by_guid: HashMap<AssetGuid, &DependencyFact> =
                facts.iter().map(|fact| (fact.asset, fact)).collect();
            let roots: Vec<&DependencyFact> = facts
                .iter()
                .filter(|fact| fact.is_duplicate_root())
                .collect();

            if roots.is_empty() {
                self.transition(DriverState::Done)?;
                report.outcome = PromotionOutcome::Converged;
                info!(round, "no duplicate roots left");
                return Ok(report);
            }

            self.transition(DriverState::Promoting)?;
            let before = (report.promotions.len(), report.skipped.len());
            for root in roots {
                match self.promote(round, root, &by_guid, selector, simplifier, labels, applicator) {
                    Ok(promotion) => {
                        self.source.record_assignment(promotion.asset, &promotion.group);
                        report.promotions.push(promotion);
                    }
                    Err(reason) => {
                        warn!(round, asset = %root.asset, path = %root.path, %reason, "skipping duplicate root");
                        report.skipped.push(Skip {
                            round,
                            asset: root.asset,
                            path: root.path.clone(),
                            reason,
                        });
                    }
                }
            }
            info!(
                round,
                promoted = report.promotions.len() - before.0,
                skipped = report.skipped.len() - before.1,
                "promotion round complete"
            );
        }

        self.transition(DriverState::Done)?;
        warn!(rounds = report.rounds, "promotion stopped at round cap");
        Ok(report)
    }

    #[allow(clippy::too_many_arguments)]
    fn promote<G, A, L, P>(
        &self,
        round: usize,
        root: &DependencyFact,
        by_guid: &HashMap<AssetGuid, &DependencyFact>,
        selector: &G,
        simplifier: &A,
        labels: &L,
        applicator: &mut P,
    ) -> Result<Promotion, String>
    where
        G: GroupSelector + ?Sized,
        A: AddressSimplifier + ?Sized,
        L: LabelSource + ?Sized,
        P: Applicator + ?Sized,
    {
        let candidates: BTreeSet<GroupRef> = root
            .dependents
            .iter()
            .filter_map(|dependent| by_guid.get(dependent))
            .flat_map(|fact| fact.bundle_groups.iter().cloned())
            .collect();

        let group = selector
            .select(SelectionKey::Candidates(&candidates))
            .map_err(|err| err.to_string())?;
        let address = simplifier.simplify(root.path.as_str());

        let mut merged: Labels = root
            .dependents
            .iter()
            .flat_map(|dependent| labels.labels_of(dependent))
            .collect();
        merged.insert(self.shared_label.clone());

        debug!(
            asset = %root.asset,
            %group,
            %address,
            labels = merged.len(),
            "promoting duplicate root"
        );
        applicator
            .create_or_move(root.asset, &root.path, &group, &address, &merged)
            .map_err(|err| err.to_string())?;
        applicator
            .register_global_labels(&merged)
            .map_err(|err| err.to_string())?;

        Ok(Promotion {
            round,
            asset: root.asset,
            path: root.path.clone(),
            group,
            address,
            labels: merged,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ApplyError, FactSourceError};
    use agm_selector::{ConstantSelector, PrioritySelector};
    use agm_test_utils::{duplicate_root, group, guid, path};
    use std::collections::BTreeMap;

    #[derive(Default)]
    struct Recorder {
        moves: Vec<(AssetGuid, GroupRef, String, Labels)>,
        global: Labels,
        reject: Option<AssetGuid>,
    }

    impl Applicator for Recorder {
        fn create_or_move(
            &mut self,
            asset: AssetGuid,
            path: &AssetPath,
            group: &GroupRef,
            address: &str,
            labels: &Labels,
        ) -> Result<(), ApplyError> {
            if self.reject == Some(asset) {
                return Err(ApplyError::Rejected {
                    path: path.clone(),
                    message: "locked".into(),
                });
            }
            self.moves.push((asset, group.clone(), address.to_string(), labels.clone()));
            Ok(())
        }

        fn register_global_labels(&mut self, labels: &Labels) -> Result<(), ApplyError> {
            self.global.extend(labels.iter().cloned());
            Ok(())
        }
    }

    /// Clears a duplicate once it has been assigned
    struct Resolving(Vec<DependencyFact>);

    impl DependencyFactSource for Resolving {
        fn duplicate_roots(&mut self) -> Result<Vec<DependencyFact>, FactSourceError> {
            Ok(self.0.clone())
        }

        fn record_assignment(&mut self, asset: AssetGuid, _group: &GroupRef) {
            for fact in &mut self.0 {
                if fact.asset == asset {
                    fact.is_duplicate = false;
                }
            }
        }
    }

    struct Broken;

    impl DependencyFactSource for Broken {
        fn duplicate_roots(&mut self) -> Result<Vec<DependencyFact>, FactSourceError> {
            Err(FactSourceError::new("graph not built"))
        }
    }

    fn explicit(id: u128, group_name: &str) -> DependencyFact {
        DependencyFact::explicit(guid(id), path(&format!("Assets/{id}.prefab")), group(group_name))
    }

    fn seed() -> BTreeMap<AssetGuid, Labels> {
        BTreeMap::from([
            (guid(1), Labels::from(["hd".to_string()])),
            (guid(2), Labels::from(["pc".to_string()])),
        ])
    }

    #[test]
    fn no_duplicates_is_one_round_without_mutation() {
        let mut driver = PromotionDriver::new(vec![explicit(1, "A"), explicit(2, "B")]);
        let mut applicator = Recorder::default();
        let report = driver
            .run(&ConstantSelector::new(group("Shared")), &|p: &str| p.to_string(), &seed(), &mut applicator)
            .unwrap();

        assert_eq!(report.rounds, 1);
        assert!(report.converged());
        assert!(applicator.moves.is_empty());
        assert_eq!(driver.state(), DriverState::Done);
    }

    #[test]
    fn promotes_with_dependent_labels_and_converges() {
        let facts = vec![
            explicit(1, "A"),
            explicit(2, "B"),
            duplicate_root(10, "Assets/Shared/tex.png", &[1, 2], &["A", "B"]),
        ];
        let mut driver = PromotionDriver::new(Resolving(facts));
        let mut applicator = Recorder::default();
        let selector = PrioritySelector::ranked([group("B"), group("A")]);

        let report = driver
            .run(&selector, &agm_asset::FileStemSimplifier, &seed(), &mut applicator)
            .unwrap();

        assert_eq!(report.rounds, 2);
        assert!(report.converged());
        let (asset, chosen, address, labels) = &applicator.moves[0];
        assert_eq!(*asset, guid(10));
        assert_eq!(chosen, &group("B"));
        assert_eq!(address, "tex");
        let expected: Labels = ["hd", "pc", SHARED_RESOURCES_LABEL].into_iter().map(String::from).collect();
        assert_eq!(labels, &expected);
        assert!(applicator.global.is_superset(&expected));
    }

    #[test]
    fn unmatched_candidates_skip_and_hit_cap() {
        let facts = vec![
            explicit(1, "A"),
            explicit(2, "B"),
            duplicate_root(10, "Assets/tex.png", &[1, 2], &["A", "B"]),
        ];
        let mut driver = PromotionDriver::new(facts).with_max_rounds(3);
        let mut applicator = Recorder::default();
        let selector = PrioritySelector::ranked([group("Other")]);

        let report = driver
            .run(&selector, &agm_asset::IdentitySimplifier, &seed(), &mut applicator)
            .unwrap();

        assert_eq!(report.rounds, 3);
        assert_eq!(report.outcome, PromotionOutcome::RoundCapReached);
        assert_eq!(report.skipped.len(), 3);
        assert!(applicator.moves.is_empty());
        assert_eq!(driver.state(), DriverState::Done);
    }

    #[test]
    fn applicator_failure_skips_only_that_asset() {
        let facts = vec![
            explicit(1, "A"),
            explicit(2, "B"),
            duplicate_root(10, "Assets/a.png", &[1, 2], &["A", "B"]),
            duplicate_root(11, "Assets/b.png", &[1, 2], &["A", "B"]),
        ];
        let mut driver = PromotionDriver::new(Resolving(facts)).with_max_rounds(1);
        let mut applicator = Recorder {
            reject: Some(guid(10)),
            ..Recorder::default()
        };

        let report = driver
            .run(&ConstantSelector::new(group("Shared")), &agm_asset::IdentitySimplifier, &seed(), &mut applicator)
            .unwrap();

        assert_eq!(report.promotions.len(), 1);
        assert_eq!(report.promotions[0].asset, guid(11));
        assert_eq!(report.skipped[0].asset, guid(10));
        assert!(report.skipped[0].reason.contains("locked"));
    }

    #[test]
    fn fact_source_failure_aborts_run() {
        let mut driver = PromotionDriver::new(Broken);
        let err = driver
            .run(&ConstantSelector::new(group("Shared")), &agm_asset::IdentitySimplifier, &seed(), &mut Recorder::default())
            .unwrap_err();
        assert!(matches!(err, PromotionError::FactSource(_)));
        assert_eq!(driver.state(), DriverState::Done);
    }

    #[test]
    fn round_cap_never_exceeds_maximum() {
        let driver = PromotionDriver::new(Vec::<DependencyFact>::new()).with_max_rounds(1000);
        assert_eq!(driver.max_rounds(), MAX_PROMOTION_ROUNDS);
    }
}
