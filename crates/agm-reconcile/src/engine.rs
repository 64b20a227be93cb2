//! Reconciliation engine
//!
//! Builds comparison trees from a [`StoreSet`] and copies values between
//! stores at any entry of a tree.

use crate::comparer::{Comparer, ComparerRegistry, ContainerComparer, WriteError};
use crate::error::{ReconcileError, Result};
use crate::stores::StoreSet;
use crate::tree::{
    ComparisonEntry, ComparisonTree, EntryId, EntryKind, FieldStep, Operand, PerStore,
};
use crate::value::{MetaValue, TypeTag};
use agm_asset::{AssetPath, ContentHash};
use agm_store::{StoreError, StoreKind};
use indexmap::IndexMap;
use tracing::{debug, info};

/// Outcome of a full reconciliation pass
#[derive(Debug, Clone, Default)]
pub struct ReconcileReport {
    /// Paths compared
    pub checked: usize,
    /// Trees whose root differs between an adjacent pair
    pub drifted: Vec<ComparisonTree>,
}

impl ReconcileReport {
    /// Whether every compared path agreed
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.drifted.is_empty()
    }
}

/// Child about to be built under a parent
struct PendingChild {
    name: String,
    declared: TypeTag,
    step: FieldStep,
    values: PerStore<Option<MetaValue>>,
}

/// One distinct element hash of a container, with where each store has it
struct ElementSlot {
    element: MetaValue,
    positions: PerStore<Option<usize>>,
}

/// Structural diff and merge driven by a [`ComparerRegistry`]
#[derive(Debug, Clone, Copy)]
pub struct Reconciler<'r> {
    registry: &'r ComparerRegistry,
}

impl<'r> Reconciler<'r> {
    /// Engine over `registry`
    #[must_use]
    pub fn new(registry: &'r ComparerRegistry) -> Self {
        Self { registry }
    }

    /// Registry in use
    #[must_use]
    pub fn registry(&self) -> &'r ComparerRegistry {
        self.registry
    }

    /// Compare `path` across all three stores
    ///
    /// Never fails: a store without the path contributes a missing operand.
    #[must_use]
    pub fn create_entry(&self, stores: &StoreSet, path: &AssetPath) -> ComparisonTree {
        let values = PerStore::from_fn(|kind| {
            stores
                .get(kind)
                .get(path)
                .cloned()
                .map(MetaValue::Record)
        });
        let read_only = PerStore::from_fn(|kind| stores.get(kind).is_read_only());

        let mut entries = Vec::new();
        self.build(
            &mut entries,
            &read_only,
            None,
            path.to_string(),
            None,
            Vec::new(),
            values,
        );
        let tree = ComparisonTree::new(path.clone(), entries);
        debug!(%path, entries = tree.len(), drift = tree.has_drift(), "built comparison tree");
        tree
    }

    #[allow(clippy::too_many_arguments)]
    fn build(
        &self,
        entries: &mut Vec<ComparisonEntry>,
        read_only: &PerStore<bool>,
        parent: Option<EntryId>,
        name: String,
        declared: Option<TypeTag>,
        steps: Vec<FieldStep>,
        values: PerStore<Option<MetaValue>>,
    ) -> EntryId {
        let id = EntryId(entries.len());
        let operands = values.map(|kind, value| Operand::new(self.registry, value.clone(), read_only[kind]));
        let concrete = operands
            .iter()
            .find_map(|(_, operand)| operand.value.as_ref())
            .map(MetaValue::type_tag);

        let (kind, pending) = match concrete.and_then(|tag| self.registry.resolve(tag)) {
            Some(Comparer::Composite(composite)) => {
                let pending: Vec<PendingChild> = composite
                    .fields()
                    .iter()
                    .map(|field| PendingChild {
                        name: field.name.to_string(),
                        declared: field.declared,
                        step: FieldStep::Field(field.name),
                        values: values.map(|_, value| value.as_ref().and_then(|v| field.get(v))),
                    })
                    .collect();
                (EntryKind::Composite, pending)
            }
            Some(Comparer::Container(container)) => {
                (EntryKind::Container, self.pair_elements(container, &values))
            }
            None => (EntryKind::Leaf, Vec::new()),
        };

        entries.push(ComparisonEntry {
            name,
            declared,
            kind,
            pairwise: ComparisonEntry::compute_pairwise(&operands),
            operands,
            children: Vec::with_capacity(pending.len()),
            parent,
            steps: steps.clone(),
            dirty: false,
        });

        for child in pending {
            let mut child_steps = steps.clone();
            child_steps.push(child.step);
            let child_id = self.build(
                entries,
                read_only,
                Some(id),
                child.name,
                Some(child.declared),
                child_steps,
                child.values,
            );
            entries[id.0].children.push(child_id);
        }
        id
    }

    /// Pair container elements across stores by element hash
    ///
    /// Slots are created in discovery order (simulated, sidecar, live). Each
    /// store keeps the index of its own element in the slot, so a child
    /// operand is always that store's element.
    fn pair_elements(
        &self,
        container: &ContainerComparer,
        values: &PerStore<Option<MetaValue>>,
    ) -> Vec<PendingChild> {
        let elements = values.map(|_, value| {
            value
                .as_ref()
                .map(|v| container.elements(v))
                .unwrap_or_default()
        });

        let mut index: IndexMap<ContentHash, ElementSlot> = IndexMap::new();
        for (kind, owned) in elements.iter() {
            for (position, element) in owned.iter().enumerate() {
                let slot = index
                    .entry(self.registry.hash(Some(element)))
                    .or_insert_with(|| ElementSlot {
                        element: element.clone(),
                        positions: PerStore::default(),
                    });
                slot.positions[kind].get_or_insert(position);
            }
        }

        index
            .into_values()
            .map(|slot| PendingChild {
                name: slot.element.to_string(),
                declared: container.item,
                values: slot
                    .positions
                    .map(|kind, position| position.map(|p| elements[kind][p].clone())),
                step: FieldStep::Element(slot.element),
            })
            .collect()
    }

    /// Copy `source`'s value at `id` into `dest`
    ///
    /// At the root the whole record is inserted, replaced or removed.
    /// Below it, the field or element is written into the existing dest
    /// record. On success the entry, everything under it and every
    /// ancestor are marked dirty until [`refresh`](Self::refresh).
    ///
    /// Copying a store onto itself is a no-op.
    ///
    /// # Errors
    /// - [`ReconcileError::UnknownEntry`] if `id` is not in the tree
    /// - [`ReconcileError::ReadOnlyTarget`] if `dest` refuses writes;
    ///   nothing is mutated
    /// - [`ReconcileError::MissingTarget`] if a field is merged into a
    ///   store with no record at the path
    /// - [`ReconcileError::Write`] or [`ReconcileError::Store`] if the
    ///   write itself fails
    pub fn merge_copy(
        &self,
        tree: &mut ComparisonTree,
        stores: &mut StoreSet,
        id: EntryId,
        source: StoreKind,
        dest: StoreKind,
    ) -> Result<()> {
        let entry = tree.get(id).ok_or(ReconcileError::UnknownEntry(id))?;
        if source == dest {
            debug!(entry = %entry.name, store = %dest, "merge onto same store ignored");
            return Ok(());
        }

        let name = entry.name.clone();
        if entry.operands[dest].read_only || stores.get(dest).is_read_only() {
            return Err(ReconcileError::ReadOnlyTarget {
                entry: name,
                store: dest,
            });
        }

        let value = entry.operands[source].value.clone();
        let steps = entry.steps.clone();
        let path = tree.path().clone();
        let store = stores.get_mut(dest);
        let refused = |err: StoreError| match err {
            StoreError::ReadOnly { kind } => ReconcileError::ReadOnlyTarget {
                entry: name.clone(),
                store: kind,
            },
            other => ReconcileError::Store(other),
        };

        if steps.is_empty() {
            match value.clone() {
                Some(MetaValue::Record(record)) => {
                    store.add_asset(path.clone(), record, true).map_err(refused)?;
                }
                Some(other) => {
                    return Err(ReconcileError::Write {
                        entry: name,
                        reason: WriteError::TypeMismatch {
                            expected: TypeTag::Record,
                            found: other.type_tag(),
                        },
                    });
                }
                None => {
                    store.remove_asset(&path).map_err(refused)?;
                }
            }
        } else {
            let Some(record) = store.get(&path).cloned() else {
                return Err(ReconcileError::MissingTarget {
                    path,
                    store: dest,
                    entry: name,
                });
            };
            let mut root = MetaValue::Record(record);
            self.write(&mut root, &steps, value.clone())
                .map_err(|reason| ReconcileError::Write {
                    entry: name.clone(),
                    reason,
                })?;
            let record = match root {
                MetaValue::Record(record) => record,
                other => {
                    return Err(ReconcileError::Write {
                        entry: name,
                        reason: WriteError::TypeMismatch {
                            expected: TypeTag::Record,
                            found: other.type_tag(),
                        },
                    });
                }
            };
            store.add_asset(path.clone(), record, true).map_err(refused)?;
        }

        debug!(%path, entry = %name, %source, %dest, "merged value");
        tree.apply_write(self.registry, id, dest, value);
        Ok(())
    }

    /// Write `value` at `steps` below `target`
    fn write(
        &self,
        target: &mut MetaValue,
        steps: &[FieldStep],
        value: Option<MetaValue>,
    ) -> std::result::Result<(), WriteError> {
        let Some((step, rest)) = steps.split_first() else {
            return match value {
                Some(value) => {
                    *target = value;
                    Ok(())
                }
                None => Err(WriteError::Missing {
                    step: "root".to_string(),
                }),
            };
        };

        let found = target.type_tag();
        match (step, self.registry.resolve(found)) {
            (FieldStep::Field(name), Some(Comparer::Composite(composite))) => {
                let field = composite.field(name).ok_or_else(|| WriteError::Structure {
                    step: step.to_string(),
                    found,
                })?;
                if rest.is_empty() {
                    return field.set(target, value);
                }
                let mut child = field.get(target).ok_or_else(|| WriteError::Missing {
                    step: step.to_string(),
                })?;
                self.write(&mut child, rest, value)?;
                field.set(target, Some(child))
            }
            (FieldStep::Element(element), Some(Comparer::Container(container))) => {
                if rest.is_empty() {
                    return match value {
                        Some(value) => container.insert(target, value),
                        None => {
                            container.remove(target, element);
                            Ok(())
                        }
                    };
                }
                let wanted = self.registry.hash(Some(element));
                let mut child = container
                    .elements(target)
                    .into_iter()
                    .find(|candidate| self.registry.hash(Some(candidate)) == wanted)
                    .ok_or_else(|| WriteError::Missing {
                        step: step.to_string(),
                    })?;
                container.remove(target, &child);
                self.write(&mut child, rest, value)?;
                container.insert(target, child)
            }
            _ => Err(WriteError::Structure {
                step: step.to_string(),
                found,
            }),
        }
    }

    /// Rebuild `tree` from current store contents, clearing dirty flags
    pub fn refresh(&self, tree: &mut ComparisonTree, stores: &StoreSet) {
        *tree = self.create_entry(stores, tree.path());
    }

    /// Compare every path any store holds
    #[must_use]
    pub fn reconcile_all(&self, stores: &StoreSet) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        for path in stores.paths() {
            report.checked += 1;
            let tree = self.create_entry(stores, &path);
            if tree.has_drift() {
                report.drifted.push(tree);
            }
        }
        info!(
            checked = report.checked,
            drifted = report.drifted.len(),
            "reconciliation pass complete"
        );
        report
    }
}
