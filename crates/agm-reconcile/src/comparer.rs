//! Comparer registry
//!
//! A comparer tells the engine how to hash a value and how to descend into
//! it. Comparers are attached per [`TypeTag`] at registration time; a type
//! with no comparer is compared as a leaf (hashed whole, never expanded).

use crate::value::{MetaValue, TypeTag};
use agm_asset::{ContentHash, HashBuilder};
use std::collections::HashMap;

/// Reads a child value out of its parent
pub type Getter = fn(&MetaValue) -> Option<MetaValue>;

/// Writes a child value back into its parent
pub type Setter = fn(&mut MetaValue, Option<MetaValue>) -> Result<(), WriteError>;

/// Structural write failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WriteError {
    /// A required field cannot be cleared
    #[error("field `{field}` is required and cannot be cleared")]
    Required {
        /// Field name
        field: &'static str,
    },

    /// Value of the wrong type for the slot
    #[error("expected {expected}, found {found}")]
    TypeMismatch {
        /// Type the slot holds
        expected: TypeTag,
        /// Type that was offered
        found: TypeTag,
    },

    /// Intermediate value along the write path is absent
    #[error("nothing to descend into at `{step}`")]
    Missing {
        /// Step that could not be followed
        step: String,
    },

    /// Write path does not fit the registered comparers
    #[error("step `{step}` does not apply to {found}")]
    Structure {
        /// Step that could not be followed
        step: String,
        /// Type at that point
        found: TypeTag,
    },
}

/// One declared field of a composite
#[derive(Debug, Clone)]
pub struct FieldComparer {
    /// Field name; also the child entry name
    pub name: &'static str,
    /// Declared type of the field
    pub declared: TypeTag,
    get: Getter,
    set: Setter,
}

impl FieldComparer {
    /// Field with accessor pair
    #[must_use]
    pub fn new(name: &'static str, declared: TypeTag, get: Getter, set: Setter) -> Self {
        Self {
            name,
            declared,
            get,
            set,
        }
    }

    /// Read the field
    #[must_use]
    pub fn get(&self, parent: &MetaValue) -> Option<MetaValue> {
        (self.get)(parent)
    }

    /// Write the field
    ///
    /// # Errors
    /// Returns the setter's [`WriteError`]
    pub fn set(&self, parent: &mut MetaValue, value: Option<MetaValue>) -> Result<(), WriteError> {
        (self.set)(parent, value)
    }
}

/// Reads the identity of a composite value
pub type Identity = fn(&MetaValue) -> Option<String>;

/// Fixed, ordered list of named fields
///
/// An optional identity takes part in the hash without becoming a child
/// entry, so two values with equal fields but different identities differ.
#[derive(Debug, Clone, Default)]
pub struct CompositeComparer {
    fields: Vec<FieldComparer>,
    identity: Option<Identity>,
}

impl CompositeComparer {
    /// Composite over `fields`, in order
    #[must_use]
    pub fn new(fields: Vec<FieldComparer>) -> Self {
        Self {
            fields,
            identity: None,
        }
    }

    /// Fold `identity` into the hash ahead of the fields
    #[must_use]
    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    /// Identity of `value`, if this composite declares one
    #[must_use]
    pub fn identity(&self, value: &MetaValue) -> Option<String> {
        self.identity.and_then(|identity| identity(value))
    }

    /// Declared fields in order
    #[must_use]
    pub fn fields(&self) -> &[FieldComparer] {
        &self.fields
    }

    /// Field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldComparer> {
        self.fields.iter().find(|field| field.name == name)
    }
}

/// Homogeneous, unordered collection
#[derive(Debug, Clone)]
pub struct ContainerComparer {
    /// Type of every element
    pub item: TypeTag,
    elements: fn(&MetaValue) -> Vec<MetaValue>,
    insert: fn(&mut MetaValue, MetaValue) -> Result<(), WriteError>,
    remove: fn(&mut MetaValue, &MetaValue),
}

impl ContainerComparer {
    /// Container with element accessors
    #[must_use]
    pub fn new(
        item: TypeTag,
        elements: fn(&MetaValue) -> Vec<MetaValue>,
        insert: fn(&mut MetaValue, MetaValue) -> Result<(), WriteError>,
        remove: fn(&mut MetaValue, &MetaValue),
    ) -> Self {
        Self {
            item,
            elements,
            insert,
            remove,
        }
    }

    /// Elements of `container`
    #[must_use]
    pub fn elements(&self, container: &MetaValue) -> Vec<MetaValue> {
        (self.elements)(container)
    }

    /// Add an element
    ///
    /// # Errors
    /// Returns [`WriteError::TypeMismatch`] for a foreign element type
    pub fn insert(&self, container: &mut MetaValue, element: MetaValue) -> Result<(), WriteError> {
        (self.insert)(container, element)
    }

    /// Drop an element; absent elements are ignored
    pub fn remove(&self, container: &mut MetaValue, element: &MetaValue) {
        (self.remove)(container, element);
    }
}

/// How a type is compared
#[derive(Debug, Clone)]
pub enum Comparer {
    /// Named, fixed children
    Composite(CompositeComparer),
    /// Dynamic children, paired across stores by hash
    Container(ContainerComparer),
}

/// Type-indexed comparers
#[derive(Debug, Clone, Default)]
pub struct ComparerRegistry {
    comparers: HashMap<TypeTag, Comparer>,
}

impl ComparerRegistry {
    /// Registry with nothing registered; every value is a leaf
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry describing [`AssetRecord`](agm_asset::AssetRecord)
    ///
    /// Records are composites of `address`, `labels` and `group`; label
    /// sets are containers of labels. Groups are leaves.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(TypeTag::Record, Comparer::Composite(record_comparer()));
        registry.register(TypeTag::LabelSet, Comparer::Container(label_set_comparer()));
        registry
    }

    /// Attach a comparer to a type, replacing any previous one
    pub fn register(&mut self, tag: TypeTag, comparer: Comparer) {
        self.comparers.insert(tag, comparer);
    }

    /// Drop the comparer for a type; it degrades to a leaf
    pub fn unregister(&mut self, tag: TypeTag) -> Option<Comparer> {
        self.comparers.remove(&tag)
    }

    /// Comparer for a concrete type, `None` meaning leaf
    #[must_use]
    pub fn resolve(&self, tag: TypeTag) -> Option<&Comparer> {
        self.comparers.get(&tag)
    }

    /// Equality hash of an optional value
    ///
    /// `None` hashes to [`ContentHash::ZERO`]. Composite hashes fold the
    /// identity, if any, then the named child hashes in declared order;
    /// container hashes fold the
    /// sorted element hashes, so element order never matters.
    #[must_use]
    pub fn hash(&self, value: Option<&MetaValue>) -> ContentHash {
        let Some(value) = value else {
            return ContentHash::ZERO;
        };
        let tag = value.type_tag();
        match self.resolve(tag) {
            Some(Comparer::Composite(composite)) => {
                let mut builder = HashBuilder::tagged(tag.as_str());
                if let Some(identity) = composite.identity(value) {
                    builder.str(&identity);
                }
                for field in composite.fields() {
                    let child = field.get(value);
                    builder.str(field.name).hash(&self.hash(child.as_ref()));
                }
                builder.finish()
            }
            Some(Comparer::Container(container)) => {
                let mut hashes: Vec<_> = container
                    .elements(value)
                    .iter()
                    .map(|element| self.hash(Some(element)))
                    .collect();
                hashes.sort_unstable();
                let mut builder = HashBuilder::tagged(tag.as_str());
                for hash in &hashes {
                    builder.hash(hash);
                }
                builder.finish()
            }
            None => value.leaf_hash(),
        }
    }
}

fn record_comparer() -> CompositeComparer {
    CompositeComparer::new(vec![
        FieldComparer::new("address", TypeTag::Text, get_address, set_address),
        FieldComparer::new("labels", TypeTag::LabelSet, get_labels, set_labels),
        FieldComparer::new("group", TypeTag::Group, get_group, set_group),
    ])
    .with_identity(record_guid)
}

fn record_guid(value: &MetaValue) -> Option<String> {
    value.as_record().map(|record| record.guid.to_string())
}

fn label_set_comparer() -> ContainerComparer {
    ContainerComparer::new(TypeTag::Label, label_elements, insert_label, remove_label)
}

fn record_mut(parent: &mut MetaValue) -> Result<&mut agm_asset::AssetRecord, WriteError> {
    let found = parent.type_tag();
    match parent {
        MetaValue::Record(record) => Ok(record),
        _ => Err(WriteError::TypeMismatch {
            expected: TypeTag::Record,
            found,
        }),
    }
}

fn mismatch(expected: TypeTag, value: &MetaValue) -> WriteError {
    WriteError::TypeMismatch {
        expected,
        found: value.type_tag(),
    }
}

fn get_address(parent: &MetaValue) -> Option<MetaValue> {
    parent
        .as_record()
        .map(|record| MetaValue::Text(record.address.clone()))
}

fn set_address(parent: &mut MetaValue, value: Option<MetaValue>) -> Result<(), WriteError> {
    let record = record_mut(parent)?;
    match value {
        Some(MetaValue::Text(address)) => {
            record.address = address;
            Ok(())
        }
        Some(other) => Err(mismatch(TypeTag::Text, &other)),
        None => Err(WriteError::Required { field: "address" }),
    }
}

fn get_labels(parent: &MetaValue) -> Option<MetaValue> {
    parent
        .as_record()
        .map(|record| MetaValue::LabelSet(record.labels.clone()))
}

fn set_labels(parent: &mut MetaValue, value: Option<MetaValue>) -> Result<(), WriteError> {
    let record = record_mut(parent)?;
    match value {
        Some(MetaValue::LabelSet(labels)) => {
            record.labels = labels;
            Ok(())
        }
        Some(other) => Err(mismatch(TypeTag::LabelSet, &other)),
        None => Err(WriteError::Required { field: "labels" }),
    }
}

fn get_group(parent: &MetaValue) -> Option<MetaValue> {
    parent
        .as_record()
        .map(|record| MetaValue::Group(record.group.clone()))
}

fn set_group(parent: &mut MetaValue, value: Option<MetaValue>) -> Result<(), WriteError> {
    let record = record_mut(parent)?;
    match value {
        Some(MetaValue::Group(group)) => {
            record.group = group;
            Ok(())
        }
        Some(other) => Err(mismatch(TypeTag::Group, &other)),
        None => Err(WriteError::Required { field: "group" }),
    }
}

fn label_elements(container: &MetaValue) -> Vec<MetaValue> {
    container
        .as_labels()
        .map(|labels| labels.iter().cloned().map(MetaValue::Label).collect())
        .unwrap_or_default()
}

fn insert_label(container: &mut MetaValue, element: MetaValue) -> Result<(), WriteError> {
    let found = container.type_tag();
    let MetaValue::LabelSet(labels) = container else {
        return Err(WriteError::TypeMismatch {
            expected: TypeTag::LabelSet,
            found,
        });
    };
    match element {
        MetaValue::Label(label) => {
            labels.insert(label);
            Ok(())
        }
        other => Err(mismatch(TypeTag::Label, &other)),
    }
}

fn remove_label(container: &mut MetaValue, element: &MetaValue) {
    if let (MetaValue::LabelSet(labels), MetaValue::Label(label)) = (container, element) {
        labels.remove(label);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agm_asset::{AssetGuid, AssetRecord, GroupRef};
    use proptest::prelude::*;

    fn record(address: &str, labels: &[&str]) -> MetaValue {
        record_with_guid(1, address, labels)
    }

    fn record_with_guid(id: u128, address: &str, labels: &[&str]) -> MetaValue {
        MetaValue::Record(
            AssetRecord::new(AssetGuid::from_u128(id), address, GroupRef::named("G"))
                .with_labels(labels.iter().copied()),
        )
    }

    #[test]
    fn absent_hashes_to_zero() {
        let registry = ComparerRegistry::with_defaults();
        assert_eq!(registry.hash(None), ContentHash::ZERO);
        assert_eq!(registry.hash(None), registry.hash(None));
    }

    #[test]
    fn record_hash_tracks_every_field() {
        let registry = ComparerRegistry::with_defaults();
        let base = registry.hash(Some(&record("a", &["x"])));
        assert_ne!(base, registry.hash(Some(&record("b", &["x"]))));
        assert_ne!(base, registry.hash(Some(&record("a", &["y"]))));
        assert_eq!(base, registry.hash(Some(&record("a", &["x"]))));
    }

    #[test]
    fn record_hash_tracks_guid() {
        let registry = ComparerRegistry::with_defaults();
        let first = registry.hash(Some(&record_with_guid(1, "a", &["x"])));
        let second = registry.hash(Some(&record_with_guid(2, "a", &["x"])));
        assert_ne!(first, second);
        assert_eq!(record_comparer().fields().len(), 3);
    }

    #[test]
    fn container_hash_ignores_order() {
        let registry = ComparerRegistry::with_defaults();
        let left = MetaValue::LabelSet(["a", "b"].into_iter().map(String::from).collect());
        let right = MetaValue::LabelSet(["b", "a"].into_iter().map(String::from).collect());
        assert_eq!(registry.hash(Some(&left)), registry.hash(Some(&right)));
    }

    #[test]
    fn unregistered_type_is_a_leaf() {
        let registry = ComparerRegistry::new();
        let value = record("a", &["x"]);
        assert!(registry.resolve(TypeTag::Record).is_none());
        assert_eq!(registry.hash(Some(&value)), value.leaf_hash());
    }

    #[test]
    fn record_setters_reject_clearing_and_wrong_types() {
        let composite = record_comparer();
        let mut value = record("a", &[]);
        let address = composite.field("address").unwrap();

        assert_eq!(
            address.set(&mut value, None),
            Err(WriteError::Required { field: "address" })
        );
        assert!(matches!(
            address.set(&mut value, Some(MetaValue::Label("x".into()))),
            Err(WriteError::TypeMismatch { .. })
        ));
        address
            .set(&mut value, Some(MetaValue::Text("b".into())))
            .unwrap();
        assert_eq!(value.as_record().unwrap().address, "b");
    }

    #[test]
    fn label_container_insert_and_remove() {
        let container = label_set_comparer();
        let mut labels = MetaValue::LabelSet(Default::default());
        container
            .insert(&mut labels, MetaValue::Label("x".into()))
            .unwrap();
        assert_eq!(container.elements(&labels).len(), 1);
        container.remove(&mut labels, &MetaValue::Label("x".into()));
        assert!(container.elements(&labels).is_empty());
    }

    proptest! {
        #[test]
        fn hash_is_reflexive(address in "[a-z]{0,8}", labels in proptest::collection::vec("[a-z]{1,4}", 0..5)) {
            let registry = ComparerRegistry::with_defaults();
            let refs: Vec<&str> = labels.iter().map(String::as_str).collect();
            let value = record(&address, &refs);
            prop_assert_eq!(registry.hash(Some(&value)), registry.hash(Some(&value.clone())));
            prop_assert!(!registry.hash(Some(&value)).is_zero());
        }
    }
}
