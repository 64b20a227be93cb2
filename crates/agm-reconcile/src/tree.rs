//! Comparison trees
//!
//! A [`ComparisonTree`] is the three-way structural diff of one asset path.
//! Entries live in an arena and refer to each other by [`EntryId`]; the
//! root is always [`EntryId::ROOT`].

use crate::comparer::ComparerRegistry;
use crate::value::{MetaValue, TypeTag};
use agm_asset::{AssetPath, ContentHash};
use agm_store::StoreKind;
use std::collections::BTreeMap;
use std::fmt::{self, Display, Formatter};
use std::ops::{Index, IndexMut};

/// Store pairs that get a pairwise result, in reporting order
pub const ADJACENT_PAIRS: [(StoreKind, StoreKind); 2] = [
    (StoreKind::Simulated, StoreKind::Sidecar),
    (StoreKind::Sidecar, StoreKind::Live),
];

/// One value per store
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PerStore<T> {
    /// Simulated store's value
    pub simulated: T,
    /// Sidecar store's value
    pub sidecar: T,
    /// Live store's value
    pub live: T,
}

impl<T> PerStore<T> {
    /// Build each slot from its kind
    pub fn from_fn(mut f: impl FnMut(StoreKind) -> T) -> Self {
        Self {
            simulated: f(StoreKind::Simulated),
            sidecar: f(StoreKind::Sidecar),
            live: f(StoreKind::Live),
        }
    }

    /// Map every slot
    pub fn map<U>(&self, mut f: impl FnMut(StoreKind, &T) -> U) -> PerStore<U> {
        PerStore::from_fn(|kind| f(kind, &self[kind]))
    }

    /// `(kind, value)` pairs in [`StoreKind::ALL`] order
    pub fn iter(&self) -> impl Iterator<Item = (StoreKind, &T)> {
        StoreKind::ALL.into_iter().map(move |kind| (kind, &self[kind]))
    }
}

impl<T> Index<StoreKind> for PerStore<T> {
    type Output = T;

    fn index(&self, kind: StoreKind) -> &T {
        match kind {
            StoreKind::Simulated => &self.simulated,
            StoreKind::Sidecar => &self.sidecar,
            StoreKind::Live => &self.live,
        }
    }
}

impl<T> IndexMut<StoreKind> for PerStore<T> {
    fn index_mut(&mut self, kind: StoreKind) -> &mut T {
        match kind {
            StoreKind::Simulated => &mut self.simulated,
            StoreKind::Sidecar => &mut self.sidecar,
            StoreKind::Live => &mut self.live,
        }
    }
}

/// One store's side of an entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    /// Value, `None` when the store has nothing here
    pub value: Option<MetaValue>,
    /// Equality hash of `value`
    pub hash: ContentHash,
    /// Whether writes to this side are refused
    pub read_only: bool,
}

impl Operand {
    pub(crate) fn new(
        registry: &ComparerRegistry,
        value: Option<MetaValue>,
        read_only: bool,
    ) -> Self {
        let hash = registry.hash(value.as_ref());
        Self {
            value,
            hash,
            read_only,
        }
    }

    /// Whether the store has nothing here
    #[inline]
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.value.is_none()
    }
}

/// Index of an entry in its tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntryId(pub(crate) usize);

impl EntryId {
    /// The root entry
    pub const ROOT: Self = Self(0);

    /// Position in the arena
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        self.0
    }
}

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One step from a parent value to a child value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldStep {
    /// Named composite field
    Field(&'static str),
    /// Container element, identified by value
    Element(MetaValue),
}

impl Display for FieldStep {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => f.write_str(name),
            Self::Element(element) => write!(f, "[{element}]"),
        }
    }
}

/// How an entry was expanded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Children are declared fields
    Composite,
    /// Children are paired elements
    Container,
    /// No children
    Leaf,
}

impl EntryKind {
    fn as_str(self) -> &'static str {
        match self {
            Self::Composite => "composite",
            Self::Container => "container",
            Self::Leaf => "leaf",
        }
    }
}

/// Node of a [`ComparisonTree`]
#[derive(Debug, Clone)]
pub struct ComparisonEntry {
    /// Field name, element rendering, or the asset path at the root
    pub name: String,
    /// Type declared by the parent, `None` at the root
    pub declared: Option<TypeTag>,
    /// Expansion used
    pub kind: EntryKind,
    /// Per-store operands
    pub operands: PerStore<Operand>,
    /// Equality per [`ADJACENT_PAIRS`] entry
    pub pairwise: BTreeMap<(StoreKind, StoreKind), bool>,
    /// Children in discovery order
    pub children: Vec<EntryId>,
    /// Parent, `None` at the root
    pub parent: Option<EntryId>,
    /// Steps from the root record to this value
    pub steps: Vec<FieldStep>,
    /// Set by a merge below or at this entry; cleared by refresh
    pub dirty: bool,
}

impl ComparisonEntry {
    pub(crate) fn compute_pairwise(operands: &PerStore<Operand>) -> BTreeMap<(StoreKind, StoreKind), bool> {
        ADJACENT_PAIRS
            .into_iter()
            .map(|(a, b)| ((a, b), operands[a].hash == operands[b].hash))
            .collect()
    }

    /// Pairwise result for an adjacent pair
    #[must_use]
    pub fn matches(&self, a: StoreKind, b: StoreKind) -> Option<bool> {
        self.pairwise
            .get(&(a, b))
            .or_else(|| self.pairwise.get(&(b, a)))
            .copied()
    }

    /// Whether any adjacent pair differs
    #[must_use]
    pub fn differs(&self) -> bool {
        self.pairwise.values().any(|equal| !equal)
    }

    /// Operand of one store
    #[inline]
    #[must_use]
    pub fn operand(&self, kind: StoreKind) -> &Operand {
        &self.operands[kind]
    }
}

/// Three-way structural diff of one asset path
#[derive(Debug, Clone)]
pub struct ComparisonTree {
    path: AssetPath,
    entries: Vec<ComparisonEntry>,
}

impl ComparisonTree {
    pub(crate) fn new(path: AssetPath, entries: Vec<ComparisonEntry>) -> Self {
        Self { path, entries }
    }

    /// Compared path
    #[inline]
    #[must_use]
    pub fn path(&self) -> &AssetPath {
        &self.path
    }

    /// Root entry
    #[must_use]
    pub fn root(&self) -> &ComparisonEntry {
        &self.entries[EntryId::ROOT.0]
    }

    /// Entry by id
    #[must_use]
    pub fn get(&self, id: EntryId) -> Option<&ComparisonEntry> {
        self.entries.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: EntryId) -> Option<&mut ComparisonEntry> {
        self.entries.get_mut(id.0)
    }

    /// Number of entries; never zero, a tree has at least its root
    #[must_use]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Every entry, in depth-first order
    pub fn iter(&self) -> impl Iterator<Item = (EntryId, &ComparisonEntry)> {
        self.entries
            .iter()
            .enumerate()
            .map(|(idx, entry)| (EntryId(idx), entry))
    }

    /// Children of an entry
    pub fn children(&self, id: EntryId) -> impl Iterator<Item = (EntryId, &ComparisonEntry)> {
        self.get(id)
            .map(|entry| entry.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(move |child| (*child, &self.entries[child.0]))
    }

    /// Child of an entry by name
    #[must_use]
    pub fn child_named(&self, id: EntryId, name: &str) -> Option<EntryId> {
        self.children(id)
            .find(|(_, entry)| entry.name == name)
            .map(|(child, _)| child)
    }

    /// Entry reached by following child names from the root
    #[must_use]
    pub fn lookup(&self, names: &[&str]) -> Option<EntryId> {
        names
            .iter()
            .try_fold(EntryId::ROOT, |id, name| self.child_named(id, name))
    }

    /// Parent chain, nearest first
    pub fn ancestors(&self, id: EntryId) -> impl Iterator<Item = EntryId> + '_ {
        std::iter::successors(self.get(id).and_then(|entry| entry.parent), move |current| {
            self.get(*current).and_then(|entry| entry.parent)
        })
    }

    /// Whether an entry was touched by a merge since the last refresh
    #[must_use]
    pub fn is_dirty(&self, id: EntryId) -> bool {
        self.get(id).is_some_and(|entry| entry.dirty)
    }

    /// Whether the root shows drift between any adjacent pair
    #[must_use]
    pub fn has_drift(&self) -> bool {
        self.root().differs()
    }

    /// Every entry that differs, in depth-first order
    pub fn differing(&self) -> impl Iterator<Item = (EntryId, &ComparisonEntry)> {
        self.iter().filter(|(_, entry)| entry.differs())
    }

    /// Record a write of `value` into `dest` at `id`
    ///
    /// Marks the entry, its descendants and its ancestors dirty.
    pub(crate) fn apply_write(
        &mut self,
        registry: &ComparerRegistry,
        id: EntryId,
        dest: StoreKind,
        value: Option<MetaValue>,
    ) {
        if let Some(entry) = self.get_mut(id) {
            let read_only = entry.operands[dest].read_only;
            entry.operands[dest] = Operand::new(registry, value, read_only);
            entry.pairwise = ComparisonEntry::compute_pairwise(&entry.operands);
        }

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.get_mut(current) {
                entry.dirty = true;
                stack.extend(entry.children.iter().copied());
            }
        }
        let ancestors: Vec<_> = self.ancestors(id).collect();
        for ancestor in ancestors {
            if let Some(entry) = self.get_mut(ancestor) {
                entry.dirty = true;
            }
        }
    }

    fn render(&self, f: &mut Formatter<'_>, id: EntryId, depth: usize) -> fmt::Result {
        let Some(entry) = self.get(id) else {
            return Ok(());
        };
        write!(f, "{:indent$}{} <{}>", "", entry.name, entry.kind.as_str(), indent = depth * 2)?;
        for ((a, b), equal) in &entry.pairwise {
            write!(f, " {a}{}{b}", if *equal { "==" } else { "!=" })?;
        }
        if entry.dirty {
            f.write_str(" (dirty)")?;
        }
        writeln!(f)?;
        if entry.kind == EntryKind::Leaf && entry.differs() {
            for (kind, operand) in entry.operands.iter() {
                match &operand.value {
                    Some(value) => writeln!(f, "{:indent$}{kind}: {value}", "", indent = depth * 2 + 4)?,
                    None => writeln!(f, "{:indent$}{kind}: -", "", indent = depth * 2 + 4)?,
                }
            }
        }
        for child in &entry.children {
            self.render(f, *child, depth + 1)?;
        }
        Ok(())
    }
}

impl Display for ComparisonTree {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.render(f, EntryId::ROOT, 0)
    }
}
