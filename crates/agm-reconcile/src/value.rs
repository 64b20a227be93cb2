//! Comparable metadata values
//!
//! [`MetaValue`] is the closed set of shapes the reconciliation engine can
//! meet while walking an asset record. Each value reports its concrete
//! [`TypeTag`], which is what comparers are registered against.

use agm_asset::{AssetRecord, ContentHash, GroupRef, HashBuilder, Labels};
use std::fmt::{self, Display, Formatter};

/// Concrete type of a [`MetaValue`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeTag {
    /// Whole asset record
    Record,
    /// Group reference
    Group,
    /// Free text (addresses)
    Text,
    /// Set of labels
    LabelSet,
    /// Single label
    Label,
}

impl TypeTag {
    /// Stable name, also used as the hash domain tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Record => "record",
            Self::Group => "group",
            Self::Text => "text",
            Self::LabelSet => "label_set",
            Self::Label => "label",
        }
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One store's value at some point of the comparison tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    /// Whole record
    Record(AssetRecord),
    /// Group reference
    Group(GroupRef),
    /// Free text
    Text(String),
    /// Label set
    LabelSet(Labels),
    /// One label
    Label(String),
}

impl MetaValue {
    /// Concrete type
    #[must_use]
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Record(_) => TypeTag::Record,
            Self::Group(_) => TypeTag::Group,
            Self::Text(_) => TypeTag::Text,
            Self::LabelSet(_) => TypeTag::LabelSet,
            Self::Label(_) => TypeTag::Label,
        }
    }

    /// Hash of the value taken as a whole, without consulting comparers
    ///
    /// Used for values whose type has no registered comparer.
    #[must_use]
    pub fn leaf_hash(&self) -> ContentHash {
        let mut builder = HashBuilder::tagged(self.type_tag().as_str());
        match self {
            Self::Record(record) => {
                builder
                    .str(&record.guid.to_string())
                    .str(&record.address)
                    .str(record.group.name())
                    .hash(record.group.content_hash());
                for label in &record.labels {
                    builder.str(label);
                }
            }
            Self::Group(group) => {
                builder.str(group.name()).hash(group.content_hash());
            }
            Self::Text(text) | Self::Label(text) => {
                builder.str(text);
            }
            Self::LabelSet(labels) => {
                for label in labels {
                    builder.str(label);
                }
            }
        }
        builder.finish()
    }

    /// Record payload, if this is a record
    #[must_use]
    pub fn as_record(&self) -> Option<&AssetRecord> {
        match self {
            Self::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Label set payload, if this is a label set
    #[must_use]
    pub fn as_labels(&self) -> Option<&Labels> {
        match self {
            Self::LabelSet(labels) => Some(labels),
            _ => None,
        }
    }
}

impl Display for MetaValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Record(record) => write!(f, "{} ({})", record.address, record.guid),
            Self::Group(group) => write!(f, "{group}"),
            Self::Text(text) => write!(f, "{text:?}"),
            Self::LabelSet(labels) => {
                let labels: Vec<_> = labels.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", labels.join(", "))
            }
            Self::Label(label) => f.write_str(label),
        }
    }
}

impl From<AssetRecord> for MetaValue {
    fn from(record: AssetRecord) -> Self {
        Self::Record(record)
    }
}

impl From<GroupRef> for MetaValue {
    fn from(group: GroupRef) -> Self {
        Self::Group(group)
    }
}
