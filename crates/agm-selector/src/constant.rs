//! Constant selector

use crate::selector::{GroupSelector, SelectError, SelectionKey};
use agm_asset::GroupRef;

/// Always selects the same group
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantSelector {
    group: GroupRef,
}

impl ConstantSelector {
    /// Selector returning `group`
    #[inline]
    #[must_use]
    pub fn new(group: GroupRef) -> Self {
        Self { group }
    }

    /// The fixed group
    #[inline]
    #[must_use]
    pub fn group(&self) -> &GroupRef {
        &self.group
    }
}

impl GroupSelector for ConstantSelector {
    fn select(&self, _key: SelectionKey<'_>) -> Result<GroupRef, SelectError> {
        Ok(self.group.clone())
    }

    fn name(&self) -> &'static str {
        "constant"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn ignores_the_key() {
        let selector = ConstantSelector::new(GroupRef::named("Shared"));
        let empty = BTreeSet::new();
        assert_eq!(
            selector.select(SelectionKey::Candidates(&empty)).unwrap(),
            GroupRef::named("Shared")
        );
        assert_eq!(
            selector.select(SelectionKey::Path("Assets/x.png")).unwrap(),
            GroupRef::named("Shared")
        );
    }
}
