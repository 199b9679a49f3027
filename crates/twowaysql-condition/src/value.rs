//! Per-column condition state.

use std::collections::BTreeMap;
use std::panic::Location;

use twowaysql_model::ParameterValue;

use crate::key::ConditionKey;

/// A value fixed for one condition key on a column.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedCondition {
    /// The registered value (after like-search escaping).
    pub value: ParameterValue,
    /// Index of the clause fragment that binds it.
    pub location: usize,
}

/// Fixed values and duplicate notices for one column.
#[derive(Debug, Clone, Default)]
pub struct ConditionValue {
    fixed: BTreeMap<ConditionKey, FixedCondition>,
    notices: BTreeMap<ConditionKey, Vec<&'static Location<'static>>>,
}

impl ConditionValue {
    /// The fixed condition for `key`, if any.
    #[must_use]
    pub fn fixed(&self, key: ConditionKey) -> Option<&FixedCondition> {
        self.fixed.get(&key)
    }

    /// Whether `key` already has a fixed value.
    #[must_use]
    pub fn has_fixed(&self, key: ConditionKey) -> bool {
        self.fixed.contains_key(&key)
    }

    /// Record the first value for `key`.
    pub fn set_fixed(&mut self, key: ConditionKey, value: ParameterValue, location: usize) {
        self.fixed.insert(key, FixedCondition { value, location });
    }

    /// Replace the value for `key`, keeping its clause location.
    pub fn override_fixed(&mut self, key: ConditionKey, value: ParameterValue) {
        if let Some(fixed) = self.fixed.get_mut(&key) {
            fixed.value = value;
        }
    }

    /// Remember a call site that re-applied an identical value.
    pub fn register_duplicate(&mut self, key: ConditionKey, caller: &'static Location<'static>) {
        self.notices.entry(key).or_default().push(caller);
    }

    /// Call sites that re-applied an identical value for `key`.
    #[must_use]
    pub fn duplicate_notices(&self, key: ConditionKey) -> &[&'static Location<'static>] {
        self.notices.get(&key).map(Vec::as_slice).unwrap_or_default()
    }

    /// Forget every fixed value and notice.
    pub fn clear(&mut self) {
        self.fixed.clear();
        self.notices.clear();
    }
}
