//! ---
//! sw_section: "02-deployment-engine"
//! sw_subsection: "module"
//! sw_type: "source"
//! sw_scope: "code"
//! sw_description: "Parameter reconciliation under controller ownership."
//! sw_version: "v0.1.0"
//! sw_owner: "tbd"
//! ---
use std::collections::HashSet;

use indexmap::IndexMap;
use stackway_common::stack::Parameter;

/// Set of parameter keys whose authoritative value is owned by a running
/// environment controller rather than by deployment-time configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ControllerManagedKeys(HashSet<String>);

impl ControllerManagedKeys {
    /// Build the set from any iterator of keys.
    pub fn new<I, K>(keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        Self(keys.into_iter().map(Into::into).collect())
    }

    /// Whether `key` is controller managed.
    pub fn contains(&self, key: &str) -> bool {
        self.0.contains(key)
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<K> for ControllerManagedKeys {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Merge a desired parameter set with the previously deployed set under a
/// controller-ownership policy.
///
/// Every desired record is emitted exactly once. A record whose key is
/// controller managed and has a previously deployed value is rewritten to
/// retain that deployed value; its explicit desired value is discarded. Keys
/// present only in `deployed` are dropped, never reintroduced. Pure and
/// total; duplicate keys within `desired` are a caller contract violation
/// resolved last-writer-wins.
pub fn reconcile(
    desired: &[Parameter],
    deployed: &[Parameter],
    controller_managed: &ControllerManagedKeys,
) -> Vec<Parameter> {
    let previous: IndexMap<&str, &Parameter> = deployed
        .iter()
        .map(|parameter| (parameter.key.as_str(), parameter))
        .collect();

    let mut merged: IndexMap<String, Parameter> = IndexMap::with_capacity(desired.len());
    for parameter in desired {
        let record = if previous.contains_key(parameter.key.as_str())
            && controller_managed.contains(&parameter.key)
        {
            Parameter::previous(&parameter.key)
        } else {
            parameter.clone()
        };
        merged.insert(record.key.clone(), record);
    }
    merged.into_values().collect()
}
