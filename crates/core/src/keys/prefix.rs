//! Key prefix assignment.

use std::collections::HashMap;

use crate::error::{ItemError, Result};

/// Issues short, unique key prefixes per `(item type, attribute)` pair.
///
/// Candidates start with the upper-cased first character of the type name and
/// grow by one upper-cased character of the attribute at a time. The first
/// candidate nobody holds is issued.
#[derive(Debug, Clone, Default)]
pub struct PrefixRegistry {
    assigned: HashMap<String, String>,
    /// Prefix to the `<ItemType>.<attr>` pair holding it.
    owners: HashMap<String, String>,
}

impl PrefixRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the prefix for `item_type.attr`, assigning one on first use.
    pub fn assign(&mut self, item_type: &str, attr: &str) -> Result<String> {
        let mapping = mapping_key(item_type, attr);
        if let Some(prefix) = self.assigned.get(&mapping) {
            return Ok(prefix.clone());
        }

        let prefix = candidates(item_type, attr)
            .into_iter()
            .find(|candidate| !self.owners.contains_key(candidate))
            .ok_or_else(|| ItemError::PrefixSpaceExhausted {
                item_type: item_type.to_string(),
                attr: attr.to_string(),
            })?;

        self.owners.insert(prefix.clone(), mapping.clone());
        self.assigned.insert(mapping, prefix.clone());
        Ok(prefix)
    }

    /// Claims an explicitly chosen prefix for `item_type.attr` so it is never
    /// assigned to another pair.
    ///
    /// Fails with [`ItemError::PrefixInUse`] when a different pair already
    /// holds the prefix.
    pub fn reserve(&mut self, item_type: &str, attr: &str, prefix: &str) -> Result<()> {
        let mapping = mapping_key(item_type, attr);
        match self.owners.get(prefix) {
            Some(owner) if *owner != mapping => Err(ItemError::PrefixInUse {
                prefix: prefix.to_string(),
                item: mapping,
                owner: owner.clone(),
            }),
            Some(_) => Ok(()),
            None => {
                self.owners.insert(prefix.to_string(), mapping);
                Ok(())
            }
        }
    }

    /// The prefix already assigned to `item_type.attr`, if any.
    pub fn get(&self, item_type: &str, attr: &str) -> Option<&str> {
        self.assigned
            .get(&mapping_key(item_type, attr))
            .map(String::as_str)
    }

    pub fn is_issued(&self, prefix: &str) -> bool {
        self.owners.contains_key(prefix)
    }

    /// All assignments as `("<ItemType>.<attr>", prefix)` pairs.
    pub fn assignments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.assigned.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn mapping_key(item_type: &str, attr: &str) -> String {
    format!("{item_type}.{attr}")
}

fn candidates(item_type: &str, attr: &str) -> Vec<String> {
    let mut current: String = item_type
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default();

    let mut out = Vec::with_capacity(attr.len() + 1);
    if !current.is_empty() {
        out.push(current.clone());
    }
    for c in attr.chars() {
        current.extend(c.to_uppercase());
        out.push(current.clone());
    }
    out
}
