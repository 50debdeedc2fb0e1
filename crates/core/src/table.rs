use crate::keys::{Key, KeySlot, ScalarType};

/// Key schema of a physical table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    pub name: String,
    pub partition_key: ScalarType,
    pub sort_key: Option<ScalarType>,
}

impl TableSchema {
    /// A table with a string partition key and no sort key.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            partition_key: ScalarType::String,
            sort_key: None,
        }
    }

    pub fn with_partition_key(mut self, scalar: ScalarType) -> Self {
        self.partition_key = scalar;
        self
    }

    pub fn with_sort_key(mut self, scalar: ScalarType) -> Self {
        self.sort_key = Some(scalar);
        self
    }

    /// The scalar type declared for a key slot, `None` for a missing sort key.
    pub fn slot_type(&self, slot: KeySlot) -> Option<ScalarType> {
        match slot {
            KeySlot::Partition => Some(self.partition_key),
            KeySlot::Sort => self.sort_key,
        }
    }
}

/// A secondary index descriptor.
///
/// Indexes are recorded on tables and items but no operation reads them yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecondaryIndex {
    pub name: Option<String>,
    pub pk: Key,
    pub sk: Option<Key>,
}

impl SecondaryIndex {
    pub fn new(pk: Key) -> Self {
        Self {
            name: None,
            pk,
            sk: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_sort_key(mut self, sk: Key) -> Self {
        self.sk = Some(sk);
        self
    }
}
