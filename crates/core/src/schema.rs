//! Record shapes.
//!
//! Rust has no runtime reflection, so every record type describes its own
//! fields through [`Record::schema`]. Item construction checks key attributes
//! against this description.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A single declared field of a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    /// `true` when the field may be absent or `null` (an `Option<_>` field).
    pub optional: bool,
}

/// The declared shape of a record type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    type_name: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Creates an empty schema for the given type name.
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a required field.
    pub fn required(mut self, name: impl Into<String>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            optional: false,
        });
        self
    }

    /// Adds an optional field.
    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            optional: true,
        });
        self
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The first declared field, used as the default partition key.
    pub fn first_field(&self) -> Option<&Field> {
        self.fields.first()
    }
}

/// A typed record that can be stored through an item mapper.
///
/// ```
/// use dynamo_items_core::{Record, Schema};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct User {
///     id: String,
///     email: Option<String>,
/// }
///
/// impl Record for User {
///     fn schema() -> Schema {
///         Schema::new("User").required("id").optional("email")
///     }
/// }
/// ```
pub trait Record: Serialize + DeserializeOwned + Send + Sync {
    fn schema() -> Schema;
}
