//! Schema registry lookups.
//!
//! The registry answers whether an identifier denotes a known claim or
//! credential type, and which fields it exposes. Loading and authoring
//! schemas happens elsewhere.
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::identifier::Identifier;

pub trait SchemaRegistry: Send + Sync {
    /// Returns `true` if `identifier` is a known claim or credential.
    fn exists(&self, identifier: &str) -> bool;

    /// Returns the fields exposed by `identifier`, or `None` if it is unknown.
    fn fields(&self, identifier: &str) -> Option<BTreeSet<String>>;
}

impl<T: ?Sized + SchemaRegistry> SchemaRegistry for &T {
    fn exists(&self, identifier: &str) -> bool {
        T::exists(*self, identifier)
    }

    fn fields(&self, identifier: &str) -> Option<BTreeSet<String>> {
        T::fields(*self, identifier)
    }
}

impl<T: ?Sized + SchemaRegistry> SchemaRegistry for Arc<T> {
    fn exists(&self, identifier: &str) -> bool {
        T::exists(self, identifier)
    }

    fn fields(&self, identifier: &str) -> Option<BTreeSet<String>> {
        T::fields(self, identifier)
    }
}

/// In-memory registry of already loaded schemas.
///
/// Only well-formed identifiers (see [`Identifier`]) are ever reported as
/// known.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticSchemaRegistry {
    schemas: BTreeMap<String, BTreeSet<String>>,
}

impl StaticSchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema and its top-level fields.
    pub fn with_schema<I, F>(mut self, identifier: impl Into<String>, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.insert(identifier, fields);
        self
    }

    pub fn insert<I, F>(&mut self, identifier: impl Into<String>, fields: I)
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.schemas.insert(
            identifier.into(),
            fields.into_iter().map(Into::into).collect(),
        );
    }

    /// Reads a registry from a JSON object mapping identifiers to field
    /// lists.
    pub fn from_json_str(json: &str) -> Result<Self, Error> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl SchemaRegistry for StaticSchemaRegistry {
    fn exists(&self, identifier: &str) -> bool {
        Identifier::parse(identifier).is_ok() && self.schemas.contains_key(identifier)
    }

    fn fields(&self, identifier: &str) -> Option<BTreeSet<String>> {
        if !self.exists(identifier) {
            return None;
        }

        self.schemas.get(identifier).cloned()
    }
}
