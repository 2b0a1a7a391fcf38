use crate::config::KeyPrecedence;
use crate::vocab::VocabularyName;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

pub const SCHEMA_CONTEXT: &str = "https://schema.org";
pub const CONTEXT_KEY: &str = "@context";
pub const TYPE_KEY: &str = "@type";

/// Property name -> user-entered value. Blank values are never stored.
pub type PopulatedProperties = IndexMap<String, String>;

/// Result of one "generate" action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Composition {
    /// The new document on its own
    Generated(Value),
    /// Page documents followed by the new document
    Merged(Vec<Value>),
}

impl Composition {
    /// The document this composition was built around
    pub fn generated(&self) -> Option<&Value> {
        match self {
            Composition::Generated(doc) => Some(doc),
            Composition::Merged(docs) => docs.last(),
        }
    }

    pub fn is_merged(&self) -> bool {
        matches!(self, Composition::Merged(_))
    }

    pub fn to_value(&self) -> Value {
        match self {
            Composition::Generated(doc) => doc.clone(),
            Composition::Merged(docs) => Value::Array(docs.clone()),
        }
    }
}

/// Insert a value, or drop the entry when the value is blank.
pub fn set_property(values: &mut PopulatedProperties, name: &str, value: &str) {
    if value.trim().is_empty() {
        values.shift_remove(name);
    } else {
        values.insert(name.to_string(), value.to_string());
    }
}

/// Build `{"@context": "https://schema.org", "@type": <name>, ...values}`.
///
/// `@context` and `@type` always lead the object. With
/// [`KeyPrecedence::Reserved`] user entries under those names are dropped;
/// with [`KeyPrecedence::User`] they replace the fixed values in place.
pub fn compose_document(
    vocabulary: &VocabularyName,
    values: &PopulatedProperties,
    precedence: KeyPrecedence,
) -> Value {
    let mut doc = Map::new();
    doc.insert(CONTEXT_KEY.to_string(), Value::String(SCHEMA_CONTEXT.to_string()));
    doc.insert(TYPE_KEY.to_string(), Value::String(vocabulary.to_string()));

    for (name, value) in values {
        if value.trim().is_empty() {
            continue;
        }
        if (name == CONTEXT_KEY || name == TYPE_KEY) && precedence == KeyPrecedence::Reserved {
            warn!("Ignoring user value for reserved key {}", name);
            continue;
        }
        doc.insert(name.clone(), Value::String(value.clone()));
    }

    Value::Object(doc)
}

/// Append the new document after the existing ones
pub fn merge_documents(existing: &[Value], new_document: Value) -> Vec<Value> {
    let mut merged = Vec::with_capacity(existing.len() + 1);
    merged.extend_from_slice(existing);
    merged.push(new_document);
    merged
}

/// Compose the new document and merge it when asked to and there is something to merge into.
pub fn compose(
    vocabulary: &VocabularyName,
    values: &PopulatedProperties,
    existing: &[Value],
    merge: bool,
    precedence: KeyPrecedence,
) -> Composition {
    let document = compose_document(vocabulary, values, precedence);
    if merge && !existing.is_empty() {
        Composition::Merged(merge_documents(existing, document))
    } else {
        Composition::Generated(document)
    }
}
