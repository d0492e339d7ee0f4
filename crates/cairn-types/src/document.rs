//! Metadata documents.
//!
//! A [`Document`] is an ordered list of flat [`Record`]s. The first record
//! describes the entity itself; every following record describes an
//! ancestor in its processing chain, most recent first. Order is lineage and
//! is preserved through every read, write, and merge.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::TypeError;

/// One flat key-value record of a document.
pub type Record = Map<String, Value>;

/// Ordered sequence of records: the entity first, then its lineage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document(Vec<Record>);

impl Document {
    /// An empty document with no records.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// A document describing a single entity with no lineage.
    pub fn from_record(record: Record) -> Self {
        Self(vec![record])
    }

    /// Interpret a decoded value as a document.
    ///
    /// A single object is a one-record document, a list of objects is taken
    /// as-is. Any other shape is rejected.
    pub fn from_value(value: Value) -> Result<Self, TypeError> {
        match value {
            Value::Object(record) => Ok(Self::from_record(record)),
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(i, item)| match item {
                    Value::Object(record) => Ok(record),
                    other => Err(TypeError::InvalidDocument(format!(
                        "record {i} is {}, expected an object",
                        value_kind(&other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()
                .map(Self),
            other => Err(TypeError::InvalidDocument(format!(
                "top level is {}, expected an object or a list of objects",
                value_kind(&other)
            ))),
        }
    }

    /// The document as a JSON value (always a list).
    pub fn to_value(&self) -> Value {
        Value::Array(self.0.iter().cloned().map(Value::Object).collect())
    }

    /// The record describing the entity itself.
    pub fn head(&self) -> Option<&Record> {
        self.0.first()
    }

    /// Mutable access to the head record, creating it if the document is empty.
    pub fn head_mut(&mut self) -> &mut Record {
        if self.0.is_empty() {
            self.0.push(Record::new());
        }
        &mut self.0[0]
    }

    /// Look up a key in the head record.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.head().and_then(|r| r.get(key))
    }

    /// Ancestor records, most recent first.
    pub fn lineage(&self) -> &[Record] {
        self.0.get(1..).unwrap_or(&[])
    }

    /// All records in lineage order.
    pub fn records(&self) -> &[Record] {
        &self.0
    }

    /// Append `ancestors` after this document's records.
    ///
    /// Used when an entity wraps another one: the wrapper's records come
    /// first, the wrapped entity's whole document follows.
    pub fn chain(mut self, ancestors: Document) -> Self {
        self.0.extend(ancestors.0);
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_records(self) -> Vec<Record> {
        self.0
    }
}

impl From<Vec<Record>> for Document {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}

impl From<Record> for Document {
    fn from(record: Record) -> Self {
        Self::from_record(record)
    }
}

impl IntoIterator for Document {
    type Item = Record;
    type IntoIter = std::vec::IntoIter<Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = &'a Record;
    type IntoIter = std::slice::Iter<'a, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a bool",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
