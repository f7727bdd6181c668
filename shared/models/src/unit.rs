use serde::{Deserialize, Serialize};
use std::fmt;

/// A unit of measure. Two units are the same unit iff their names match;
/// the optional IRI is carried along for reporting only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub iri: Option<String>,
}

impl Unit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            iri: None,
        }
    }

    pub fn with_iri(name: impl Into<String>, iri: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            iri: Some(iri.into()),
        }
    }
}

impl PartialEq for Unit {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Unit {}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
