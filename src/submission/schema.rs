use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Element definitions of a form, keyed by machine name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct FormSchema(pub BTreeMap<String, Element>);

impl FormSchema {
    pub fn get(&self, key: &str) -> Option<&Element> {
        self.0.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, element: Element) {
        self.0.insert(key.into(), element);
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Element {
    #[serde(rename = "type", default)]
    pub kind: ElementKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Sub-elements of a composite. The address lookup nests its
    /// editable parts one level down, under `address_entry`.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub composite: BTreeMap<String, Element>,
}

impl Element {
    pub fn new(kind: impl Into<ElementKind>, title: &str) -> Self {
        Self {
            kind: kind.into(),
            title: Some(title.to_string()),
            composite: BTreeMap::new(),
        }
    }

    pub fn with_child(mut self, key: &str, child: Element) -> Self {
        self.composite.insert(key.to_string(), child);
        self
    }

    /// Title of a direct composite child, empty when undeclared.
    pub fn child_title(&self, key: &str) -> String {
        self.composite
            .get(key)
            .and_then(|child| child.title.clone())
            .unwrap_or_default()
    }

    /// Title of an address part, `None` for parts the form doesn't ask about.
    pub fn address_part_title(&self, key: &str) -> Option<&str> {
        self.composite
            .get(ADDRESS_ENTRY)
            .and_then(|entry| entry.composite.get(key))
            .and_then(|part| part.title.as_deref())
            .filter(|title| !title.is_empty())
    }
}

const ADDRESS_ENTRY: &str = "address_entry";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ElementKind {
    Date,
    DateOfBirth,
    AddressLookup,
    DocumentFile,
    Value,
    Other(String),
}

impl ElementKind {
    pub fn is_date(&self) -> bool {
        matches!(self, ElementKind::Date | ElementKind::DateOfBirth)
    }

    pub fn as_str(&self) -> &str {
        match self {
            ElementKind::Date => "bhcc_webform_date",
            ElementKind::DateOfBirth => "bhcc_webform_date_of_birth",
            ElementKind::AddressLookup => "bhcc_central_hub_webform_uk_address",
            ElementKind::DocumentFile => "webform_document_file",
            ElementKind::Value => "value",
            ElementKind::Other(name) => name,
        }
    }
}

impl Default for ElementKind {
    fn default() -> Self {
        ElementKind::Other(String::new())
    }
}

impl From<String> for ElementKind {
    fn from(s: String) -> Self {
        match s.as_str() {
            "bhcc_webform_date" => ElementKind::Date,
            "bhcc_webform_date_of_birth" => ElementKind::DateOfBirth,
            "bhcc_central_hub_webform_uk_address" => ElementKind::AddressLookup,
            "webform_document_file" => ElementKind::DocumentFile,
            "value" => ElementKind::Value,
            _ => ElementKind::Other(s),
        }
    }
}

impl From<&str> for ElementKind {
    fn from(s: &str) -> Self {
        ElementKind::from(s.to_string())
    }
}

impl From<ElementKind> for String {
    fn from(kind: ElementKind) -> Self {
        kind.as_str().to_string()
    }
}
