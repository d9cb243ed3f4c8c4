//! Application definition model

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::EMPTY_ULID;

fn empty_ulid() -> String {
    EMPTY_ULID.to_string()
}

/// Complete application definition
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppDef {
    pub name: String,
    #[serde(default)]
    pub data_classes: Vec<DataClass>,
    #[serde(default)]
    pub model_classes: Vec<DataClass>,
    #[serde(default)]
    pub struct_classes: Vec<DataClass>,
    /// Instances keyed by data class name
    #[serde(default)]
    pub data_class_instances: BTreeMap<String, Vec<DataClassInstance>>,
    #[serde(default)]
    pub inventories: Vec<InventoryDef>,
}

impl AppDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Class declaration (data, model or struct class)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataClass {
    #[serde(default = "empty_ulid")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<DataClassField>,
}

impl DataClass {
    pub fn new(name: impl Into<String>, fields: Vec<DataClassField>) -> Self {
        Self {
            id: empty_ulid(),
            name: name.into(),
            fields,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataClassField {
    pub name: String,
    pub typename: String,
    #[serde(default)]
    pub default_value: Option<String>,
}

impl DataClassField {
    pub fn new(name: impl Into<String>, typename: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            typename: typename.into(),
            default_value: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Concrete instance of a data class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DataClassInstance {
    #[serde(default = "empty_ulid")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub fields: Vec<InstanceField>,
}

/// Field values are carried as strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceField {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InventoryDef {
    pub name: String,
    #[serde(default)]
    pub items: Vec<InventoryItemDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InventoryItemDef {
    pub id: String,
    pub typename: String,
}
