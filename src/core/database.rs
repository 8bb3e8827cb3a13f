use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::error::StorageError;
use super::table::Table;
use super::value::Value;

/// In-memory relational store: the reference storage collaborator the query
/// engine executes against. Transaction boundaries, pooling and durability
/// are the caller's concern, not this store's.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    pub tables: HashMap<String, Table>,
}

impl Database {
    #[must_use]
    pub fn new(name: String) -> Self {
        Self {
            name,
            tables: HashMap::new(),
        }
    }

    pub fn create_table(&mut self, table: Table) -> Result<(), StorageError> {
        if self.tables.contains_key(&table.name) {
            return Err(StorageError::TableAlreadyExists(table.name));
        }
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    pub fn drop_table(&mut self, name: &str) -> Result<(), StorageError> {
        self.tables
            .remove(name)
            .ok_or_else(|| StorageError::TableNotFound(name.to_string()))?;
        Ok(())
    }

    #[must_use]
    pub fn get_table(&self, name: &str) -> Option<&Table> {
        self.tables.get(name)
    }

    #[must_use]
    pub fn get_table_mut(&mut self, name: &str) -> Option<&mut Table> {
        self.tables.get_mut(name)
    }

    /// Inserts a row into `table`, returning the store-assigned identity.
    pub fn insert(&mut self, table: &str, values: Vec<Value>) -> Result<Value, StorageError> {
        self.tables
            .get_mut(table)
            .ok_or_else(|| StorageError::TableNotFound(table.to_string()))?
            .insert(values)
    }

    /// Serializes the whole store (schemas, rows, sequences) to JSON.
    pub fn export_json(&self) -> Result<String, StorageError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restores a store previously written by [`Self::export_json`].
    pub fn import_json(json: &str) -> Result<Self, StorageError> {
        Ok(serde_json::from_str(json)?)
    }
}
