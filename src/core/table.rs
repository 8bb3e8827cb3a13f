use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::column::Column;
use super::data_type::DataType;
use super::error::StorageError;
use super::row::Row;
use super::value::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    /// Sequence counters for identity columns: `column_name` -> `next_value`
    pub sequences: HashMap<String, i64>,
}

impl Table {
    #[must_use]
    pub fn new(name: String, columns: Vec<Column>) -> Self {
        let mut sequences = HashMap::new();

        // Initialize sequences for SERIAL and BIGSERIAL columns
        for col in &columns {
            if matches!(col.data_type, DataType::Serial | DataType::BigSerial) {
                sequences.insert(col.name.clone(), 1);
            }
        }

        Self {
            name,
            columns,
            rows: Vec::new(),
            sequences,
        }
    }

    /// Inserts a full-width row. Identity slots must be passed as
    /// `Value::Null`; the store assigns them from the table sequence and
    /// returns the assigned identity (or `Value::Null` for tables without
    /// one). Non-identity values are checked for type family and nullability.
    pub fn insert(&mut self, values: Vec<Value>) -> Result<Value, StorageError> {
        if values.len() != self.columns.len() {
            return Err(StorageError::ColumnCountMismatch);
        }

        let mut assigned = Value::Null;
        let mut row_values = Vec::with_capacity(values.len());

        for (col, value) in self.columns.iter().zip(values) {
            if col.data_type.is_identity() {
                if !value.is_null() {
                    return Err(StorageError::IdentityColumn(col.name.clone()));
                }
                let next = self.sequences.entry(col.name.clone()).or_insert(1);
                assigned = Value::Integer(*next);
                *next += 1;
                row_values.push(assigned.clone());
                continue;
            }

            if value.is_null() {
                if !col.nullable {
                    return Err(StorageError::NullConstraint(col.name.clone()));
                }
                row_values.push(value);
                continue;
            }

            if !col.data_type.accepts(&value) {
                return Err(StorageError::TypeMismatch);
            }
            row_values.push(value);
        }

        self.rows.push(Row::new(row_values));
        Ok(assigned)
    }

    #[must_use]
    pub fn get_column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }
}
