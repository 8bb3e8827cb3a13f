use serde::{Deserialize, Serialize};

use super::value::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum DataType {
    // Numeric types
    SmallInt,
    Integer,
    Real,
    Numeric { precision: u8, scale: u8 }, // NUMERIC(p, s)
    Serial,    // Auto-incrementing INTEGER, store-assigned
    BigSerial, // Auto-incrementing BIGINT, store-assigned
    // String types
    Text,
    Varchar { max_length: usize }, // VARCHAR(n)
    // Boolean
    Boolean,
    // Date/Time types
    Date,
    Timestamp,
    TimestampTz,
    // Special types
    Uuid,
    Bytea,
}

/// Comparison class of a type. Predicate operands and field pairs must share
/// a family; cross-family comparisons are rejected at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeFamily {
    Integer,
    Real,
    Numeric,
    Text,
    Boolean,
    Date,
    Timestamp,
    TimestampTz,
    Uuid,
    Bytea,
}

/// Family of a non-null value; `None` for `Value::Null`.
#[must_use]
pub const fn value_family(value: &Value) -> Option<TypeFamily> {
    match value {
        Value::Null => None,
        Value::SmallInt(_) | Value::Integer(_) => Some(TypeFamily::Integer),
        Value::Real(_) => Some(TypeFamily::Real),
        Value::Numeric(_) => Some(TypeFamily::Numeric),
        Value::Text(_) => Some(TypeFamily::Text),
        Value::Boolean(_) => Some(TypeFamily::Boolean),
        Value::Date(_) => Some(TypeFamily::Date),
        Value::Timestamp(_) => Some(TypeFamily::Timestamp),
        Value::TimestampTz(_) => Some(TypeFamily::TimestampTz),
        Value::Uuid(_) => Some(TypeFamily::Uuid),
        Value::Bytea(_) => Some(TypeFamily::Bytea),
    }
}

impl DataType {
    #[must_use]
    pub const fn family(&self) -> TypeFamily {
        match self {
            Self::SmallInt | Self::Integer | Self::Serial | Self::BigSerial => TypeFamily::Integer,
            Self::Real => TypeFamily::Real,
            Self::Numeric { .. } => TypeFamily::Numeric,
            Self::Text | Self::Varchar { .. } => TypeFamily::Text,
            Self::Boolean => TypeFamily::Boolean,
            Self::Date => TypeFamily::Date,
            Self::Timestamp => TypeFamily::Timestamp,
            Self::TimestampTz => TypeFamily::TimestampTz,
            Self::Uuid => TypeFamily::Uuid,
            Self::Bytea => TypeFamily::Bytea,
        }
    }

    /// Whether a non-null value belongs to this type's comparison family.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        value_family(value) == Some(self.family())
    }

    /// Whether values of this type can be compared against values of `other`.
    #[must_use]
    pub fn comparable_with(&self, other: &Self) -> bool {
        self.family() == other.family()
    }

    /// Identity columns are populated by the store, never by the caller.
    #[must_use]
    pub const fn is_identity(&self) -> bool {
        matches!(self, Self::Serial | Self::BigSerial)
    }
}
