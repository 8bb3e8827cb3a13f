use crate::core::DataType;

/// Typed field token: the hand-declared replacement for generated query
/// types. Entities expose these as `const`s; every predicate, projection,
/// sort key and join relation is built from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub entity: &'static str,
    pub column: &'static str,
    pub data_type: DataType,
}

impl FieldRef {
    #[must_use]
    pub const fn new(entity: &'static str, column: &'static str, data_type: DataType) -> Self {
        Self {
            entity,
            column,
            data_type,
        }
    }

    /// `entity.column` form used in labels and error messages.
    #[must_use]
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.entity, self.column)
    }
}

impl std::fmt::Display for FieldRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.entity, self.column)
    }
}
