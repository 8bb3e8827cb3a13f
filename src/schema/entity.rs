use crate::core::{Column, Database, StorageError, Table};

/// Declarative entity schema. Materializes as a store table; the identity
/// column is whatever `Serial`/`BigSerial` column the definition carries.
#[derive(Debug, Clone)]
pub struct EntityDef {
    pub name: &'static str,
    pub columns: Vec<Column>,
}

impl EntityDef {
    #[must_use]
    pub const fn new(name: &'static str, columns: Vec<Column>) -> Self {
        Self { name, columns }
    }

    #[must_use]
    pub fn to_table(&self) -> Table {
        Table::new(self.name.to_string(), self.columns.clone())
    }

    /// Creates the backing table in `db`.
    pub fn register(&self, db: &mut Database) -> Result<(), StorageError> {
        db.create_table(self.to_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    #[test]
    fn test_register_creates_table() {
        let def = EntityDef::new(
            "hello",
            vec![
                Column::new("id", DataType::Serial).primary_key(),
                Column::new("name", DataType::Text).nullable(),
            ],
        );

        let mut db = Database::new("test_db".to_string());
        def.register(&mut db).unwrap();

        let table = db.get_table("hello").unwrap();
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.sequences.get("id"), Some(&1));

        assert!(matches!(
            def.register(&mut db),
            Err(StorageError::TableAlreadyExists(_))
        ));
    }
}
