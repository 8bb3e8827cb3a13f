// Module declarations
pub mod column;
pub mod constraints;
pub mod data_type;
pub mod database;
pub mod error;
pub mod row;
pub mod table;
pub mod value;

// Re-exports for convenience
pub use column::Column;
pub use constraints::ForeignKey;
pub use data_type::{DataType, TypeFamily, value_family};
pub use database::Database;
pub use error::{QueryError, StorageError};
pub use row::Row;
pub use table::Table;
pub use value::Value;

#[cfg(test)]
mod tests {
    use super::*;

    fn member_columns() -> Vec<Column> {
        vec![
            Column::new("id", DataType::Serial).primary_key(),
            Column::new("username", DataType::Text).nullable(),
            Column::new("age", DataType::Integer),
        ]
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Integer(42).to_string(), "42");
        assert_eq!(Value::Real(2.5).to_string(), "2.5");
        assert_eq!(Value::Text("hello".to_string()).to_string(), "hello");
        assert_eq!(Value::Boolean(true).to_string(), "true");
    }

    #[test]
    fn test_value_accessors() {
        assert_eq!(Value::Integer(42).as_int(), Some(42));
        assert_eq!(Value::Text("hello".to_string()).as_int(), None);
        assert_eq!(Value::Text("hello".to_string()).as_text(), Some("hello"));
        assert_eq!(Value::Boolean(true).as_bool(), Some(true));
        assert!(Value::Null.is_null());
    }

    #[test]
    fn test_table_insert_assigns_identity_once() {
        let mut table = Table::new("member".to_string(), member_columns());

        let id1 = table
            .insert(vec![
                Value::Null,
                Value::Text("member1".to_string()),
                Value::Integer(10),
            ])
            .unwrap();
        let id2 = table
            .insert(vec![
                Value::Null,
                Value::Text("member2".to_string()),
                Value::Integer(20),
            ])
            .unwrap();

        assert_eq!(id1, Value::Integer(1));
        assert_eq!(id2, Value::Integer(2));
        assert_eq!(table.rows[0].values[0], Value::Integer(1));
    }

    #[test]
    fn test_table_insert_rejects_explicit_identity() {
        let mut table = Table::new("member".to_string(), member_columns());

        let result = table.insert(vec![
            Value::Integer(99),
            Value::Text("member1".to_string()),
            Value::Integer(10),
        ]);
        assert!(matches!(result, Err(StorageError::IdentityColumn(_))));
    }

    #[test]
    fn test_table_insert_wrong_column_count() {
        let mut table = Table::new("member".to_string(), member_columns());

        let result = table.insert(vec![Value::Null, Value::Integer(10)]);
        assert!(matches!(result, Err(StorageError::ColumnCountMismatch)));
    }

    #[test]
    fn test_table_insert_null_constraint() {
        let mut table = Table::new("member".to_string(), member_columns());

        // username is nullable, age is not
        let ok = table.insert(vec![Value::Null, Value::Null, Value::Integer(100)]);
        assert!(ok.is_ok());

        let bad = table.insert(vec![
            Value::Null,
            Value::Text("member1".to_string()),
            Value::Null,
        ]);
        assert!(matches!(bad, Err(StorageError::NullConstraint(c)) if c == "age"));
    }

    #[test]
    fn test_table_insert_type_mismatch() {
        let mut table = Table::new("member".to_string(), member_columns());

        let result = table.insert(vec![
            Value::Null,
            Value::Integer(7),
            Value::Integer(10),
        ]);
        assert!(matches!(result, Err(StorageError::TypeMismatch)));
    }

    #[test]
    fn test_database_create_and_drop() {
        let mut db = Database::new("test_db".to_string());
        let table = Table::new("member".to_string(), member_columns());

        assert!(db.create_table(table.clone()).is_ok());
        assert!(db.get_table("member").is_some());
        assert!(matches!(
            db.create_table(table),
            Err(StorageError::TableAlreadyExists(_))
        ));

        assert!(db.drop_table("member").is_ok());
        assert!(matches!(
            db.drop_table("member"),
            Err(StorageError::TableNotFound(_))
        ));
    }

    #[test]
    fn test_database_json_roundtrip() {
        let mut db = Database::new("test_db".to_string());
        db.create_table(Table::new("member".to_string(), member_columns()))
            .unwrap();
        db.insert(
            "member",
            vec![
                Value::Null,
                Value::Text("member1".to_string()),
                Value::Integer(10),
            ],
        )
        .unwrap();

        let json = db.export_json().unwrap();
        let restored = Database::import_json(&json).unwrap();

        assert_eq!(restored.name, "test_db");
        let table = restored.get_table("member").unwrap();
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].values[1], Value::Text("member1".to_string()));
        // Sequence position survives the roundtrip
        assert_eq!(table.sequences.get("id"), Some(&2));
    }
}
