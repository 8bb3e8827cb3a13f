/// Storage session boundary
///
/// The engine owns no connection or transaction state: every `fetch_*` call
/// takes its data through a [`StorageSession`] handle supplied by the
/// caller. Sessions are shared-but-not-concurrent; callers wanting parallel
/// queries use independent sessions, and transaction boundaries (and any
/// timeouts or retries) live on the caller's side of this trait.
use crate::core::{Column, Database, Row, StorageError};

/// Full scan of one entity: its schema plus every visible row.
#[derive(Debug, Clone)]
pub struct EntityScan {
    pub entity: String,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

pub trait StorageSession {
    fn scan(&self, entity: &str) -> Result<EntityScan, StorageError>;
}

/// Session over the in-memory [`Database`] store.
pub struct MemorySession<'a> {
    db: &'a Database,
}

impl<'a> MemorySession<'a> {
    #[must_use]
    pub const fn new(db: &'a Database) -> Self {
        Self { db }
    }
}

impl StorageSession for MemorySession<'_> {
    fn scan(&self, entity: &str) -> Result<EntityScan, StorageError> {
        let table = self
            .db
            .get_table(entity)
            .ok_or_else(|| StorageError::TableNotFound(entity.to_string()))?;

        Ok(EntityScan {
            entity: table.name.clone(),
            columns: table.columns.clone(),
            rows: table.rows.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Column, DataType, Value};
    use crate::schema::EntityDef;

    #[test]
    fn test_scan_unknown_entity() {
        let db = Database::new("test_db".to_string());
        let session = MemorySession::new(&db);

        let result = session.scan("member");
        assert!(matches!(result, Err(StorageError::TableNotFound(_))));
    }

    #[test]
    fn test_scan_returns_schema_and_rows() {
        let mut db = Database::new("test_db".to_string());
        EntityDef::new(
            "hello",
            vec![
                Column::new("id", DataType::Serial).primary_key(),
                Column::new("name", DataType::Text).nullable(),
            ],
        )
        .register(&mut db)
        .unwrap();
        db.insert("hello", vec![Value::Null, Value::Text("world".to_string())])
            .unwrap();

        let session = MemorySession::new(&db);
        let scan = session.scan("hello").unwrap();

        assert_eq!(scan.entity, "hello");
        assert_eq!(scan.columns.len(), 2);
        assert_eq!(scan.rows.len(), 1);
        assert_eq!(scan.rows[0].values[0], Value::Integer(1));
    }
}
