/// Result materialization
///
/// The projection list shapes what a row materializes as: a single
/// entity projection yields [`ResultRow::Entity`], a single scalar
/// projection with no grouping yields [`ResultRow::Scalar`], anything else
/// a [`ResultRow::Tuple`] with positional accessors in projection order.
use comfy_table::{Cell, Table as ComfyTable, presets::UTF8_FULL};

use crate::core::Value;

/// One materialized entity: column names and values in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityRow {
    pub entity: String,
    pub columns: Vec<String>,
    pub values: Vec<Value>,
}

impl EntityRow {
    #[must_use]
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|idx| &self.values[idx])
    }
}

impl std::fmt::Display for EntityRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}(", self.entity)?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{value}")?;
        }
        write!(f, ")")
    }
}

/// One position of a tuple row. `Null` marks the unmatched side of a left
/// join when a whole entity was projected.
#[derive(Debug, Clone, PartialEq)]
pub enum TupleItem {
    Entity(EntityRow),
    Scalar(Value),
    Null,
}

impl TupleItem {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Scalar(value) => value.is_null(),
            Self::Entity(_) => false,
        }
    }

    #[must_use]
    pub const fn as_entity(&self) -> Option<&EntityRow> {
        match self {
            Self::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }
}

impl std::fmt::Display for TupleItem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Entity(entity) => write!(f, "{entity}"),
            Self::Scalar(value) => write!(f, "{value}"),
            Self::Null => write!(f, "NULL"),
        }
    }
}

/// Multi-projection row with positional accessors, in projection order.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleRow {
    pub labels: Vec<String>,
    pub items: Vec<TupleItem>,
}

impl TupleRow {
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&TupleItem> {
        self.items.get(index)
    }

    #[must_use]
    pub fn scalar(&self, index: usize) -> Option<&Value> {
        self.items.get(index).and_then(TupleItem::as_scalar)
    }

    #[must_use]
    pub fn entity(&self, index: usize) -> Option<&EntityRow> {
        self.items.get(index).and_then(TupleItem::as_entity)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ResultRow {
    Entity(EntityRow),
    Tuple(TupleRow),
    Scalar(Value),
}

impl ResultRow {
    #[must_use]
    pub const fn as_entity(&self) -> Option<&EntityRow> {
        match self {
            Self::Entity(entity) => Some(entity),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_tuple(&self) -> Option<&TupleRow> {
        match self {
            Self::Tuple(tuple) => Some(tuple),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(value) => Some(value),
            _ => None,
        }
    }

    /// Convenience for the common "entity row, give me a field" pattern.
    #[must_use]
    pub fn entity_value(&self, column: &str) -> Option<&Value> {
        self.as_entity().and_then(|e| e.get(column))
    }

    /// Rendered cells, one per projection.
    pub(crate) fn cells(&self) -> Vec<String> {
        match self {
            Self::Entity(entity) => vec![entity.to_string()],
            Self::Scalar(value) => vec![value.to_string()],
            Self::Tuple(tuple) => tuple.items.iter().map(ToString::to_string).collect(),
        }
    }

    /// Identity for DISTINCT: rendered cells joined on a non-printable
    /// separator.
    pub(crate) fn fingerprint(&self) -> String {
        self.cells().join("\u{1f}")
    }
}

/// Paginated result: `total` reflects the full filtered row count,
/// independent of limit/offset.
#[derive(Debug, Clone, PartialEq)]
pub struct PagedResult {
    pub total: usize,
    pub limit: Option<usize>,
    pub offset: usize,
    pub results: Vec<ResultRow>,
}

/// Labeled result rows, renderable as a UTF-8 grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<ResultRow>,
}

impl ResultSet {
    #[must_use]
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return "(0 rows)\n".to_string();
        }

        let mut table = ComfyTable::new();
        table.load_preset(UTF8_FULL);
        table.set_header(self.columns.iter().map(Cell::new));

        for row in &self.rows {
            table.add_row(row.cells().iter().map(Cell::new));
        }

        format!("{}\n({} rows)\n", table, self.rows.len())
    }
}

impl std::fmt::Display for ResultSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn member_entity() -> EntityRow {
        EntityRow {
            entity: "member".to_string(),
            columns: vec!["id".to_string(), "username".to_string(), "age".to_string()],
            values: vec![
                Value::Integer(1),
                Value::Text("member1".to_string()),
                Value::Integer(10),
            ],
        }
    }

    #[test]
    fn test_entity_row_get() {
        let entity = member_entity();
        assert_eq!(entity.get("username"), Some(&Value::Text("member1".to_string())));
        assert_eq!(entity.get("missing"), None);
    }

    #[test]
    fn test_tuple_accessors_preserve_order() {
        let tuple = TupleRow {
            labels: vec!["team.name".to_string(), "avg(member.age)".to_string()],
            items: vec![
                TupleItem::Scalar(Value::Text("teamA".to_string())),
                TupleItem::Scalar(Value::Real(15.0)),
            ],
        };

        assert_eq!(tuple.len(), 2);
        assert_eq!(tuple.scalar(0), Some(&Value::Text("teamA".to_string())));
        assert_eq!(tuple.scalar(1), Some(&Value::Real(15.0)));
        assert_eq!(tuple.entity(0), None);
        assert!(tuple.get(2).is_none());
    }

    #[test]
    fn test_tuple_null_item() {
        let tuple = TupleRow {
            labels: vec!["member".to_string(), "team".to_string()],
            items: vec![TupleItem::Entity(member_entity()), TupleItem::Null],
        };

        assert!(!tuple.get(0).unwrap().is_null());
        assert!(tuple.get(1).unwrap().is_null());
        assert_eq!(tuple.entity(1), None);
    }

    #[test]
    fn test_render_contains_rows_and_trailer() {
        let set = ResultSet {
            columns: vec!["member".to_string()],
            rows: vec![ResultRow::Entity(member_entity())],
        };

        let rendered = set.render();
        assert!(rendered.contains("member(1, member1, 10)"));
        assert!(rendered.contains("(1 rows)"));

        let empty = ResultSet {
            columns: vec!["member".to_string()],
            rows: Vec::new(),
        };
        assert_eq!(empty.render(), "(0 rows)\n");
    }
}
