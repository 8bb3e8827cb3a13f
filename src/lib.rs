// fluentql - typed query construction and execution engine for relational data
// Callers declare entities as column schemas with typed field tokens, build
// immutable query trees through a fluent builder, and execute them against a
// storage session for typed results.

// Clippy configuration - allow non-critical warnings
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::missing_const_for_fn)]

// Core value model (values, types, columns, rows, tables, errors, store)
pub mod core;

// Typed field tokens and entity declarations
pub mod schema;

// Query expression tree and fluent builder
pub mod query;

// Query execution (session boundary, predicate evaluation, SELECT pipeline,
// engine entry points, result materialization)
pub mod executor;

// Re-export commonly used types for convenience
pub use self::core::{
    Column, DataType, Database, ForeignKey, QueryError, Row, StorageError, Table, TypeFamily,
    Value,
};
pub use self::executor::{
    EntityRow, EntityScan, MemorySession, PagedResult, QueryEngine, ResultRow, ResultSet,
    StorageSession, TupleItem, TupleRow,
};
pub use self::query::{
    AggregateFunction, CountTarget, JoinClause, JoinKind, NullPlacement, Predicate, Projection,
    QueryBuilder, QueryTree, SortKey, SortOrder,
};
pub use self::schema::{EntityDef, FieldRef};
