/// Executor module - translates frozen query trees into results
///
/// Structure:
/// - session: storage session boundary (trait + in-memory implementation)
/// - conditions: predicate evaluation over join frames
/// - queries: SELECT pipeline (sources, joins, filter, group, sort, paging)
/// - engine: fetch_one/fetch_first/fetch_all/fetch_count/fetch_page
/// - result: typed result materialization and rendering
mod conditions;
mod queries;

pub mod engine;
pub mod result;
pub mod session;

// Re-exports for convenience
pub use engine::QueryEngine;
pub use result::{EntityRow, PagedResult, ResultRow, ResultSet, TupleItem, TupleRow};
pub use session::{EntityScan, MemorySession, StorageSession};
