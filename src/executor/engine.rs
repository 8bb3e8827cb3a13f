/// Query engine entry points
///
/// Holds an explicit session handle and executes frozen trees. `fetch_one`
/// is strict: more than one matching row is [`QueryError::TooManyResults`];
/// the non-strict variant is `fetch_first`. No call retries; storage faults
/// propagate as [`QueryError::Storage`] with the cause attached.
use crate::core::QueryError;
use crate::query::{Projection, QueryTree};

use super::queries::SelectExecutor;
use super::result::{PagedResult, ResultRow, ResultSet};
use super::session::StorageSession;

pub struct QueryEngine<'a, S: StorageSession> {
    session: &'a S,
}

impl<'a, S: StorageSession> QueryEngine<'a, S> {
    #[must_use]
    pub const fn new(session: &'a S) -> Self {
        Self { session }
    }

    /// Every matching row; store order unless the tree carries sort keys.
    pub fn fetch_all(&self, tree: &QueryTree) -> Result<Vec<ResultRow>, QueryError> {
        SelectExecutor::execute(self.session, tree, true)
    }

    /// Exactly zero or one matching row; more is `TooManyResults`.
    pub fn fetch_one(&self, tree: &QueryTree) -> Result<Option<ResultRow>, QueryError> {
        let mut rows = self.fetch_all(tree)?;
        match rows.len() {
            0 => Ok(None),
            1 => Ok(Some(rows.remove(0))),
            matched => Err(QueryError::TooManyResults { matched }),
        }
    }

    /// First matching row, if any (`limit(1)` + fetch).
    pub fn fetch_first(&self, tree: &QueryTree) -> Result<Option<ResultRow>, QueryError> {
        let mut limited = tree.clone();
        limited.limit = Some(1);
        Ok(self.fetch_all(&limited)?.into_iter().next())
    }

    /// Count-only variant: ignores limit/offset and projection shape,
    /// respects filter/joins/grouping.
    pub fn fetch_count(&self, tree: &QueryTree) -> Result<usize, QueryError> {
        SelectExecutor::count(self.session, tree)
    }

    /// Runs both the count variant and the limited/offset variant.
    pub fn fetch_page(&self, tree: &QueryTree) -> Result<PagedResult, QueryError> {
        let total = self.fetch_count(tree)?;
        let results = self.fetch_all(tree)?;
        Ok(PagedResult {
            total,
            limit: tree.limit,
            offset: tree.offset.unwrap_or(0),
            results,
        })
    }

    /// `fetch_all` with projection labels attached, for rendering.
    pub fn fetch_set(&self, tree: &QueryTree) -> Result<ResultSet, QueryError> {
        Ok(ResultSet {
            columns: tree.projections.iter().map(Projection::label).collect(),
            rows: self.fetch_all(tree)?,
        })
    }
}
