/// Fluent query construction
///
/// `QueryBuilder` is a consuming builder: every mutator takes `self` and
/// returns `Self`, and `build()` freezes the accumulated state into a
/// [`QueryTree`]. Structural faults (a misplaced `on`, a grouping violation,
/// a field referencing an entity the query never mentions) are recorded at
/// the offending call or detected in `build()`; the first one surfaces as
/// `build()`'s error. Nothing construction-related is deferred to execution.
use crate::core::QueryError;
use crate::query::join::{JoinClause, JoinKind};
use crate::query::order::SortKey;
use crate::query::predicate::Predicate;
use crate::query::projection::Projection;
use crate::schema::FieldRef;

/// Frozen query expression tree. Immutable once built; safe to share across
/// executions and threads.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryTree {
    pub projections: Vec<Projection>,
    pub sources: Vec<&'static str>,
    pub joins: Vec<JoinClause>,
    pub filter: Option<Predicate>,
    pub group_by: Vec<FieldRef>,
    pub order_by: Vec<SortKey>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
    pub distinct: bool,
}

impl QueryTree {
    /// Every entity the query touches, sources first, then join targets in
    /// clause order.
    #[must_use]
    pub fn entities(&self) -> Vec<&'static str> {
        let mut entities: Vec<&'static str> = self.sources.clone();
        entities.extend(self.joins.iter().map(|j| j.entity));
        entities
    }
}

#[derive(Debug)]
pub struct QueryBuilder {
    projections: Vec<Projection>,
    sources: Vec<&'static str>,
    joins: Vec<JoinClause>,
    filter: Option<Predicate>,
    group_by: Vec<FieldRef>,
    order_by: Vec<SortKey>,
    offset: Option<usize>,
    limit: Option<usize>,
    distinct: bool,
    /// Index of the join an `on()` call may attach to; cleared by every
    /// non-join mutator so `on` must immediately follow its join.
    on_target: Option<usize>,
    /// First structural fault, surfaced by `build()`.
    error: Option<QueryError>,
}

impl QueryBuilder {
    #[must_use]
    pub fn select(projections: Vec<Projection>) -> Self {
        Self {
            projections,
            sources: Vec::new(),
            joins: Vec::new(),
            filter: None,
            group_by: Vec::new(),
            order_by: Vec::new(),
            offset: None,
            limit: None,
            distinct: false,
            on_target: None,
            error: None,
        }
    }

    /// Projects the whole entity.
    #[must_use]
    pub fn select_entity(entity: &'static str) -> Self {
        Self::select(vec![Projection::Entity(entity)])
    }

    /// `selectFrom(entity)` shorthand.
    #[must_use]
    pub fn select_from(entity: &'static str) -> Self {
        Self::select_entity(entity).from(entity)
    }

    /// Adds a source entity. Multiple sources with no join clause form a
    /// cartesian product; theta joins filter it through `filter`.
    #[must_use]
    pub fn from(mut self, entity: &'static str) -> Self {
        self.on_target = None;
        self.sources.push(entity);
        self
    }

    /// Inner join on a relation field pair.
    #[must_use]
    pub fn join(self, entity: &'static str, left: FieldRef, right: FieldRef) -> Self {
        self.push_join(JoinKind::Inner, entity, Some((left, right)))
    }

    /// Left join on a relation field pair; unmatched source rows survive
    /// with null target projections.
    #[must_use]
    pub fn left_join(self, entity: &'static str, left: FieldRef, right: FieldRef) -> Self {
        self.push_join(JoinKind::Left, entity, Some((left, right)))
    }

    /// Inner join with no relation; the condition is carried entirely by the
    /// following `on` (or degenerates to a cross join without one).
    #[must_use]
    pub fn join_unrelated(self, entity: &'static str) -> Self {
        self.push_join(JoinKind::Inner, entity, None)
    }

    /// Left join between entities that share no relation; the match
    /// condition comes entirely from the following `on`.
    #[must_use]
    pub fn left_join_unrelated(self, entity: &'static str) -> Self {
        self.push_join(JoinKind::Left, entity, None)
    }

    fn push_join(
        mut self,
        kind: JoinKind,
        entity: &'static str,
        relation: Option<(FieldRef, FieldRef)>,
    ) -> Self {
        self.joins.push(JoinClause {
            kind,
            entity,
            relation,
            on: None,
        });
        self.on_target = Some(self.joins.len() - 1);
        self
    }

    /// Attaches an `ON` predicate to the join added by the immediately
    /// preceding `join`/`left_join` call. At most one per join clause.
    #[must_use]
    pub fn on(mut self, predicate: Predicate) -> Self {
        match self.on_target {
            None => {
                self.record(QueryError::InvalidJoin(
                    "on() must immediately follow a join".to_string(),
                ));
            }
            Some(idx) => {
                if self.joins[idx].on.is_some() {
                    self.record(QueryError::InvalidJoin(format!(
                        "join on '{}' already has an ON predicate",
                        self.joins[idx].entity
                    )));
                } else {
                    self.joins[idx].on = Some(predicate);
                }
            }
        }
        self.on_target = None;
        self
    }

    /// Adds a filter predicate. Repeated calls conjoin:
    /// `filter(p1).filter(p2)` ≡ `filter(p1.and(p2))`.
    #[must_use]
    pub fn filter(mut self, predicate: Predicate) -> Self {
        self.on_target = None;
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Vararg-style filter: conjoins every predicate in the list.
    #[must_use]
    pub fn filter_all(self, predicates: Vec<Predicate>) -> Self {
        match Predicate::all(predicates) {
            Some(predicate) => self.filter(predicate),
            None => self,
        }
    }

    #[must_use]
    pub fn group_by(mut self, field: FieldRef) -> Self {
        self.on_target = None;
        self.group_by.push(field);
        self
    }

    #[must_use]
    pub fn order_by(mut self, key: SortKey) -> Self {
        self.on_target = None;
        self.order_by.push(key);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.on_target = None;
        self.offset = Some(offset);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.on_target = None;
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn distinct(mut self) -> Self {
        self.on_target = None;
        self.distinct = true;
        self
    }

    fn record(&mut self, error: QueryError) {
        if self.error.is_none() {
            self.error = Some(error);
        }
    }

    /// Freezes the builder into a [`QueryTree`], surfacing the first
    /// structural fault. Runs entirely before any I/O.
    pub fn build(self) -> Result<QueryTree, QueryError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if self.sources.is_empty() {
            return Err(QueryError::InvalidQuery(
                "query has no source entity".to_string(),
            ));
        }
        if self.projections.is_empty() {
            return Err(QueryError::InvalidQuery(
                "query has no projections".to_string(),
            ));
        }

        let tree = QueryTree {
            projections: self.projections,
            sources: self.sources,
            joins: self.joins,
            filter: self.filter,
            group_by: self.group_by,
            order_by: self.order_by,
            offset: self.offset,
            limit: self.limit,
            distinct: self.distinct,
        };

        validate_entities(&tree)?;
        validate_joins(&tree)?;
        validate_grouping(&tree)?;
        Ok(tree)
    }
}

fn validate_entities(tree: &QueryTree) -> Result<(), QueryError> {
    let entities = tree.entities();

    for (i, entity) in entities.iter().enumerate() {
        if entities[..i].contains(entity) {
            return Err(QueryError::InvalidQuery(format!(
                "entity '{entity}' referenced more than once"
            )));
        }
    }

    let known = |field: &FieldRef| entities.contains(&field.entity);
    let check = |field: &FieldRef, place: &str| {
        if known(field) {
            Ok(())
        } else {
            Err(QueryError::InvalidQuery(format!(
                "{place} references '{field}' but entity '{}' is not part of the query",
                field.entity
            )))
        }
    };

    for projection in &tree.projections {
        match projection {
            Projection::Entity(entity) => {
                if !entities.contains(entity) {
                    return Err(QueryError::InvalidQuery(format!(
                        "projection references entity '{entity}' which is not part of the query"
                    )));
                }
            }
            Projection::Field(field) => check(field, "projection")?,
            Projection::Aggregate(agg) => {
                use crate::query::projection::{AggregateFunction, CountTarget};
                match agg {
                    AggregateFunction::Count(CountTarget::All) => {}
                    AggregateFunction::Count(CountTarget::Field(f))
                    | AggregateFunction::Sum(f)
                    | AggregateFunction::Avg(f)
                    | AggregateFunction::Min(f)
                    | AggregateFunction::Max(f) => check(f, "aggregate")?,
                }
            }
        }
    }

    if let Some(filter) = &tree.filter {
        let mut fields = Vec::new();
        filter.collect_fields(&mut fields);
        for field in fields {
            check(field, "filter")?;
        }
    }

    for field in &tree.group_by {
        check(field, "group_by")?;
    }
    for key in &tree.order_by {
        check(&key.field, "order_by")?;
    }
    Ok(())
}

fn validate_joins(tree: &QueryTree) -> Result<(), QueryError> {
    // Entities visible to join clause i: sources plus targets of earlier joins.
    let mut visible: Vec<&'static str> = tree.sources.clone();

    for join in &tree.joins {
        if let Some((left, right)) = &join.relation {
            let touches_target = left.entity == join.entity || right.entity == join.entity;
            let other = if left.entity == join.entity { right } else { left };
            if !touches_target || !visible.contains(&other.entity) {
                return Err(QueryError::InvalidJoin(format!(
                    "join relation ({left}, {right}) must pair '{}' with an earlier entity",
                    join.entity
                )));
            }
        }

        visible.push(join.entity);

        if let Some(on) = &join.on {
            let mut fields = Vec::new();
            on.collect_fields(&mut fields);
            for field in fields {
                if !visible.contains(&field.entity) {
                    return Err(QueryError::InvalidJoin(format!(
                        "ON predicate references '{field}' before entity '{}' is joined",
                        field.entity
                    )));
                }
            }
        }
    }
    Ok(())
}

fn validate_grouping(tree: &QueryTree) -> Result<(), QueryError> {
    let has_aggregate = tree.projections.iter().any(Projection::is_aggregate);
    let has_plain = tree.projections.iter().any(|p| !p.is_aggregate());

    if tree.group_by.is_empty() {
        if has_aggregate && has_plain {
            return Err(QueryError::InvalidGrouping(
                "aggregate and non-aggregate projections mixed without group_by".to_string(),
            ));
        }
        return Ok(());
    }

    for projection in &tree.projections {
        match projection {
            Projection::Entity(entity) => {
                return Err(QueryError::InvalidGrouping(format!(
                    "cannot project whole entity '{entity}' in a grouped query"
                )));
            }
            Projection::Field(field) => {
                if !tree.group_by.contains(field) {
                    return Err(QueryError::InvalidGrouping(format!(
                        "'{field}' must appear in group_by or inside an aggregate"
                    )));
                }
            }
            Projection::Aggregate(_) => {}
        }
    }

    for key in &tree.order_by {
        if !tree.group_by.contains(&key.field) {
            return Err(QueryError::InvalidGrouping(format!(
                "order_by '{}' must be a group_by key in a grouped query",
                key.field
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{DataType, Value};
    use crate::query::projection::Projection;

    const MEMBER_USERNAME: FieldRef = FieldRef::new("member", "username", DataType::Text);
    const MEMBER_AGE: FieldRef = FieldRef::new("member", "age", DataType::Integer);
    const MEMBER_TEAM_ID: FieldRef = FieldRef::new("member", "team_id", DataType::Integer);
    const TEAM_ID: FieldRef = FieldRef::new("team", "id", DataType::Serial);
    const TEAM_NAME: FieldRef = FieldRef::new("team", "name", DataType::Text);

    #[test]
    fn test_build_minimal_tree() {
        let tree = QueryBuilder::select_from("member").build().unwrap();
        assert_eq!(tree.sources, vec!["member"]);
        assert_eq!(tree.projections, vec![Projection::Entity("member")]);
        assert!(tree.filter.is_none());
    }

    #[test]
    fn test_filter_calls_conjoin() {
        let p1 = MEMBER_USERNAME
            .equals(Value::Text("member1".to_string()))
            .unwrap();
        let p2 = MEMBER_AGE.equals(Value::Integer(10)).unwrap();

        let chained = QueryBuilder::select_from("member")
            .filter(p1.clone())
            .filter(p2.clone())
            .build()
            .unwrap();
        let folded = QueryBuilder::select_from("member")
            .filter(p1.and(p2))
            .build()
            .unwrap();

        assert_eq!(chained.filter, folded.filter);
    }

    #[test]
    fn test_filter_all_matches_chained_filters() {
        let p1 = MEMBER_USERNAME
            .equals(Value::Text("member1".to_string()))
            .unwrap();
        let p2 = MEMBER_AGE.equals(Value::Integer(10)).unwrap();

        let varargs = QueryBuilder::select_from("member")
            .filter_all(vec![p1.clone(), p2.clone()])
            .build()
            .unwrap();
        let chained = QueryBuilder::select_from("member")
            .filter(p1)
            .filter(p2)
            .build()
            .unwrap();

        assert_eq!(varargs.filter, chained.filter);
    }

    #[test]
    fn test_on_without_join_fails() {
        let result = QueryBuilder::select_from("member")
            .on(TEAM_NAME.equals(Value::Text("teamA".to_string())).unwrap())
            .build();
        assert!(matches!(result, Err(QueryError::InvalidJoin(_))));
    }

    #[test]
    fn test_on_must_immediately_follow_join() {
        let result = QueryBuilder::select_from("member")
            .join("team", MEMBER_TEAM_ID, TEAM_ID)
            .filter(MEMBER_AGE.at_least(Value::Integer(10)).unwrap())
            .on(TEAM_NAME.equals(Value::Text("teamA".to_string())).unwrap())
            .build();
        assert!(matches!(result, Err(QueryError::InvalidJoin(_))));
    }

    #[test]
    fn test_duplicate_on_fails() {
        let on1 = TEAM_NAME.equals(Value::Text("teamA".to_string())).unwrap();
        let result = QueryBuilder::select_from("member")
            .join("team", MEMBER_TEAM_ID, TEAM_ID)
            .on(on1.clone())
            .on(on1)
            .build();
        // The second on() no longer follows a join, which is the same fault
        assert!(matches!(result, Err(QueryError::InvalidJoin(_))));
    }

    #[test]
    fn test_mixed_aggregates_without_group_by_fail() {
        let result = QueryBuilder::select(vec![
            Projection::Field(TEAM_NAME),
            Projection::avg(MEMBER_AGE),
        ])
        .from("member")
        .join("team", MEMBER_TEAM_ID, TEAM_ID)
        .build();
        assert!(matches!(result, Err(QueryError::InvalidGrouping(_))));
    }

    #[test]
    fn test_grouped_projection_must_be_group_key() {
        let result = QueryBuilder::select(vec![
            Projection::Field(MEMBER_USERNAME),
            Projection::avg(MEMBER_AGE),
        ])
        .from("member")
        .join("team", MEMBER_TEAM_ID, TEAM_ID)
        .group_by(TEAM_NAME)
        .build();
        assert!(matches!(result, Err(QueryError::InvalidGrouping(_))));
    }

    #[test]
    fn test_grouped_entity_projection_fails() {
        let result = QueryBuilder::select_from("member")
            .group_by(MEMBER_AGE)
            .build();
        assert!(matches!(result, Err(QueryError::InvalidGrouping(_))));
    }

    #[test]
    fn test_unknown_entity_in_filter_fails() {
        let result = QueryBuilder::select_from("member")
            .filter(TEAM_NAME.equals(Value::Text("teamA".to_string())).unwrap())
            .build();
        assert!(matches!(result, Err(QueryError::InvalidQuery(_))));
    }

    #[test]
    fn test_join_relation_must_pair_target_with_earlier_entity() {
        let result = QueryBuilder::select_from("member")
            .join("team", MEMBER_TEAM_ID, MEMBER_AGE)
            .build();
        assert!(matches!(result, Err(QueryError::InvalidJoin(_))));
    }

    #[test]
    fn test_duplicate_entity_fails() {
        let result = QueryBuilder::select_from("member").from("member").build();
        assert!(matches!(result, Err(QueryError::InvalidQuery(_))));
    }

    #[test]
    fn test_grouped_order_by_must_be_group_key() {
        let result = QueryBuilder::select(vec![
            Projection::Field(TEAM_NAME),
            Projection::avg(MEMBER_AGE),
        ])
        .from("member")
        .join("team", MEMBER_TEAM_ID, TEAM_ID)
        .group_by(TEAM_NAME)
        .order_by(SortKey::asc(MEMBER_AGE))
        .build();
        assert!(matches!(result, Err(QueryError::InvalidGrouping(_))));
    }

    #[test]
    fn test_valid_grouped_tree_builds() {
        let tree = QueryBuilder::select(vec![
            Projection::Field(TEAM_NAME),
            Projection::avg(MEMBER_AGE),
        ])
        .from("member")
        .join("team", MEMBER_TEAM_ID, TEAM_ID)
        .group_by(TEAM_NAME)
        .order_by(SortKey::asc(TEAM_NAME))
        .build();
        assert!(tree.is_ok());
    }
}
