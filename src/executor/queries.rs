/// Query (SELECT) execution
///
/// Turns a frozen [`QueryTree`] into result rows against a storage session.
///
/// Execution order:
/// 1. Scan every referenced entity through the session
/// 2. Cartesian-extend the source entities
/// 3. Apply join clauses in order (left joins null-extend unmatched rows)
/// 4. Apply the filter predicate
/// 5. Group (if group keys are set)
/// 6. Project
/// 7. ORDER BY
/// 8. DISTINCT
/// 9. OFFSET
/// 10. LIMIT
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::core::{Column, QueryError, Row, StorageError, Value};
use crate::query::{
    AggregateFunction, CountTarget, JoinClause, JoinKind, NullPlacement, Projection, QueryTree,
    SortKey, SortOrder,
};
use crate::schema::FieldRef;

use super::conditions::{Frame, PredicateEvaluator, Slot, compare_values};
use super::result::{EntityRow, ResultRow, TupleItem, TupleRow};
use super::session::StorageSession;

struct EntityData {
    columns: Arc<Vec<Column>>,
    rows: Vec<Row>,
}

pub(crate) struct SelectExecutor;

impl SelectExecutor {
    /// Runs the full pipeline. `paged` controls whether offset/limit apply;
    /// the count variant runs with them off.
    pub(crate) fn execute<S: StorageSession>(
        session: &S,
        tree: &QueryTree,
        paged: bool,
    ) -> Result<Vec<ResultRow>, QueryError> {
        let frames = Self::frames(session, tree)?;

        let mut rows = if tree.group_by.is_empty() {
            if tree.projections.iter().any(Projection::is_aggregate) {
                vec![Self::project_aggregate(tree, &frames)?]
            } else {
                let sorted = sort_frames(frames, &tree.order_by)?;
                let mut projected = Vec::with_capacity(sorted.len());
                for frame in &sorted {
                    projected.push(Self::project_frame(tree, frame)?);
                }
                projected
            }
        } else {
            Self::execute_grouped(tree, frames)?
        };

        if tree.distinct {
            let mut seen = HashSet::new();
            rows.retain(|row| seen.insert(row.fingerprint()));
        }

        if paged {
            if let Some(offset) = tree.offset {
                rows = rows.into_iter().skip(offset).collect();
            }
            if let Some(limit) = tree.limit {
                rows.truncate(limit);
            }
        }

        Ok(rows)
    }

    /// Count variant: ignores projection shape and paging, respects
    /// filter/joins/grouping (a grouped tree counts groups).
    pub(crate) fn count<S: StorageSession>(
        session: &S,
        tree: &QueryTree,
    ) -> Result<usize, QueryError> {
        let frames = Self::frames(session, tree)?;

        if !tree.group_by.is_empty() {
            let mut keys = HashSet::new();
            for frame in &frames {
                keys.insert(group_key(frame, &tree.group_by)?.1);
            }
            return Ok(keys.len());
        }

        if tree.distinct && !tree.projections.iter().any(Projection::is_aggregate) {
            let mut seen = HashSet::new();
            for frame in &frames {
                seen.insert(Self::project_frame(tree, frame)?.fingerprint());
            }
            return Ok(seen.len());
        }

        Ok(frames.len())
    }

    /// Scan, cartesian sources, joins, filter.
    fn frames<S: StorageSession>(
        session: &S,
        tree: &QueryTree,
    ) -> Result<Vec<Frame>, QueryError> {
        let mut data: HashMap<&'static str, EntityData> = HashMap::new();
        for entity in tree.entities() {
            let scan = session.scan(entity)?;
            data.insert(
                entity,
                EntityData {
                    columns: Arc::new(scan.columns),
                    rows: scan.rows,
                },
            );
        }

        // Cartesian product of the source entities
        let mut frames = vec![Frame::default()];
        for entity in &tree.sources {
            let entity_data = &data[entity];
            let mut next = Vec::new();
            for frame in &frames {
                for row in &entity_data.rows {
                    next.push(frame.with_slot(Slot {
                        entity: (*entity).to_string(),
                        columns: Arc::clone(&entity_data.columns),
                        values: row.values.clone(),
                        present: true,
                    }));
                }
            }
            frames = next;
        }

        // Join clauses, in order
        for join in &tree.joins {
            let entity_data = &data[join.entity];
            let mut next = Vec::new();
            for frame in &frames {
                let mut matched = false;
                for row in &entity_data.rows {
                    let candidate = frame.with_slot(Slot {
                        entity: join.entity.to_string(),
                        columns: Arc::clone(&entity_data.columns),
                        values: row.values.clone(),
                        present: true,
                    });
                    if !relation_matches(&candidate, join)? {
                        continue;
                    }
                    if let Some(on) = &join.on {
                        if !PredicateEvaluator::matches(&candidate, on)? {
                            continue;
                        }
                    }
                    matched = true;
                    next.push(candidate);
                }

                // LEFT JOIN keeps non-matching source rows, null-extended
                if !matched && join.kind == JoinKind::Left {
                    next.push(frame.with_slot(Slot {
                        entity: join.entity.to_string(),
                        columns: Arc::clone(&entity_data.columns),
                        values: vec![Value::Null; entity_data.columns.len()],
                        present: false,
                    }));
                }
            }
            frames = next;
        }

        // WHERE filter
        if let Some(filter) = &tree.filter {
            let mut kept = Vec::with_capacity(frames.len());
            for frame in frames {
                if PredicateEvaluator::matches(&frame, filter)? {
                    kept.push(frame);
                }
            }
            frames = kept;
        }

        Ok(frames)
    }

    fn project_frame(tree: &QueryTree, frame: &Frame) -> Result<ResultRow, QueryError> {
        let mut items = Vec::with_capacity(tree.projections.len());
        for projection in &tree.projections {
            match projection {
                Projection::Entity(entity) => {
                    let slot = frame
                        .slot(entity)
                        .ok_or_else(|| StorageError::TableNotFound((*entity).to_string()))?;
                    items.push(if slot.present {
                        TupleItem::Entity(entity_row(slot))
                    } else {
                        TupleItem::Null
                    });
                }
                Projection::Field(field) => {
                    items.push(TupleItem::Scalar(frame.lookup(field)?.clone()));
                }
                Projection::Aggregate(agg) => {
                    return Err(QueryError::InvalidGrouping(format!(
                        "aggregate '{}' outside an aggregate query",
                        agg.label()
                    )));
                }
            }
        }
        Ok(shape_row(tree, items))
    }

    /// Ungrouped aggregate query: one row over all frames.
    fn project_aggregate(tree: &QueryTree, frames: &[Frame]) -> Result<ResultRow, QueryError> {
        let mut items = Vec::with_capacity(tree.projections.len());
        for projection in &tree.projections {
            match projection {
                Projection::Aggregate(agg) => {
                    items.push(TupleItem::Scalar(compute_aggregate(agg, frames)?));
                }
                Projection::Entity(_) | Projection::Field(_) => {
                    return Err(QueryError::InvalidGrouping(format!(
                        "'{}' requires group_by alongside aggregates",
                        projection.label()
                    )));
                }
            }
        }
        Ok(shape_row(tree, items))
    }

    fn execute_grouped(tree: &QueryTree, frames: Vec<Frame>) -> Result<Vec<ResultRow>, QueryError> {
        // Group frames by key values, first-seen order
        let mut grouped: Vec<(Vec<Value>, Vec<Frame>)> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for frame in frames {
            let (key_values, key) = group_key(&frame, &tree.group_by)?;
            match index.get(&key) {
                Some(&i) => grouped[i].1.push(frame),
                None => {
                    index.insert(key, grouped.len());
                    grouped.push((key_values, vec![frame]));
                }
            }
        }

        // ORDER BY on group keys (membership validated at build)
        if !tree.order_by.is_empty() {
            let mut positions = Vec::with_capacity(tree.order_by.len());
            for key in &tree.order_by {
                let pos = tree
                    .group_by
                    .iter()
                    .position(|g| g == &key.field)
                    .ok_or_else(|| {
                        QueryError::InvalidGrouping(format!(
                            "order_by '{}' is not a group_by key",
                            key.field
                        ))
                    })?;
                positions.push(pos);
            }
            grouped.sort_by(|a, b| {
                for (pos, key) in positions.iter().zip(&tree.order_by) {
                    let ord = compare_with_placement(&a.0[*pos], &b.0[*pos], key);
                    if ord != Ordering::Equal {
                        return ord;
                    }
                }
                Ordering::Equal
            });
        }

        let mut rows = Vec::with_capacity(grouped.len());
        for (key_values, group_frames) in &grouped {
            let mut items = Vec::with_capacity(tree.projections.len());
            for projection in &tree.projections {
                match projection {
                    Projection::Field(field) => {
                        let pos = tree
                            .group_by
                            .iter()
                            .position(|g| g == field)
                            .ok_or_else(|| {
                                QueryError::InvalidGrouping(format!(
                                    "'{field}' is not a group_by key"
                                ))
                            })?;
                        items.push(TupleItem::Scalar(key_values[pos].clone()));
                    }
                    Projection::Aggregate(agg) => {
                        items.push(TupleItem::Scalar(compute_aggregate(agg, group_frames)?));
                    }
                    Projection::Entity(entity) => {
                        return Err(QueryError::InvalidGrouping(format!(
                            "cannot project whole entity '{entity}' in a grouped query"
                        )));
                    }
                }
            }
            rows.push(shape_row(tree, items));
        }
        Ok(rows)
    }
}

fn relation_matches(candidate: &Frame, join: &JoinClause) -> Result<bool, StorageError> {
    let Some((left, right)) = &join.relation else {
        return Ok(true);
    };
    let left_value = candidate.lookup(left)?;
    let right_value = candidate.lookup(right)?;
    if left_value.is_null() || right_value.is_null() {
        return Ok(false);
    }
    Ok(compare_values(left_value, right_value)? == Ordering::Equal)
}

fn entity_row(slot: &Slot) -> EntityRow {
    EntityRow {
        entity: slot.entity.clone(),
        columns: slot.columns.iter().map(|c| c.name.clone()).collect(),
        values: slot.values.clone(),
    }
}

/// Single-projection ungrouped queries materialize bare (entity or scalar);
/// everything else is a tuple in projection order.
fn shape_row(tree: &QueryTree, mut items: Vec<TupleItem>) -> ResultRow {
    if tree.projections.len() == 1 && tree.group_by.is_empty() {
        return match items.remove(0) {
            TupleItem::Entity(entity) => ResultRow::Entity(entity),
            TupleItem::Scalar(value) => ResultRow::Scalar(value),
            TupleItem::Null => ResultRow::Scalar(Value::Null),
        };
    }
    ResultRow::Tuple(TupleRow {
        labels: tree.projections.iter().map(Projection::label).collect(),
        items,
    })
}

fn group_key(frame: &Frame, group_by: &[FieldRef]) -> Result<(Vec<Value>, String), QueryError> {
    let mut key_values = Vec::with_capacity(group_by.len());
    let mut key = String::new();
    for field in group_by {
        let value = frame.lookup(field)?;
        key.push_str(&value.to_string());
        key.push('\u{1f}');
        key_values.push(value.clone());
    }
    Ok((key_values, key))
}

fn compute_aggregate(agg: &AggregateFunction, frames: &[Frame]) -> Result<Value, QueryError> {
    match agg {
        AggregateFunction::Count(CountTarget::All) => Ok(Value::Integer(frames.len() as i64)),
        AggregateFunction::Count(CountTarget::Field(field)) => {
            let mut count: i64 = 0;
            for frame in frames {
                if !frame.lookup(field)?.is_null() {
                    count += 1;
                }
            }
            Ok(Value::Integer(count))
        }
        AggregateFunction::Sum(field) => {
            let mut sum_int: Option<i64> = None;
            let mut sum_real: Option<f64> = None;
            let mut sum_numeric: Option<Decimal> = None;

            for frame in frames {
                match frame.lookup(field)? {
                    Value::SmallInt(i) => sum_int = Some(sum_int.unwrap_or(0) + i64::from(*i)),
                    Value::Integer(i) => sum_int = Some(sum_int.unwrap_or(0) + i),
                    Value::Real(r) => sum_real = Some(sum_real.unwrap_or(0.0) + r),
                    Value::Numeric(d) => sum_numeric = Some(sum_numeric.unwrap_or_default() + *d),
                    Value::Null => {}
                    _ => return Err(StorageError::TypeMismatch.into()),
                }
            }

            if let Some(r) = sum_real {
                Ok(Value::Real(r))
            } else if let Some(d) = sum_numeric {
                Ok(Value::Numeric(d))
            } else {
                Ok(Value::Integer(sum_int.unwrap_or(0)))
            }
        }
        AggregateFunction::Avg(field) => {
            let mut sum = 0.0;
            let mut count: u32 = 0;
            for frame in frames {
                let value = frame.lookup(field)?;
                if value.is_null() {
                    continue;
                }
                sum += numeric_as_f64(value).ok_or(StorageError::TypeMismatch)?;
                count += 1;
            }
            if count == 0 {
                Ok(Value::Null)
            } else {
                Ok(Value::Real(sum / f64::from(count)))
            }
        }
        AggregateFunction::Min(field) => extremum(frames, field, Ordering::Less),
        AggregateFunction::Max(field) => extremum(frames, field, Ordering::Greater),
    }
}

/// Min/max over non-null values; `Value::Null` on empty input.
fn extremum(frames: &[Frame], field: &FieldRef, keep: Ordering) -> Result<Value, QueryError> {
    let mut best: Option<Value> = None;
    for frame in frames {
        let value = frame.lookup(field)?;
        if value.is_null() {
            continue;
        }
        best = Some(match best {
            None => value.clone(),
            Some(current) => {
                if compare_values(value, &current).map_err(QueryError::Storage)? == keep {
                    value.clone()
                } else {
                    current
                }
            }
        });
    }
    Ok(best.unwrap_or(Value::Null))
}

fn numeric_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::SmallInt(i) => Some(f64::from(*i)),
        Value::Integer(i) => Some(*i as f64),
        Value::Real(r) => Some(*r),
        Value::Numeric(d) => d.to_f64(),
        _ => None,
    }
}

/// Multi-key stable sort; key values are extracted first so lookup errors
/// surface before the comparator runs.
fn sort_frames(frames: Vec<Frame>, keys: &[SortKey]) -> Result<Vec<Frame>, QueryError> {
    if keys.is_empty() {
        return Ok(frames);
    }

    let mut keyed = Vec::with_capacity(frames.len());
    for frame in frames {
        let mut values = Vec::with_capacity(keys.len());
        for key in keys {
            values.push(frame.lookup(&key.field)?.clone());
        }
        keyed.push((values, frame));
    }

    keyed.sort_by(|a, b| {
        for (i, key) in keys.iter().enumerate() {
            let ord = compare_with_placement(&a.0[i], &b.0[i], key);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        Ordering::Equal
    });

    Ok(keyed.into_iter().map(|(_, frame)| frame).collect())
}

fn compare_with_placement(a: &Value, b: &Value, key: &SortKey) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => Ordering::Equal,
        (true, false) => null_rank(key),
        (false, true) => null_rank(key).reverse(),
        (false, false) => {
            let ord = compare_values(a, b).unwrap_or(Ordering::Equal);
            match key.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        }
    }
}

/// Where a null sorts relative to a non-null value, direction applied.
const fn null_rank(key: &SortKey) -> Ordering {
    match key.nulls {
        NullPlacement::First => Ordering::Less,
        NullPlacement::Last => Ordering::Greater,
        // Store default: nulls compare smallest
        NullPlacement::Default => match key.order {
            SortOrder::Asc => Ordering::Less,
            SortOrder::Desc => Ordering::Greater,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::DataType;

    const USERNAME: FieldRef = FieldRef::new("member", "username", DataType::Text);
    const AGE: FieldRef = FieldRef::new("member", "age", DataType::Integer);

    fn frame(username: Value, age: Value) -> Frame {
        Frame::default().with_slot(Slot {
            entity: "member".to_string(),
            columns: Arc::new(vec![
                Column::new("username", DataType::Text).nullable(),
                Column::new("age", DataType::Integer),
            ]),
            values: vec![username, age],
            present: true,
        })
    }

    fn usernames(frames: &[Frame]) -> Vec<Value> {
        frames
            .iter()
            .map(|f| f.lookup(&USERNAME).unwrap().clone())
            .collect()
    }

    #[test]
    fn test_sort_desc_then_asc_nulls_last() {
        let frames = vec![
            frame(Value::Null, Value::Integer(100)),
            frame(Value::Text("member5".to_string()), Value::Integer(100)),
            frame(Value::Text("member6".to_string()), Value::Integer(100)),
            frame(Value::Text("member1".to_string()), Value::Integer(10)),
        ];

        let sorted = sort_frames(
            frames,
            &[SortKey::desc(AGE), SortKey::asc(USERNAME).nulls_last()],
        )
        .unwrap();

        assert_eq!(
            usernames(&sorted),
            vec![
                Value::Text("member5".to_string()),
                Value::Text("member6".to_string()),
                Value::Null,
                Value::Text("member1".to_string()),
            ]
        );
    }

    #[test]
    fn test_sort_nulls_first_overrides_default() {
        let frames = vec![
            frame(Value::Text("member5".to_string()), Value::Integer(100)),
            frame(Value::Null, Value::Integer(100)),
        ];

        let sorted = sort_frames(frames, &[SortKey::asc(USERNAME).nulls_first()]).unwrap();
        assert_eq!(
            usernames(&sorted),
            vec![Value::Null, Value::Text("member5".to_string())]
        );
    }

    #[test]
    fn test_sort_default_placement_follows_direction() {
        let frames = vec![
            frame(Value::Text("member5".to_string()), Value::Integer(100)),
            frame(Value::Null, Value::Integer(100)),
        ];

        let asc = sort_frames(frames.clone(), &[SortKey::asc(USERNAME)]).unwrap();
        assert_eq!(usernames(&asc)[0], Value::Null);

        let desc = sort_frames(frames, &[SortKey::desc(USERNAME)]).unwrap();
        assert_eq!(usernames(&desc)[1], Value::Null);
    }

    #[test]
    fn test_aggregates_over_frames() {
        let frames = vec![
            frame(Value::Text("member1".to_string()), Value::Integer(10)),
            frame(Value::Text("member2".to_string()), Value::Integer(20)),
            frame(Value::Text("member3".to_string()), Value::Integer(30)),
            frame(Value::Text("member4".to_string()), Value::Integer(40)),
        ];

        let count = compute_aggregate(&AggregateFunction::Count(CountTarget::All), &frames);
        assert_eq!(count.unwrap(), Value::Integer(4));

        let sum = compute_aggregate(&AggregateFunction::Sum(AGE), &frames);
        assert_eq!(sum.unwrap(), Value::Integer(100));

        let avg = compute_aggregate(&AggregateFunction::Avg(AGE), &frames);
        assert_eq!(avg.unwrap(), Value::Real(25.0));

        let max = compute_aggregate(&AggregateFunction::Max(AGE), &frames);
        assert_eq!(max.unwrap(), Value::Integer(40));

        let min = compute_aggregate(&AggregateFunction::Min(AGE), &frames);
        assert_eq!(min.unwrap(), Value::Integer(10));
    }

    #[test]
    fn test_aggregates_skip_nulls() {
        let frames = vec![
            frame(Value::Null, Value::Integer(10)),
            frame(Value::Text("member5".to_string()), Value::Integer(20)),
        ];

        let count_all = compute_aggregate(&AggregateFunction::Count(CountTarget::All), &frames);
        assert_eq!(count_all.unwrap(), Value::Integer(2));

        let count_field =
            compute_aggregate(&AggregateFunction::Count(CountTarget::Field(USERNAME)), &frames);
        assert_eq!(count_field.unwrap(), Value::Integer(1));

        let min = compute_aggregate(&AggregateFunction::Min(USERNAME), &frames);
        assert_eq!(min.unwrap(), Value::Text("member5".to_string()));
    }

    #[test]
    fn test_aggregates_on_empty_input() {
        let sum = compute_aggregate(&AggregateFunction::Sum(AGE), &[]);
        assert_eq!(sum.unwrap(), Value::Integer(0));

        let avg = compute_aggregate(&AggregateFunction::Avg(AGE), &[]);
        assert_eq!(avg.unwrap(), Value::Null);

        let max = compute_aggregate(&AggregateFunction::Max(AGE), &[]);
        assert_eq!(max.unwrap(), Value::Null);
    }
}
