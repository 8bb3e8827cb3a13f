/// Predicate evaluation for query execution
///
/// Evaluates [`Predicate`] trees against join frames. A null field value
/// matches nothing except `IsNull`. This is also why a `filter` on a
/// left-joined entity's field degrades the join to inner-join-equivalent
/// filtering: the null-extended frame fails every other comparison.
use std::cmp::Ordering;
use std::sync::Arc;

use crate::core::{Column, StorageError, Value};
use crate::query::Predicate;
use crate::schema::FieldRef;

/// One entity's slice of a join frame. `present` is false for the
/// null-extended side of an unmatched left join.
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub entity: String,
    pub columns: Arc<Vec<Column>>,
    pub values: Vec<Value>,
    pub present: bool,
}

/// Evaluation environment: one slot per entity the query has reached.
#[derive(Debug, Clone, Default)]
pub(crate) struct Frame {
    pub slots: Vec<Slot>,
}

impl Frame {
    pub(crate) fn with_slot(&self, slot: Slot) -> Self {
        let mut slots = self.slots.clone();
        slots.push(slot);
        Self { slots }
    }

    pub(crate) fn slot(&self, entity: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.entity == entity)
    }

    pub(crate) fn lookup(&self, field: &FieldRef) -> Result<&Value, StorageError> {
        let slot = self
            .slot(field.entity)
            .ok_or_else(|| StorageError::TableNotFound(field.entity.to_string()))?;
        let idx = slot
            .columns
            .iter()
            .position(|c| c.name == field.column)
            .ok_or_else(|| StorageError::ColumnNotFound(field.qualified()))?;
        Ok(&slot.values[idx])
    }
}

/// Evaluates predicates against frames
pub(crate) struct PredicateEvaluator;

impl PredicateEvaluator {
    pub(crate) fn matches(frame: &Frame, predicate: &Predicate) -> Result<bool, StorageError> {
        match predicate {
            Predicate::Equals(field, value) => {
                Self::compare_to(frame, field, value, |ord| ord == Ordering::Equal)
            }
            Predicate::NotEquals(field, value) => {
                Self::compare_to(frame, field, value, |ord| ord != Ordering::Equal)
            }
            Predicate::GreaterThan(field, value) => {
                Self::compare_to(frame, field, value, |ord| ord == Ordering::Greater)
            }
            Predicate::LessThan(field, value) => {
                Self::compare_to(frame, field, value, |ord| ord == Ordering::Less)
            }
            Predicate::GreaterThanOrEqual(field, value) => {
                Self::compare_to(frame, field, value, |ord| ord != Ordering::Less)
            }
            Predicate::LessThanOrEqual(field, value) => {
                Self::compare_to(frame, field, value, |ord| ord != Ordering::Greater)
            }
            Predicate::Between(field, low, high) => {
                let ge_low = Self::compare_to(frame, field, low, |ord| ord != Ordering::Less)?;
                let le_high = Self::compare_to(frame, field, high, |ord| ord != Ordering::Greater)?;
                Ok(ge_low && le_high)
            }
            Predicate::Like(field, pattern) => {
                let actual = frame.lookup(field)?;
                match actual {
                    Value::Text(text) => Ok(like_pattern_match(text, pattern)),
                    Value::Null => Ok(false),
                    _ => Err(StorageError::TypeMismatch),
                }
            }
            Predicate::In(field, values) => {
                let actual = frame.lookup(field)?;
                if actual.is_null() {
                    return Ok(false);
                }
                for candidate in values {
                    if compare_values(actual, candidate)? == Ordering::Equal {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Predicate::IsNull(field) => Ok(frame.lookup(field)?.is_null()),
            Predicate::IsNotNull(field) => Ok(!frame.lookup(field)?.is_null()),
            Predicate::EqualsField(left, right) => {
                let left_value = frame.lookup(left)?;
                let right_value = frame.lookup(right)?;
                if left_value.is_null() || right_value.is_null() {
                    return Ok(false);
                }
                Ok(compare_values(left_value, right_value)? == Ordering::Equal)
            }
            Predicate::And(left, right) => {
                Ok(Self::matches(frame, left)? && Self::matches(frame, right)?)
            }
            Predicate::Or(left, right) => {
                Ok(Self::matches(frame, left)? || Self::matches(frame, right)?)
            }
        }
    }

    fn compare_to(
        frame: &Frame,
        field: &FieldRef,
        value: &Value,
        accept: impl Fn(Ordering) -> bool,
    ) -> Result<bool, StorageError> {
        let actual = frame.lookup(field)?;
        if actual.is_null() {
            return Ok(false);
        }
        Ok(accept(compare_values(actual, value)?))
    }
}

/// Compares two non-null values of the same family. Cross-width integer
/// comparisons are supported; anything else mismatched is a type error.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Result<Ordering, StorageError> {
    match (a, b) {
        (Value::Integer(x), Value::Integer(y)) => Ok(x.cmp(y)),
        (Value::SmallInt(x), Value::SmallInt(y)) => Ok(x.cmp(y)),
        (Value::Integer(x), Value::SmallInt(y)) => Ok(x.cmp(&i64::from(*y))),
        (Value::SmallInt(x), Value::Integer(y)) => Ok(i64::from(*x).cmp(y)),
        (Value::Real(x), Value::Real(y)) => Ok(x.partial_cmp(y).unwrap_or(Ordering::Equal)),
        (Value::Numeric(x), Value::Numeric(y)) => Ok(x.cmp(y)),
        (Value::Text(x), Value::Text(y)) => Ok(x.cmp(y)),
        (Value::Boolean(x), Value::Boolean(y)) => Ok(x.cmp(y)),
        (Value::Date(x), Value::Date(y)) => Ok(x.cmp(y)),
        (Value::Timestamp(x), Value::Timestamp(y)) => Ok(x.cmp(y)),
        (Value::TimestampTz(x), Value::TimestampTz(y)) => Ok(x.cmp(y)),
        (Value::Uuid(x), Value::Uuid(y)) => Ok(x.cmp(y)),
        (Value::Bytea(x), Value::Bytea(y)) => Ok(x.cmp(y)),
        _ => Err(StorageError::TypeMismatch),
    }
}

/// LIKE pattern matching
/// % matches zero or more characters
/// _ matches exactly one character
fn like_pattern_match(text: &str, pattern: &str) -> bool {
    let text_chars: Vec<char> = text.chars().collect();
    let pattern_chars: Vec<char> = pattern.chars().collect();

    match_recursive(&text_chars, &pattern_chars, 0, 0)
}

fn match_recursive(text: &[char], pattern: &[char], ti: usize, pi: usize) -> bool {
    // Both exhausted - match
    if pi >= pattern.len() && ti >= text.len() {
        return true;
    }

    // Pattern exhausted but text remains - no match
    if pi >= pattern.len() {
        return false;
    }

    // Handle % wildcard
    if pattern[pi] == '%' {
        // % can match zero characters
        if match_recursive(text, pattern, ti, pi + 1) {
            return true;
        }
        // % can match one or more characters
        if ti < text.len() && match_recursive(text, pattern, ti + 1, pi) {
            return true;
        }
        return false;
    }

    // Text exhausted but pattern has non-% chars - no match
    if ti >= text.len() {
        return false;
    }

    // Handle _ wildcard (matches exactly one char)
    if pattern[pi] == '_' {
        return match_recursive(text, pattern, ti + 1, pi + 1);
    }

    // Exact character match
    if text[ti] == pattern[pi] {
        return match_recursive(text, pattern, ti + 1, pi + 1);
    }

    false
}
