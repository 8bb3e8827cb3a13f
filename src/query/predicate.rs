/// Predicate construction for query filters
///
/// Constructors hang off [`FieldRef`] so call sites read fluently
/// (`member_username().equals(...)`) and validate eagerly: a `NULL` operand
/// or an operand outside the field's type family is rejected here, before
/// the predicate can reach a tree. Null tests use `is_null`/`is_not_null`.
use crate::core::{QueryError, Value, value_family};
use crate::schema::FieldRef;

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals(FieldRef, Value),
    NotEquals(FieldRef, Value),
    GreaterThan(FieldRef, Value),
    LessThan(FieldRef, Value),
    GreaterThanOrEqual(FieldRef, Value),
    LessThanOrEqual(FieldRef, Value),
    Between(FieldRef, Value, Value),
    Like(FieldRef, String),
    In(FieldRef, Vec<Value>),
    IsNull(FieldRef),
    IsNotNull(FieldRef),
    /// Field-to-field equality: the theta-join form.
    EqualsField(FieldRef, FieldRef),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
}

impl Predicate {
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        Self::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self::Or(Box::new(self), Box::new(other))
    }

    /// Folds a vararg-style list with AND: `all([p1, p2]) == p1.and(p2)`.
    /// Returns `None` for an empty list.
    #[must_use]
    pub fn all(predicates: Vec<Self>) -> Option<Self> {
        predicates.into_iter().reduce(Self::and)
    }

    /// Collects every field the predicate references (both sides of
    /// `EqualsField`), for build-time entity checks.
    pub(crate) fn collect_fields<'a>(&'a self, out: &mut Vec<&'a FieldRef>) {
        match self {
            Self::Equals(f, _)
            | Self::NotEquals(f, _)
            | Self::GreaterThan(f, _)
            | Self::LessThan(f, _)
            | Self::GreaterThanOrEqual(f, _)
            | Self::LessThanOrEqual(f, _)
            | Self::Between(f, _, _)
            | Self::Like(f, _)
            | Self::In(f, _)
            | Self::IsNull(f)
            | Self::IsNotNull(f) => out.push(f),
            Self::EqualsField(left, right) => {
                out.push(left);
                out.push(right);
            }
            Self::And(left, right) | Self::Or(left, right) => {
                left.collect_fields(out);
                right.collect_fields(out);
            }
        }
    }
}

fn check_operand(field: &FieldRef, value: &Value) -> Result<(), QueryError> {
    if value.is_null() {
        return Err(QueryError::InvalidPredicate(format!(
            "NULL operand for '{field}'; use is_null()/is_not_null()"
        )));
    }
    if value_family(value) != Some(field.data_type.family()) {
        return Err(QueryError::InvalidPredicate(format!(
            "operand {value:?} is not comparable with '{field}'"
        )));
    }
    Ok(())
}

impl FieldRef {
    pub fn equals(&self, value: Value) -> Result<Predicate, QueryError> {
        check_operand(self, &value)?;
        Ok(Predicate::Equals(self.clone(), value))
    }

    pub fn not_equals(&self, value: Value) -> Result<Predicate, QueryError> {
        check_operand(self, &value)?;
        Ok(Predicate::NotEquals(self.clone(), value))
    }

    pub fn greater_than(&self, value: Value) -> Result<Predicate, QueryError> {
        check_operand(self, &value)?;
        Ok(Predicate::GreaterThan(self.clone(), value))
    }

    pub fn less_than(&self, value: Value) -> Result<Predicate, QueryError> {
        check_operand(self, &value)?;
        Ok(Predicate::LessThan(self.clone(), value))
    }

    /// `>=`
    pub fn at_least(&self, value: Value) -> Result<Predicate, QueryError> {
        check_operand(self, &value)?;
        Ok(Predicate::GreaterThanOrEqual(self.clone(), value))
    }

    /// `<=`
    pub fn at_most(&self, value: Value) -> Result<Predicate, QueryError> {
        check_operand(self, &value)?;
        Ok(Predicate::LessThanOrEqual(self.clone(), value))
    }

    pub fn between(&self, low: Value, high: Value) -> Result<Predicate, QueryError> {
        check_operand(self, &low)?;
        check_operand(self, &high)?;
        Ok(Predicate::Between(self.clone(), low, high))
    }

    pub fn in_list(&self, values: Vec<Value>) -> Result<Predicate, QueryError> {
        if values.is_empty() {
            return Err(QueryError::InvalidPredicate(format!(
                "empty IN list for '{self}'"
            )));
        }
        for value in &values {
            check_operand(self, value)?;
        }
        Ok(Predicate::In(self.clone(), values))
    }

    /// `%` matches any run of characters, `_` exactly one. Text fields only.
    pub fn like(&self, pattern: &str) -> Result<Predicate, QueryError> {
        if self.data_type.family() != crate::core::TypeFamily::Text {
            return Err(QueryError::InvalidPredicate(format!(
                "LIKE requires a text field, '{self}' is not"
            )));
        }
        Ok(Predicate::Like(self.clone(), pattern.to_string()))
    }

    #[must_use]
    pub fn is_null(&self) -> Predicate {
        Predicate::IsNull(self.clone())
    }

    #[must_use]
    pub fn is_not_null(&self) -> Predicate {
        Predicate::IsNotNull(self.clone())
    }

    pub fn equals_field(&self, other: &Self) -> Result<Predicate, QueryError> {
        if !self.data_type.comparable_with(&other.data_type) {
            return Err(QueryError::InvalidPredicate(format!(
                "'{self}' and '{other}' are not comparable"
            )));
        }
        Ok(Predicate::EqualsField(self.clone(), other.clone()))
    }
}
