use crate::schema::FieldRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountTarget {
    All,             // COUNT(*)
    Field(FieldRef), // COUNT(field), nulls skipped
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregateFunction {
    Count(CountTarget),
    Sum(FieldRef),
    Avg(FieldRef),
    Min(FieldRef),
    Max(FieldRef),
}

impl AggregateFunction {
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Count(CountTarget::All) => "count".to_string(),
            Self::Count(CountTarget::Field(f)) => format!("count({f})"),
            Self::Sum(f) => format!("sum({f})"),
            Self::Avg(f) => format!("avg({f})"),
            Self::Min(f) => format!("min({f})"),
            Self::Max(f) => format!("max({f})"),
        }
    }
}

/// One entry of the projection list: a whole entity, a single field, or an
/// aggregate. Projection order is preserved through to tuple accessors.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Entity(&'static str),
    Field(FieldRef),
    Aggregate(AggregateFunction),
}

impl Projection {
    #[must_use]
    pub const fn count() -> Self {
        Self::Aggregate(AggregateFunction::Count(CountTarget::All))
    }

    #[must_use]
    pub const fn count_field(field: FieldRef) -> Self {
        Self::Aggregate(AggregateFunction::Count(CountTarget::Field(field)))
    }

    #[must_use]
    pub const fn sum(field: FieldRef) -> Self {
        Self::Aggregate(AggregateFunction::Sum(field))
    }

    #[must_use]
    pub const fn avg(field: FieldRef) -> Self {
        Self::Aggregate(AggregateFunction::Avg(field))
    }

    #[must_use]
    pub const fn min(field: FieldRef) -> Self {
        Self::Aggregate(AggregateFunction::Min(field))
    }

    #[must_use]
    pub const fn max(field: FieldRef) -> Self {
        Self::Aggregate(AggregateFunction::Max(field))
    }

    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        matches!(self, Self::Aggregate(_))
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Entity(entity) => (*entity).to_string(),
            Self::Field(field) => field.qualified(),
            Self::Aggregate(agg) => agg.label(),
        }
    }
}

impl From<FieldRef> for Projection {
    fn from(field: FieldRef) -> Self {
        Self::Field(field)
    }
}

impl From<AggregateFunction> for Projection {
    fn from(agg: AggregateFunction) -> Self {
        Self::Aggregate(agg)
    }
}
