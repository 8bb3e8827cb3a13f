use crate::schema::FieldRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Where null field values land relative to non-null ones. `Default` is the
/// store order: nulls compare smallest (first ascending, last descending).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPlacement {
    First,
    Last,
    Default,
}

/// One order-by key. Keys apply left-to-right; ties keep store order.
#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub field: FieldRef,
    pub order: SortOrder,
    pub nulls: NullPlacement,
}

impl SortKey {
    #[must_use]
    pub const fn asc(field: FieldRef) -> Self {
        Self {
            field,
            order: SortOrder::Asc,
            nulls: NullPlacement::Default,
        }
    }

    #[must_use]
    pub const fn desc(field: FieldRef) -> Self {
        Self {
            field,
            order: SortOrder::Desc,
            nulls: NullPlacement::Default,
        }
    }

    #[must_use]
    pub const fn nulls_first(mut self) -> Self {
        self.nulls = NullPlacement::First;
        self
    }

    #[must_use]
    pub const fn nulls_last(mut self) -> Self {
        self.nulls = NullPlacement::Last;
        self
    }
}
