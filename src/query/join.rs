use crate::query::Predicate;
use crate::schema::FieldRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
}

/// One join clause. `relation` is the field pair the join matches on (absent
/// for unrelated joins, whose condition lives entirely in `on`); `on` is the
/// extra filter attached with `QueryBuilder::on`, distinct from the relation.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub kind: JoinKind,
    pub entity: &'static str,
    pub relation: Option<(FieldRef, FieldRef)>,
    pub on: Option<Predicate>,
}
