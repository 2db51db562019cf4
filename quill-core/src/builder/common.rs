//! Clause accumulator and the small types shared by every statement kind

use crate::{Operator, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Fluent state of one query: everything the chaining methods record
/// between table selection and the next terminal call. Every list keeps
/// insertion order and is rendered verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct Clauses {
    pub projection: String,
    pub joins: Vec<JoinClause>,
    /// Rendered predicate fragments, space-joined on output
    pub predicates: Vec<String>,
    pub group_by: Vec<String>,
    pub having: Vec<String>,
    pub order_by: Vec<OrderByClause>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

impl Default for Clauses {
    fn default() -> Self {
        Self {
            projection: "*".to_string(),
            joins: Vec::new(),
            predicates: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }
}

impl Clauses {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn has_predicates(&self) -> bool {
        !self.predicates.is_empty()
    }

    /// Set the limit; the offset only changes when one is given
    pub fn set_limit(&mut self, limit: u64, offset: Option<u64>) {
        self.limit = Some(limit);
        if offset.is_some() {
            self.offset = offset;
        }
    }
}

/// JOIN types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Cross,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JoinType::Inner => write!(f, "INNER"),
            JoinType::Left => write!(f, "LEFT"),
            JoinType::Right => write!(f, "RIGHT"),
            JoinType::Cross => write!(f, "CROSS"),
        }
    }
}

/// The ON part of a join
#[derive(Debug, Clone, PartialEq)]
pub struct JoinCondition {
    pub left: String,
    pub operator: Operator,
    pub right: String,
}

/// A complete JOIN clause; cross joins carry no condition
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: String,
    pub on: Option<JoinCondition>,
}

impl fmt::Display for JoinClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} JOIN {}", self.join_type, self.table)?;
        match (&self.on, self.join_type) {
            (_, JoinType::Cross) | (None, _) => Ok(()),
            (Some(on), _) => write!(f, " ON {} {} {}", on.left, on.operator, on.right),
        }
    }
}

/// Sort direction for ORDER BY clauses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "ASC"),
            SortDirection::Desc => write!(f, "DESC"),
        }
    }
}

/// An ORDER BY entry. Without a direction the column renders bare and the
/// database's ascending default applies.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderByClause {
    pub column: String,
    pub direction: Option<SortDirection>,
}

impl fmt::Display for OrderByClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction {
            Some(direction) => write!(f, "{} {}", self.column, direction),
            None => write!(f, "{}", self.column),
        }
    }
}

/// Trait to convert various types into columns
pub trait IntoColumns {
    fn into_columns(self) -> Vec<String>;
}

impl IntoColumns for &str {
    fn into_columns(self) -> Vec<String> {
        vec![self.to_string()]
    }
}

impl IntoColumns for String {
    fn into_columns(self) -> Vec<String> {
        vec![self]
    }
}

impl IntoColumns for Vec<String> {
    fn into_columns(self) -> Vec<String> {
        self
    }
}

impl IntoColumns for Vec<&str> {
    fn into_columns(self) -> Vec<String> {
        self.into_iter().map(|s| s.to_string()).collect()
    }
}

impl<const N: usize> IntoColumns for [&str; N] {
    fn into_columns(self) -> Vec<String> {
        self.iter().map(|s| s.to_string()).collect()
    }
}

impl IntoColumns for (&str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string()]
    }
}

impl IntoColumns for (&str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![self.0.to_string(), self.1.to_string(), self.2.to_string()]
    }
}

impl IntoColumns for (&str, &str, &str, &str) {
    fn into_columns(self) -> Vec<String> {
        vec![
            self.0.to_string(),
            self.1.to_string(),
            self.2.to_string(),
            self.3.to_string(),
        ]
    }
}

/// One row of column → value data for INSERT, UPDATE and UPSERT
pub type Record = Vec<(String, Value)>;

/// Trait for types that can be converted to ordered column data
pub trait IntoRecord {
    fn into_record(self) -> Record;
}

impl<K, V> IntoRecord for Vec<(K, V)>
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_record(self) -> Record {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K, V, const N: usize> IntoRecord for [(K, V); N]
where
    K: Into<String>,
    V: Into<Value>,
{
    fn into_record(self) -> Record {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl IntoRecord for BTreeMap<String, Value> {
    fn into_record(self) -> Record {
        self.into_iter().collect()
    }
}

/// Columns are sorted by name so the rendered SQL is stable.
impl IntoRecord for HashMap<String, Value> {
    fn into_record(self) -> Record {
        let mut record: Record = self.into_iter().collect();
        record.sort_by(|a, b| a.0.cmp(&b.0));
        record
    }
}
