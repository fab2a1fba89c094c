use std::cmp::Ordering;

/// Comparison applied by a single filter predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    /// Exact equality
    Eq,
    /// Greater than or equal
    Gte,
    /// Case-insensitive substring match; wildcards in the needle are literal
    Contains,
}

/// A bound parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Float(f64),
}

impl FilterValue {
    /// Ordering between two values of the same kind. Mixed kinds never compare.
    pub fn partial_cmp_value(&self, other: &FilterValue) -> Option<Ordering> {
        match (self, other) {
            (FilterValue::Text(a), FilterValue::Text(b)) => Some(a.cmp(b)),
            (FilterValue::Float(a), FilterValue::Float(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        FilterValue::Text(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        FilterValue::Text(s)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        FilterValue::Float(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub column: String,
    pub operator: FilterOp,
    pub data: FilterValue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterOrderInfo {
    pub column: String,
    pub sort: SortDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<FilterValue>,
}

/// Rows that can be checked against a `Filter` without a database.
pub trait Filterable {
    /// Value of `column` as a filter value, or `None` for unknown columns.
    fn field(&self, column: &str) -> Option<FilterValue>;
}
