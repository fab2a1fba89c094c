use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterOp, FilterOrderInfo, FilterValue, FilterWhereInfo, Filterable, SortDirection, SqlResult};

/// A composable query over one table: predicates (AND), ordering and a page window.
///
/// The same `Filter` renders to parameterised SQL for Postgres and evaluates
/// directly against in-memory rows, so both storage backends agree on results.
#[derive(Debug, Clone)]
pub struct Filter {
    table_name: String,
    conditions: Vec<FilterWhereInfo>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            conditions: vec![],
            order_data: vec![],
            limit: None,
            offset: None,
        })
    }

    pub fn where_eq(&mut self, column: &str, value: impl Into<FilterValue>) -> Result<&mut Self, FilterError> {
        self.push_condition(column, FilterOp::Eq, value.into())
    }

    pub fn where_gte(&mut self, column: &str, value: impl Into<FilterValue>) -> Result<&mut Self, FilterError> {
        self.push_condition(column, FilterOp::Gte, value.into())
    }

    pub fn where_contains(&mut self, column: &str, value: impl Into<FilterValue>) -> Result<&mut Self, FilterError> {
        self.push_condition(column, FilterOp::Contains, value.into())
    }

    fn push_condition(&mut self, column: &str, operator: FilterOp, data: FilterValue) -> Result<&mut Self, FilterError> {
        Self::validate_column(column)?;
        self.conditions.push(FilterWhereInfo { column: column.to_string(), operator, data });
        Ok(self)
    }

    pub fn order(&mut self, column: &str, sort: SortDirection) -> Result<&mut Self, FilterError> {
        Self::validate_column(column)?;
        self.order_data.push(FilterOrderInfo { column: column.to_string(), sort });
        Ok(self)
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 {
            return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string()));
        }
        if let Some(off) = offset {
            if off < 0 {
                return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string()));
            }
        }
        self.limit = Some(limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 0);
        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_clause),
            FilterOrder::generate(&self.order_data),
            self.build_limit_clause(),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let (where_clause, params) = FilterWhere::generate(&self.conditions, 0);
        SqlResult {
            query: format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table_name, where_clause),
            params,
        }
    }

    /// True when `row` satisfies every predicate.
    pub fn matches<R: Filterable + ?Sized>(&self, row: &R) -> bool {
        FilterWhere::matches(&self.conditions, row)
    }

    /// Number of rows satisfying the predicates, ignoring the page window.
    pub fn count_matching<'a, R, I>(&self, rows: I) -> usize
    where
        R: Filterable + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        rows.into_iter().filter(|row| self.matches(*row)).count()
    }

    /// Apply predicates, ordering and page window to in-memory rows.
    pub fn apply<'a, R, I>(&self, rows: I) -> Vec<R>
    where
        R: Filterable + Clone + 'a,
        I: IntoIterator<Item = &'a R>,
    {
        let mut matched: Vec<&R> = rows.into_iter().filter(|row| self.matches(*row)).collect();
        matched.sort_by(|a, b| FilterOrder::compare(&self.order_data, *a, *b));

        let offset = self.offset.unwrap_or(0).max(0) as usize;
        let limit = self.limit.map(|l| l.max(0) as usize).unwrap_or(usize::MAX);
        matched.into_iter().skip(offset).take(limit).cloned().collect()
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        if !Self::is_identifier(name) {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {}", name)));
        }
        Ok(())
    }

    fn validate_column(column: &str) -> Result<(), FilterError> {
        if !Self::is_identifier(column) {
            return Err(FilterError::InvalidColumn(format!("Invalid column name format: {}", column)));
        }
        Ok(())
    }

    fn is_identifier(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() || first == '_' => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            (None, Some(o)) => format!("OFFSET {}", o),
            (None, None) => String::new(),
        }
    }
}
