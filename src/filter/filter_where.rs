use super::types::{FilterOp, FilterValue, FilterWhereInfo, Filterable};

/// Builds a parameterised WHERE clause from filter predicates
pub struct FilterWhere {
    param_values: Vec<FilterValue>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Render `conditions` joined with AND. An empty list renders as `1=1`.
    pub fn generate(conditions: &[FilterWhereInfo], starting_param_index: usize) -> (String, Vec<FilterValue>) {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(conditions)
    }

    fn build(&mut self, conditions: &[FilterWhereInfo]) -> (String, Vec<FilterValue>) {
        let sql_conditions: Vec<String> = conditions
            .iter()
            .map(|condition| self.build_sql_condition(condition))
            .collect();

        let where_clause = if sql_conditions.is_empty() { "1=1".to_string() } else { sql_conditions.join(" AND ") };
        (where_clause, std::mem::take(&mut self.param_values))
    }

    fn build_sql_condition(&mut self, condition: &FilterWhereInfo) -> String {
        let quoted_column = format!("\"{}\"", condition.column);
        match condition.operator {
            FilterOp::Eq => format!("{} = {}", quoted_column, self.param(condition.data.clone())),
            FilterOp::Gte => format!("{} >= {}", quoted_column, self.param(condition.data.clone())),
            FilterOp::Contains => {
                let pattern = match &condition.data {
                    FilterValue::Text(s) => format!("%{}%", escape_like(s)),
                    FilterValue::Float(f) => format!("%{}%", f),
                };
                format!("{} ILIKE {} ESCAPE '\\'", quoted_column, self.param(FilterValue::Text(pattern)))
            }
        }
    }

    fn param(&mut self, value: FilterValue) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }

    /// Evaluate predicates against a row. Unknown columns never match.
    pub fn matches<R: Filterable + ?Sized>(conditions: &[FilterWhereInfo], row: &R) -> bool {
        conditions.iter().all(|condition| {
            let Some(actual) = row.field(&condition.column) else {
                return false;
            };
            match condition.operator {
                FilterOp::Eq => actual == condition.data,
                FilterOp::Gte => matches!(
                    actual.partial_cmp_value(&condition.data),
                    Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal)
                ),
                FilterOp::Contains => match (&actual, &condition.data) {
                    (FilterValue::Text(haystack), FilterValue::Text(needle)) => {
                        haystack.to_lowercase().contains(&needle.to_lowercase())
                    }
                    _ => false,
                },
            }
        })
    }
}

/// Escape LIKE metacharacters so user input matches literally.
pub fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
