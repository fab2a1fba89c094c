use std::cmp::Ordering;

use super::types::{FilterOrderInfo, Filterable, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    pub fn generate(infos: &[FilterOrderInfo]) -> String {
        if infos.is_empty() {
            return String::new();
        }
        let parts: Vec<String> = infos
            .iter()
            .map(|i| format!("\"{}\" {}", i.column, i.sort.to_sql()))
            .collect();
        format!("ORDER BY {}", parts.join(", "))
    }

    /// Compare two rows the way `ORDER BY` would. Incomparable values tie.
    pub fn compare<R: Filterable + ?Sized>(infos: &[FilterOrderInfo], a: &R, b: &R) -> Ordering {
        for info in infos {
            let ordering = match (a.field(&info.column), b.field(&info.column)) {
                (Some(x), Some(y)) => x.partial_cmp_value(&y).unwrap_or(Ordering::Equal),
                _ => Ordering::Equal,
            };
            let ordering = match info.sort {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}
