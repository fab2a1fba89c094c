use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::filter::{FilterValue, Filterable};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
    pub published_date: NaiveDate,
    /// Creating user. Informational only: reads and writes are not scoped by it.
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validated book ready to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub category: String,
    pub price: f64,
    pub rating: f64,
    pub published_date: NaiveDate,
    pub user_id: Option<Uuid>,
}

/// Validated column changes for an update. `None` leaves the column as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookChanges {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub price: Option<f64>,
    pub rating: Option<f64>,
    pub published_date: Option<NaiveDate>,
}

impl BookChanges {
    pub fn is_empty(&self) -> bool {
        *self == BookChanges::default()
    }

    /// Apply the changes in place, as the store's UPDATE would.
    pub fn apply_to(&self, book: &mut Book) {
        if let Some(title) = &self.title {
            book.title = title.clone();
        }
        if let Some(author) = &self.author {
            book.author = author.clone();
        }
        if let Some(category) = &self.category {
            book.category = category.clone();
        }
        if let Some(price) = self.price {
            book.price = price;
        }
        if let Some(rating) = self.rating {
            book.rating = rating;
        }
        if let Some(published_date) = self.published_date {
            book.published_date = published_date;
        }
    }
}

impl Filterable for Book {
    fn field(&self, column: &str) -> Option<FilterValue> {
        Some(match column {
            "id" => FilterValue::Text(self.id.to_string()),
            "title" => self.title.as_str().into(),
            "author" => self.author.as_str().into(),
            "category" => self.category.as_str().into(),
            "price" => self.price.into(),
            "rating" => self.rating.into(),
            "published_date" => FilterValue::Text(self.published_date.format("%Y-%m-%d").to_string()),
            // Fixed-width timestamps sort lexicographically in time order
            "created_at" => FilterValue::Text(self.created_at.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            "updated_at" => FilterValue::Text(self.updated_at.to_rfc3339_opts(SecondsFormat::Nanos, true)),
            _ => return None,
        })
    }
}
