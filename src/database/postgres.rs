use async_trait::async_trait;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::QueryAs;
use sqlx::PgPool;
use uuid::Uuid;

use crate::filter::{Filter, FilterValue};

use super::manager::DatabaseError;
use super::models::{Book, BookChanges, NewBook, NewUser, User};
use super::store::{BookStore, UserStore};

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> Result<User, DatabaseError> {
        let result = sqlx::query_as::<_, User>(
            "INSERT INTO users (id, email, password_hash)
             VALUES ($1, $2, $3)
             RETURNING id, email, password_hash, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(DatabaseError::Conflict(format!("email '{}' already registered", user.email)))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, password_hash, created_at
             FROM users
             WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }
}

pub struct PgBookStore {
    pool: PgPool,
}

impl PgBookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for PgBookStore {
    async fn insert(&self, book: NewBook) -> Result<Book, DatabaseError> {
        let created = sqlx::query_as::<_, Book>(
            "INSERT INTO books (id, title, author, category, price, rating, published_date, user_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.category)
        .bind(book.price)
        .bind(book.rating)
        .bind(book.published_date)
        .bind(book.user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn count(&self, filter: &Filter) -> Result<i64, DatabaseError> {
        let sql = filter.to_count_sql();
        let q = sqlx::query_as::<_, (i64,)>(&sql.query);
        let (count,) = bind_filter_params(q, &sql.params).fetch_one(&self.pool).await?;
        Ok(count)
    }

    async fn select(&self, filter: &Filter) -> Result<Vec<Book>, DatabaseError> {
        let sql = filter.to_sql();
        let q = sqlx::query_as::<_, Book>(&sql.query);
        let rows = bind_filter_params(q, &sql.params).fetch_all(&self.pool).await?;
        Ok(rows)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Book>, DatabaseError> {
        let book = sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn update(&self, id: Uuid, changes: BookChanges) -> Result<Option<Book>, DatabaseError> {
        let mut qb = sqlx::QueryBuilder::<Postgres>::new("UPDATE books SET updated_at = now()");
        if let Some(title) = changes.title {
            qb.push(", title = ").push_bind(title);
        }
        if let Some(author) = changes.author {
            qb.push(", author = ").push_bind(author);
        }
        if let Some(category) = changes.category {
            qb.push(", category = ").push_bind(category);
        }
        if let Some(price) = changes.price {
            qb.push(", price = ").push_bind(price);
        }
        if let Some(rating) = changes.rating {
            qb.push(", rating = ").push_bind(rating);
        }
        if let Some(published_date) = changes.published_date {
            qb.push(", published_date = ").push_bind(published_date);
        }
        qb.push(" WHERE id = ").push_bind(id).push(" RETURNING *");

        let updated = qb.build_query_as::<Book>().fetch_optional(&self.pool).await?;
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

fn bind_filter_params<'q, O>(
    mut q: QueryAs<'q, Postgres, O, PgArguments>,
    params: &'q [FilterValue],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for param in params {
        q = match param {
            FilterValue::Text(s) => q.bind(s.as_str()),
            FilterValue::Float(f) => q.bind(*f),
        };
    }
    q
}
