use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;
use uuid::Uuid;

use crate::api::{BookPage, CreateBookRequest, ListBooksQuery, NumericInput, Pagination, UpdateBookRequest};
use crate::config::{ApiConfig, FilterConfig};
use crate::database::{Book, BookChanges, BookStore, NewBook};
use crate::filter::{Filter, SortDirection};
use crate::types::{Operation, Patch};

use super::error::{FieldErrors, ServiceError};

const REQUIRED: &str = "This field is required";

/// Book CRUD plus the filtered, paginated listing
pub struct CatalogService {
    books: Arc<dyn BookStore>,
    default_page_size: i64,
    max_limit: Option<i64>,
    debug_logging: bool,
}

/// Validated listing criteria
#[derive(Debug, Clone, PartialEq)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub category: Option<String>,
    pub min_rating: Option<f64>,
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl BookQuery {
    /// Validate raw query-string values. Empty strings count as not given.
    pub fn parse(query: ListBooksQuery, default_limit: i64, max_limit: Option<i64>) -> Result<Self, ServiceError> {
        let mut errors = FieldErrors::new();

        let page = positive_int(&mut errors, "page", query.page, 1);
        let mut limit = positive_int(&mut errors, "limit", query.limit, default_limit);
        if let Some(max) = max_limit {
            limit = limit.min(max);
        }

        let min_rating = non_empty(query.rating).and_then(|raw| match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() => Some(v),
            _ => {
                errors.add("rating", "Must be a number");
                None
            }
        });

        let offset = (page - 1).checked_mul(limit).unwrap_or_else(|| {
            errors.add("page", "Page is out of range");
            0
        });

        errors.into_result("Invalid query parameters")?;

        Ok(Self {
            title: non_empty(query.title),
            author: non_empty(query.author),
            category: non_empty(query.category),
            min_rating,
            page,
            limit,
            offset,
        })
    }

    /// Predicates only; ordering and window are added by the caller
    pub fn to_filter(&self) -> Result<Filter, ServiceError> {
        let mut filter = Filter::new("books")?;
        if let Some(title) = &self.title {
            filter.where_contains("title", title.as_str())?;
        }
        if let Some(author) = &self.author {
            filter.where_contains("author", author.as_str())?;
        }
        if let Some(category) = &self.category {
            filter.where_eq("category", category.as_str())?;
        }
        if let Some(rating) = self.min_rating {
            filter.where_gte("rating", rating)?;
        }
        Ok(filter)
    }
}

impl CatalogService {
    pub fn new(books: Arc<dyn BookStore>, api: &ApiConfig, filter: &FilterConfig) -> Self {
        Self {
            books,
            default_page_size: api.default_page_size,
            max_limit: filter.max_limit,
            debug_logging: filter.debug_logging,
        }
    }

    pub async fn create(&self, user_id: Uuid, request: CreateBookRequest) -> Result<Book, ServiceError> {
        let mut errors = FieldErrors::new();

        let title = required(&mut errors, "title", request.title, parse_text);
        let author = required(&mut errors, "author", request.author, parse_text);
        let category = required(&mut errors, "category", request.category, parse_text);
        let price = required(&mut errors, "price", request.price, parse_price);
        let rating = required(&mut errors, "rating", request.rating, parse_rating);
        let published_date = required(&mut errors, "publishedDate", request.published_date, parse_date);

        let (Some(title), Some(author), Some(category), Some(price), Some(rating), Some(published_date)) =
            (title, author, category, price, rating, published_date)
        else {
            let message = if errors.mentions(REQUIRED) { "All fields are required" } else { "Invalid book fields" };
            return Err(errors.into_error(message));
        };

        let book = self
            .books
            .insert(NewBook {
                title,
                author,
                category,
                price,
                rating,
                published_date,
                user_id: Some(user_id),
            })
            .await?;

        debug!("{} book {} for user {}", Operation::Create, book.id, user_id);
        Ok(book)
    }

    pub async fn list(&self, query: ListBooksQuery) -> Result<BookPage, ServiceError> {
        let criteria = BookQuery::parse(query, self.default_page_size, self.max_limit)?;
        let mut filter = criteria.to_filter()?;

        let total = self.books.count(&filter).await?;

        filter.order("created_at", SortDirection::Asc)?.order("id", SortDirection::Asc)?;
        filter.limit(criteria.limit, Some(criteria.offset))?;
        if self.debug_logging {
            let sql = filter.to_sql();
            debug!("{} books: {} {:?}", Operation::Select, sql.query, sql.params);
        }

        let data = self.books.select(&filter).await?;
        Ok(BookPage {
            data,
            pagination: Pagination::new(total, criteria.page, criteria.limit),
        })
    }

    pub async fn get(&self, id: &str) -> Result<Book, ServiceError> {
        let id = book_id(id)?;
        self.books.find(id).await?.ok_or_else(not_found)
    }

    /// Change only the fields present in `request`. Any caller may update any book.
    pub async fn update(&self, id: &str, request: UpdateBookRequest) -> Result<Book, ServiceError> {
        let id = book_id(id)?;

        let mut errors = FieldErrors::new();
        let changes = BookChanges {
            title: patched(&mut errors, "title", request.title, parse_text),
            author: patched(&mut errors, "author", request.author, parse_text),
            category: patched(&mut errors, "category", request.category, parse_text),
            price: patched(&mut errors, "price", request.price, parse_price),
            rating: patched(&mut errors, "rating", request.rating, parse_rating),
            published_date: patched(&mut errors, "publishedDate", request.published_date, parse_date),
        };
        errors.into_result("Invalid book fields")?;

        let book = if changes.is_empty() {
            self.books.find(id).await?
        } else {
            self.books.update(id, changes).await?
        };
        let book = book.ok_or_else(not_found)?;

        debug!("{} book {}", Operation::Update, book.id);
        Ok(book)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ServiceError> {
        let id = book_id(id)?;
        if !self.books.delete(id).await? {
            return Err(not_found());
        }
        debug!("{} book {}", Operation::Delete, id);
        Ok(())
    }
}

fn not_found() -> ServiceError {
    ServiceError::NotFound("Book not found".to_string())
}

/// Ids that are not UUIDs cannot name a stored book
fn book_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| not_found())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn positive_int(errors: &mut FieldErrors, field: &str, raw: Option<String>, default: i64) -> i64 {
    let Some(raw) = non_empty(raw) else {
        return default;
    };
    match raw.trim().parse::<i64>() {
        Ok(v) if v >= 1 => v,
        _ => {
            errors.add(field, "Must be a positive integer");
            default
        }
    }
}

fn required<T, U>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<T>,
    parse: impl FnOnce(T) -> Result<U, &'static str>,
) -> Option<U> {
    let Some(value) = value else {
        errors.add(field, REQUIRED);
        return None;
    };
    parse(value).map_err(|problem| errors.add(field, problem)).ok()
}

fn patched<T, U>(
    errors: &mut FieldErrors,
    field: &str,
    value: Patch<T>,
    parse: impl FnOnce(T) -> Result<U, &'static str>,
) -> Option<U> {
    match value {
        Patch::Absent => None,
        Patch::Null => {
            errors.add(field, "Must not be null");
            None
        }
        Patch::Value(v) => parse(v).map_err(|problem| errors.add(field, problem)).ok(),
    }
}

fn parse_text(value: String) -> Result<String, &'static str> {
    if value.is_empty() {
        return Err(REQUIRED);
    }
    Ok(value)
}

fn parse_price(value: NumericInput) -> Result<f64, &'static str> {
    match value.to_finite() {
        Some(p) if p >= 0.0 => Ok(p),
        Some(_) => Err("Must not be negative"),
        None => Err("Must be a number"),
    }
}

fn parse_rating(value: NumericInput) -> Result<f64, &'static str> {
    match value.to_finite() {
        Some(r) if (0.0..=5.0).contains(&r) => Ok(r),
        Some(_) => Err("Must be between 0 and 5"),
        None => Err("Must be a number"),
    }
}

/// `YYYY-MM-DD`, or an RFC 3339 timestamp taken as its UTC calendar date
fn parse_date(value: String) -> Result<NaiveDate, &'static str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(REQUIRED);
    }
    if let Ok(d) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(d);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc).date_naive())
        .map_err(|_| "Must be a date (YYYY-MM-DD)")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::database::Storage;

    fn catalog() -> CatalogService {
        let config = AppConfig::for_tests();
        CatalogService::new(Storage::memory().books, &config.api, &config.filter)
    }

    fn request(title: &str, author: &str, category: &str, price: f64, rating: f64) -> CreateBookRequest {
        CreateBookRequest {
            title: Some(title.to_string()),
            author: Some(author.to_string()),
            category: Some(category.to_string()),
            price: Some(price.into()),
            rating: Some(rating.into()),
            published_date: Some("1965-08-01".to_string()),
        }
    }

    fn query(pairs: &[(&str, &str)]) -> ListBooksQuery {
        let mut q = ListBooksQuery::default();
        for (key, value) in pairs {
            let value = Some(value.to_string());
            match *key {
                "title" => q.title = value,
                "author" => q.author = value,
                "category" => q.category = value,
                "rating" => q.rating = value,
                "page" => q.page = value,
                "limit" => q.limit = value,
                other => panic!("unknown key {other}"),
            }
        }
        q
    }

    fn field_errors(err: ServiceError) -> std::collections::HashMap<String, String> {
        match err {
            ServiceError::Validation { field_errors, .. } => field_errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn create_names_every_missing_field() {
        let err = catalog()
            .create(Uuid::new_v4(), CreateBookRequest { title: Some("Dune".into()), ..Default::default() })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "All fields are required");
        let fields = field_errors(err);
        for name in ["author", "category", "price", "rating", "publishedDate"] {
            assert_eq!(fields.get(name).map(String::as_str), Some(REQUIRED), "{name}");
        }
        assert!(!fields.contains_key("title"));
    }

    #[tokio::test]
    async fn create_parses_numeric_strings_and_timestamps() {
        let user = Uuid::new_v4();
        let mut req = request("Dune", "Frank Herbert", "Fiction", 0.0, 0.0);
        req.price = Some(NumericInput::Text("350".into()));
        req.rating = Some(NumericInput::Text(" 4.9 ".into()));
        req.published_date = Some("1965-08-01T12:00:00Z".into());

        let book = catalog().create(user, req).await.unwrap();
        assert_eq!(book.price, 350.0);
        assert_eq!(book.rating, 4.9);
        assert_eq!(book.published_date, NaiveDate::from_ymd_opt(1965, 8, 1).unwrap());
        assert_eq!(book.user_id, Some(user));
    }

    #[tokio::test]
    async fn create_rejects_out_of_range_numbers() {
        let mut req = request("Dune", "Frank Herbert", "Fiction", -1.0, 6.0);
        req.published_date = Some("not a date".into());

        let err = catalog().create(Uuid::new_v4(), req).await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid book fields");
        let fields = field_errors(err);
        assert_eq!(fields["price"], "Must not be negative");
        assert_eq!(fields["rating"], "Must be between 0 and 5");
        assert!(fields.contains_key("publishedDate"));
    }

    #[tokio::test]
    async fn list_combines_filters() {
        let catalog = catalog();
        let user = Uuid::new_v4();
        catalog.create(user, request("Dune", "Frank Herbert", "Fiction", 350.0, 4.9)).await.unwrap();
        catalog.create(user, request("Emma", "Jane Austen", "Fiction", 120.0, 3.8)).await.unwrap();
        catalog.create(user, request("SICP", "Abelson", "Programming", 900.0, 4.7)).await.unwrap();

        let page = catalog.list(query(&[("category", "Fiction"), ("rating", "4")])).await.unwrap();
        assert_eq!(page.pagination, Pagination { total: 1, page: 1, limit: 10, pages: 1 });
        assert_eq!(page.data[0].title, "Dune");

        let page = catalog.list(query(&[("title", "dUN")])).await.unwrap();
        assert_eq!(page.data.len(), 1);

        let page = catalog.list(query(&[("author", "austen"), ("category", "")])).await.unwrap();
        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].title, "Emma");

        let page = catalog.list(query(&[("category", "fiction")])).await.unwrap();
        assert_eq!(page.pagination.total, 0);
        assert_eq!(page.pagination.pages, 0);
    }

    #[tokio::test]
    async fn list_matches_like_wildcards_literally() {
        let catalog = catalog();
        let user = Uuid::new_v4();
        catalog.create(user, request("100% Rust", "Anon", "Programming", 1.0, 1.0)).await.unwrap();
        catalog.create(user, request("Rust", "Anon", "Programming", 1.0, 1.0)).await.unwrap();

        let page = catalog.list(query(&[("title", "%")])).await.unwrap();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.data[0].title, "100% Rust");
    }

    #[tokio::test]
    async fn list_pages_do_not_overlap() {
        let catalog = catalog();
        let user = Uuid::new_v4();
        for i in 0..13 {
            catalog.create(user, request(&format!("Book {i}"), "Anon", "Fiction", 1.0, 3.0)).await.unwrap();
        }

        let mut seen = std::collections::HashSet::new();
        for page in 1..=3 {
            let result = catalog.list(query(&[("page", page.to_string().as_str()), ("limit", "6")])).await.unwrap();
            assert_eq!(result.pagination.total, 13);
            assert_eq!(result.pagination.pages, 3);
            assert_eq!(result.data.len(), if page == 3 { 1 } else { 6 });
            for book in result.data {
                assert!(seen.insert(book.id));
            }
        }
        assert_eq!(seen.len(), 13);

        let beyond = catalog.list(query(&[("page", "4"), ("limit", "6")])).await.unwrap();
        assert!(beyond.data.is_empty());
    }

    #[tokio::test]
    async fn list_rejects_bad_paging_values() {
        let catalog = catalog();
        for (key, value) in [("page", "0"), ("page", "abc"), ("limit", "-5"), ("limit", "1.5"), ("rating", "high")] {
            let err = catalog.list(query(&[(key, value)])).await.unwrap_err();
            assert!(field_errors(err).contains_key(key), "{key}={value}");
        }
    }

    #[test]
    fn limit_is_capped_when_configured() {
        let parsed = BookQuery::parse(query(&[("limit", "500"), ("page", "2")]), 10, Some(100)).unwrap();
        assert_eq!(parsed.limit, 100);
        assert_eq!(parsed.offset, 100);

        let parsed = BookQuery::parse(ListBooksQuery::default(), 10, None).unwrap();
        assert_eq!((parsed.page, parsed.limit, parsed.offset), (1, 10, 0));
    }

    #[tokio::test]
    async fn update_changes_only_present_fields() {
        let catalog = catalog();
        let book = catalog
            .create(Uuid::new_v4(), request("Dune", "Frank Herbert", "Fiction", 350.0, 4.9))
            .await
            .unwrap();

        let updated = catalog
            .update(
                &book.id.to_string(),
                UpdateBookRequest { price: Patch::Value(375.0.into()), ..Default::default() },
            )
            .await
            .unwrap();

        assert_eq!(updated.price, 375.0);
        assert_eq!(updated.title, book.title);
        assert_eq!(updated.rating, book.rating);
        assert_eq!(updated.published_date, book.published_date);
        assert!(updated.updated_at >= book.updated_at);
    }

    #[tokio::test]
    async fn update_rejects_null_for_required_field() {
        let catalog = catalog();
        let book = catalog
            .create(Uuid::new_v4(), request("Dune", "Frank Herbert", "Fiction", 350.0, 4.9))
            .await
            .unwrap();

        let err = catalog
            .update(&book.id.to_string(), UpdateBookRequest { title: Patch::Null, ..Default::default() })
            .await
            .unwrap_err();
        assert_eq!(field_errors(err)["title"], "Must not be null");
        assert_eq!(catalog.get(&book.id.to_string()).await.unwrap().title, "Dune");
    }

    #[tokio::test]
    async fn unknown_and_malformed_ids_are_not_found() {
        let catalog = catalog();
        let missing = Uuid::new_v4().to_string();

        assert!(matches!(catalog.get(&missing).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(catalog.get("not-a-uuid").await, Err(ServiceError::NotFound(_))));
        assert!(matches!(
            catalog.update(&missing, UpdateBookRequest::default()).await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(catalog.delete("42").await, Err(ServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn delete_is_permanent() {
        let catalog = catalog();
        let book = catalog
            .create(Uuid::new_v4(), request("Dune", "Frank Herbert", "Fiction", 350.0, 4.9))
            .await
            .unwrap();
        let id = book.id.to_string();

        catalog.delete(&id).await.unwrap();
        assert!(matches!(catalog.get(&id).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(catalog.delete(&id).await, Err(ServiceError::NotFound(_))));
    }
}
