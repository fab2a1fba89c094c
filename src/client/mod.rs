//! Typed HTTP client for the bookshelf API.
//!
//! The client holds no credentials. `signup` and `login` return a [`Session`],
//! and every catalog call takes that session explicitly.

pub mod error;
pub mod session;

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use url::Url;

use crate::api::{BookPage, CreateBookRequest, Credentials, ListBooksQuery, UpdateBookRequest};
use crate::database::Book;

pub use error::ClientError;
pub use session::Session;

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub storage: String,
}

#[derive(Debug, Clone)]
pub struct BookshelfClient {
    http: reqwest::Client,
    base_url: Url,
}

impl BookshelfClient {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self {
            http,
            base_url: Url::parse(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub async fn signup(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let request = self.http.post(self.url("/auth/signup")?).json(&Credentials::new(email, password));
        let auth: crate::api::AuthResponse = self.send(request).await?;
        Ok(auth.into())
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<Session, ClientError> {
        let request = self.http.post(self.url("/auth/login")?).json(&Credentials::new(email, password));
        let auth: crate::api::AuthResponse = self.send(request).await?;
        Ok(auth.into())
    }

    pub async fn list_books(&self, session: &Session, query: &ListBooksQuery) -> Result<BookPage, ClientError> {
        let request = self.http.get(self.url("/books")?).query(query);
        self.send(authorize(request, session)?).await
    }

    pub async fn get_book(&self, session: &Session, id: &str) -> Result<Book, ClientError> {
        let request = self.http.get(self.book_url(id)?);
        self.send(authorize(request, session)?).await
    }

    pub async fn create_book(&self, session: &Session, book: &CreateBookRequest) -> Result<Book, ClientError> {
        let request = self.http.post(self.url("/books")?).json(book);
        self.send(authorize(request, session)?).await
    }

    pub async fn update_book(
        &self,
        session: &Session,
        id: &str,
        changes: &UpdateBookRequest,
    ) -> Result<Book, ClientError> {
        let request = self.http.put(self.book_url(id)?).json(changes);
        self.send(authorize(request, session)?).await
    }

    pub async fn delete_book(&self, session: &Session, id: &str) -> Result<(), ClientError> {
        let request = self.http.delete(self.book_url(id)?);
        let response = authorize(request, session)?.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await?;
        Err(ClientError::from_error_body(status, &body))
    }

    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        self.send(self.http.get(self.url("/health")?)).await
    }

    fn url(&self, path: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(path)?)
    }

    fn book_url(&self, id: &str) -> Result<Url, ClientError> {
        let mut url = self.url("/books")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase))?
            .push(id);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        decode(request.send().await?).await
    }
}

fn authorize(request: RequestBuilder, session: &Session) -> Result<RequestBuilder, ClientError> {
    Ok(request.bearer_auth(session.bearer()?))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    let body = response.bytes().await?;
    if !status.is_success() {
        return Err(ClientError::from_error_body(status, &body));
    }
    parse_body(status, &body)
}

fn parse_body<T: DeserializeOwned>(status: StatusCode, body: &[u8]) -> Result<T, ClientError> {
    serde_json::from_slice(body).map_err(|e| ClientError::Parse {
        status: status.as_u16(),
        message: e.to_string(),
    })
}
