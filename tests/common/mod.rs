#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;
use serde_json::{json, Value};
use uuid::Uuid;

use bookshelf_api::config::AppConfig;
use bookshelf_api::database::Storage;
use bookshelf_api::{app, AppState};

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub http: reqwest::Client,
}

impl TestServer {
    async fn spawn(config: AppConfig) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let state = AppState::new(config, Storage::memory())?;
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind test port")?;

        // Lives as long as the test's runtime
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        Ok(Self {
            port,
            base_url,
            http: reqwest::Client::new(),
        })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.http.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Sign up a fresh user, returning (user id, token)
    pub async fn signup(&self, email: &str) -> Result<(String, String)> {
        let res = self
            .http
            .post(self.url("/auth/signup"))
            .json(&json!({ "email": email, "password": "correct horse" }))
            .send()
            .await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "signup failed: {}", res.status());

        let body: Value = res.json().await?;
        let id = body["id"].as_str().context("missing id")?.to_string();
        let token = body["token"].as_str().context("missing token")?.to_string();
        Ok((id, token))
    }

    pub async fn create_book(&self, token: &str, book: Value) -> Result<Value> {
        let res = self.http.post(self.url("/books")).bearer_auth(token).json(&book).send().await?;
        anyhow::ensure!(res.status() == StatusCode::CREATED, "create failed: {}", res.status());
        Ok(res.json().await?)
    }
}

/// Start an in-process server over the in-memory store
pub async fn spawn_server() -> Result<TestServer> {
    spawn_server_with(AppConfig::for_tests()).await
}

pub async fn spawn_server_with(mut config: AppConfig) -> Result<TestServer> {
    config.api.enable_request_logging = false;
    let server = TestServer::spawn(config).await?;
    server.wait_ready(Duration::from_secs(5)).await?;
    Ok(server)
}

pub fn unique_email() -> String {
    format!("reader-{}@example.com", Uuid::new_v4().simple())
}

pub fn book(title: &str, author: &str, category: &str, price: f64, rating: f64) -> Value {
    json!({
        "title": title,
        "author": author,
        "category": category,
        "price": price,
        "rating": rating,
        "publishedDate": "2000-01-01"
    })
}
