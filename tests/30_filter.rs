mod common;

use std::collections::HashSet;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::Value;

use common::TestServer;

async fn seeded() -> Result<(TestServer, String)> {
    let server = common::spawn_server().await?;
    let (_, token) = server.signup(&common::unique_email()).await?;

    for book in [
        common::book("Dune", "Frank Herbert", "Fiction", 350.0, 4.9),
        common::book("Dune Messiah", "Frank Herbert", "Fiction", 300.0, 3.9),
        common::book("Emma", "Jane Austen", "Fiction", 120.0, 4.0),
        common::book("SICP", "Abelson & Sussman", "Programming", 900.0, 4.7),
        common::book("100% Pure", "Anon", "Cooking", 10.0, 2.5),
    ] {
        server.create_book(&token, book).await?;
    }
    Ok((server, token))
}

async fn list(server: &TestServer, token: &str, query: &str) -> Result<Value> {
    let res = server.http.get(server.url(&format!("/books{query}"))).bearer_auth(token).send().await?;
    anyhow::ensure!(res.status() == StatusCode::OK, "list {query} failed: {}", res.status());
    Ok(res.json().await?)
}

fn titles(page: &Value) -> HashSet<String> {
    page["data"]
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(|b| b["title"].as_str().map(str::to_string))
        .collect()
}

#[tokio::test]
async fn title_and_author_are_case_insensitive_substrings() -> Result<()> {
    let (server, token) = seeded().await?;

    let page = list(&server, &token, "?title=DUNE").await?;
    assert_eq!(titles(&page), HashSet::from(["Dune".to_string(), "Dune Messiah".to_string()]));

    let page = list(&server, &token, "?author=austen").await?;
    assert_eq!(titles(&page), HashSet::from(["Emma".to_string()]));
    Ok(())
}

#[tokio::test]
async fn category_is_exact_and_rating_is_a_minimum() -> Result<()> {
    let (server, token) = seeded().await?;

    assert_eq!(list(&server, &token, "?category=fiction").await?["pagination"]["total"], 0);
    assert_eq!(list(&server, &token, "?category=Fiction").await?["pagination"]["total"], 3);

    let page = list(&server, &token, "?rating=4").await?;
    assert_eq!(
        titles(&page),
        HashSet::from(["Dune".to_string(), "Emma".to_string(), "SICP".to_string()])
    );

    let page = list(&server, &token, "?category=Fiction&rating=4&author=herbert").await?;
    assert_eq!(titles(&page), HashSet::from(["Dune".to_string()]));
    Ok(())
}

#[tokio::test]
async fn empty_filters_are_ignored_and_wildcards_are_literal() -> Result<()> {
    let (server, token) = seeded().await?;

    let page = list(&server, &token, "?title=&author=&category=&rating=").await?;
    assert_eq!(page["pagination"]["total"], 5);

    let page = list(&server, &token, "?title=%25").await?;
    assert_eq!(titles(&page), HashSet::from(["100% Pure".to_string()]));

    let page = list(&server, &token, "?title=_").await?;
    assert_eq!(page["pagination"]["total"], 0);
    Ok(())
}

#[tokio::test]
async fn pages_partition_the_result_set() -> Result<()> {
    let (server, token) = seeded().await?;

    let mut seen = HashSet::new();
    for page_no in 1..=3 {
        let page = list(&server, &token, &format!("?limit=2&page={page_no}")).await?;
        assert_eq!(page["pagination"]["total"], 5);
        assert_eq!(page["pagination"]["pages"], 3);
        assert_eq!(page["pagination"]["limit"], 2);
        assert_eq!(page["pagination"]["page"], page_no);
        for book in page["data"].as_array().unwrap() {
            assert!(seen.insert(book["id"].as_str().unwrap().to_string()));
        }
    }
    assert_eq!(seen.len(), 5);

    let beyond = list(&server, &token, "?limit=2&page=9").await?;
    assert!(beyond["data"].as_array().unwrap().is_empty());
    assert_eq!(beyond["pagination"]["total"], 5);
    Ok(())
}

#[tokio::test]
async fn invalid_paging_values_are_rejected() -> Result<()> {
    let (server, token) = seeded().await?;

    for query in ["?page=0", "?page=-1", "?limit=abc", "?limit=0", "?rating=lots"] {
        let res = server.http.get(server.url(&format!("/books{query}"))).bearer_auth(&token).send().await?;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "{query}");
        let body: Value = res.json().await?;
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }
    Ok(())
}

#[tokio::test]
async fn configured_cap_bounds_the_limit() -> Result<()> {
    let mut config = bookshelf_api::config::AppConfig::for_tests();
    config.filter.max_limit = Some(3);
    let server = common::spawn_server_with(config).await?;
    let (_, token) = server.signup(&common::unique_email()).await?;
    for i in 0..5 {
        server.create_book(&token, common::book(&format!("Book {i}"), "Anon", "Misc", 1.0, 1.0)).await?;
    }

    let page = list(&server, &token, "?limit=50").await?;
    assert_eq!(page["pagination"]["limit"], 3);
    assert_eq!(page["pagination"]["pages"], 2);
    assert_eq!(page["data"].as_array().unwrap().len(), 3);
    Ok(())
}

#[tokio::test]
async fn malformed_query_string_is_a_json_error() -> Result<()> {
    let (server, token) = seeded().await?;

    let res = server.http.get(server.url("/books?page=1&page=2")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let content_type = res.headers()[reqwest::header::CONTENT_TYPE].to_str()?.to_string();
    assert!(content_type.starts_with("application/json"), "{content_type}");
    let body: Value = res.json().await?;
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["message"].as_str().unwrap_or_default().contains("page"));
    Ok(())
}
