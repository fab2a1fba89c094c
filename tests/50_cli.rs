mod common;

use anyhow::Result;
use clap::Parser;

use bookshelf_api::cli::config::ConfigStore;
use bookshelf_api::cli::{run_with_store, Cli};

async fn shelf(store: &ConfigStore, args: &[&str]) -> Result<()> {
    let cli = Cli::try_parse_from(std::iter::once("shelf").chain(args.iter().copied()))?;
    run_with_store(cli, store.clone()).await
}

#[tokio::test]
async fn server_use_persists_and_clears_session() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = ConfigStore::new(dir.path());
    let server = common::spawn_server().await?;

    shelf(&store, &["server", "use", server.base_url.as_str()]).await?;
    shelf(&store, &["auth", "signup", common::unique_email().as_str(), "--password", "pw123456"]).await?;
    assert!(store.load()?.session.is_authenticated());

    shelf(&store, &["server", "use", "http://127.0.0.1:9"]).await?;
    let env = store.load()?;
    assert_eq!(env.server_url(), "http://127.0.0.1:9");
    assert!(!env.session.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn book_commands_use_the_saved_session() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = ConfigStore::new(dir.path());
    let server = common::spawn_server().await?;
    let email = common::unique_email();

    shelf(&store, &["--server", server.base_url.as_str(), "auth", "signup", email.as_str(), "--password", "pw123456"]).await?;
    shelf(
        &store,
        &[
            "--server", server.base_url.as_str(), "--json", "books", "create", "--title", "Dune", "--author", "Frank Herbert",
            "--category", "Fiction", "--price", "350", "--rating", "4.9", "--published-date", "1965-08-01",
        ],
    )
    .await?;
    shelf(&store, &["--server", server.base_url.as_str(), "books", "list", "--category", "Fiction"]).await?;

    shelf(&store, &["auth", "logout"]).await?;
    let err = shelf(&store, &["--server", server.base_url.as_str(), "books", "list"]).await.unwrap_err();
    assert!(err.to_string().contains("Not logged in"));
    Ok(())
}

#[tokio::test]
async fn unauthorized_response_drops_the_saved_session() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let store = ConfigStore::new(dir.path());
    let server = common::spawn_server().await?;

    let mut env = store.load()?;
    env.server_url = Some(server.base_url.clone());
    env.session.token = Some("expired.or.forged".into());
    store.save(&mut env)?;

    let err = shelf(&store, &["books", "list"]).await.unwrap_err();
    assert!(err.to_string().contains("log in again"));
    assert!(!store.load()?.session.is_authenticated());
    Ok(())
}
