use clap::{Args, Subcommand};

use crate::api::{CreateBookRequest, ListBooksQuery, UpdateBookRequest};
use crate::cli::utils::{output_book, output_book_page, output_success};
use crate::cli::CliContext;
use crate::types::Patch;

/// Page size the CLI asks for unless told otherwise
pub const DEFAULT_LIST_LIMIT: i64 = 6;

#[derive(Subcommand)]
pub enum BookCommands {
    #[command(about = "List books with optional filters")]
    List(ListArgs),

    #[command(about = "Show one book")]
    Get {
        #[arg(help = "Book id")]
        id: String,
    },

    #[command(about = "Add a book")]
    Create(CreateArgs),

    #[command(about = "Change some fields of a book")]
    Update(UpdateArgs),

    #[command(about = "Delete a book permanently")]
    Delete {
        #[arg(help = "Book id")]
        id: String,
    },
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    #[arg(long, help = "Title contains (case-insensitive)")]
    pub title: Option<String>,
    #[arg(long, help = "Author contains (case-insensitive)")]
    pub author: Option<String>,
    #[arg(long, help = "Exact category")]
    pub category: Option<String>,
    #[arg(long, help = "Minimum rating")]
    pub rating: Option<f64>,
    #[arg(long, default_value_t = 1)]
    pub page: i64,
    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
    pub limit: i64,
}

impl ListArgs {
    pub fn to_query(&self) -> ListBooksQuery {
        ListBooksQuery {
            title: self.title.clone(),
            author: self.author.clone(),
            category: self.category.clone(),
            rating: self.rating.map(|r| r.to_string()),
            page: Some(self.page.to_string()),
            limit: Some(self.limit.to_string()),
        }
    }
}

#[derive(Args, Debug)]
pub struct CreateArgs {
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub author: String,
    #[arg(long)]
    pub category: String,
    #[arg(long)]
    pub price: f64,
    #[arg(long)]
    pub rating: f64,
    #[arg(long, help = "Publication date (YYYY-MM-DD)")]
    pub published_date: String,
}

impl From<CreateArgs> for CreateBookRequest {
    fn from(args: CreateArgs) -> Self {
        CreateBookRequest {
            title: Some(args.title),
            author: Some(args.author),
            category: Some(args.category),
            price: Some(args.price.into()),
            rating: Some(args.rating.into()),
            published_date: Some(args.published_date),
        }
    }
}

#[derive(Args, Debug)]
pub struct UpdateArgs {
    #[arg(help = "Book id")]
    pub id: String,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub author: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub price: Option<f64>,
    #[arg(long)]
    pub rating: Option<f64>,
    #[arg(long, help = "Publication date (YYYY-MM-DD)")]
    pub published_date: Option<String>,
}

impl UpdateArgs {
    pub fn to_request(&self) -> UpdateBookRequest {
        fn patch<T: Clone>(value: &Option<T>) -> Patch<T> {
            value.clone().map_or(Patch::Absent, Patch::Value)
        }

        UpdateBookRequest {
            title: patch(&self.title),
            author: patch(&self.author),
            category: patch(&self.category),
            price: patch(&self.price).map(Into::into),
            rating: patch(&self.rating).map(Into::into),
            published_date: patch(&self.published_date),
        }
    }
}

pub async fn handle(cmd: BookCommands, ctx: &mut CliContext) -> anyhow::Result<()> {
    let client = ctx.client()?;
    let session = ctx.env.session.clone();

    match cmd {
        BookCommands::List(args) => match client.list_books(&session, &args.to_query()).await {
            Ok(page) => output_book_page(&ctx.output, &page),
            Err(e) => Err(ctx.handle_client_error(e)),
        },
        BookCommands::Get { id } => match client.get_book(&session, &id).await {
            Ok(book) => output_book(&ctx.output, &book),
            Err(e) => Err(ctx.handle_client_error(e)),
        },
        BookCommands::Create(args) => match client.create_book(&session, &args.into()).await {
            Ok(book) => output_book(&ctx.output, &book),
            Err(e) => Err(ctx.handle_client_error(e)),
        },
        BookCommands::Update(args) => {
            let changes = args.to_request();
            match client.update_book(&session, &args.id, &changes).await {
                Ok(book) => output_book(&ctx.output, &book),
                Err(e) => Err(ctx.handle_client_error(e)),
            }
        }
        BookCommands::Delete { id } => match client.delete_book(&session, &id).await {
            Ok(()) => output_success(&ctx.output, &format!("Deleted book {}", id), Some(serde_json::json!({ "id": id }))),
            Err(e) => Err(ctx.handle_client_error(e)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_defaults_to_six_per_page() {
        let query = ListArgs { page: 1, limit: DEFAULT_LIST_LIMIT, ..Default::default() }.to_query();
        assert_eq!(query.limit.as_deref(), Some("6"));
        assert_eq!(query.page.as_deref(), Some("1"));
        assert!(query.title.is_none());
    }

    #[test]
    fn update_sends_only_given_flags() {
        let args = UpdateArgs {
            id: "abc".into(),
            title: None,
            author: None,
            category: None,
            price: Some(375.0),
            rating: None,
            published_date: None,
        };
        let body = serde_json::to_value(args.to_request()).unwrap();
        assert_eq!(body, serde_json::json!({ "price": 375.0 }));
    }
}
