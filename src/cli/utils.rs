use serde_json::{json, Value};

use crate::api::BookPage;
use crate::cli::OutputFormat;
use crate::database::Book;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({ "message": message });
            if let (Some(target), Some(Value::Object(extra))) = (response.as_object_mut(), data) {
                target.extend(extra);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({ "error": message });
            if let Some(code) = error_code {
                response["error_code"] = json!(code);
            }
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

pub fn output_book(output_format: &OutputFormat, book: &Book) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(book)?),
        OutputFormat::Text => {
            println!("{}", book.title);
            println!("  id:        {}", book.id);
            println!("  author:    {}", book.author);
            println!("  category:  {}", book.category);
            println!("  price:     {:.2}", book.price);
            println!("  rating:    {:.1}", book.rating);
            println!("  published: {}", book.published_date);
        }
    }
    Ok(())
}

pub fn output_book_page(output_format: &OutputFormat, page: &BookPage) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(page)?),
        OutputFormat::Text => {
            if page.data.is_empty() {
                println!("No books found");
            }
            for book in &page.data {
                println!("{}  {} by {} [{}] rating {:.1}, {:.2}", book.id, book.title, book.author, book.category, book.rating, book.price);
            }
            let p = &page.pagination;
            println!("Page {} of {} ({} total, {} per page)", p.page, p.pages.max(1), p.total, p.limit);
        }
    }
    Ok(())
}
