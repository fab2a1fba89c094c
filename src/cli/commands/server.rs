use clap::Subcommand;
use serde_json::json;
use url::Url;

use crate::cli::utils::output_success;
use crate::cli::CliContext;
use crate::client::Session;

#[derive(Subcommand)]
pub enum ServerCommands {
    #[command(about = "Check server health status from API /health endpoint")]
    Health,

    #[command(about = "Switch to another server (clears the saved session)")]
    Use {
        #[arg(help = "Server URL, e.g. http://localhost:3000")]
        url: String,
    },
}

pub async fn handle(cmd: ServerCommands, ctx: &mut CliContext) -> anyhow::Result<()> {
    match cmd {
        ServerCommands::Health => {
            let health = match ctx.client()?.health().await {
                Ok(health) => health,
                Err(e) => return Err(ctx.handle_client_error(e)),
            };
            output_success(
                &ctx.output,
                &format!("{} is {} ({} storage)", ctx.server_url(), health.status, health.storage),
                Some(json!({ "health": health })),
            )
        }
        ServerCommands::Use { url } => {
            let parsed = Url::parse(&url)?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("Server URL must use http or https");
            }

            let url = parsed.as_str().trim_end_matches('/').to_string();
            if ctx.env.server_url.as_deref() != Some(url.as_str()) {
                ctx.env.session = Session::anonymous();
            }
            ctx.env.server_url = Some(url.clone());
            ctx.save()?;
            output_success(&ctx.output, &format!("Switched to server '{}'", url), Some(json!({ "current_server": url })))
        }
    }
}
