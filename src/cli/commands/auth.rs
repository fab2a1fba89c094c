use std::io::{self, BufRead, Write};

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::CliContext;
use crate::client::Session;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Create an account and save its session")]
    Signup {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Login to server")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Forget the saved session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,
}

pub async fn handle(cmd: AuthCommands, ctx: &mut CliContext) -> anyhow::Result<()> {
    match cmd {
        AuthCommands::Signup { email, password } => {
            let password = password_or_prompt(password)?;
            let session = match ctx.client()?.signup(&email, &password).await {
                Ok(session) => session,
                Err(e) => return Err(ctx.handle_client_error(e)),
            };
            store_session(ctx, session, "Signed up")
        }
        AuthCommands::Login { email, password } => {
            let password = password_or_prompt(password)?;
            let session = match ctx.client()?.login(&email, &password).await {
                Ok(session) => session,
                Err(e) => return Err(ctx.handle_client_error(e)),
            };
            store_session(ctx, session, "Logged in")
        }
        AuthCommands::Logout => {
            ctx.env.session = Session::anonymous();
            ctx.save()?;
            output_success(&ctx.output, "Logged out", None)
        }
        AuthCommands::Status => {
            let session = &ctx.env.session;
            if session.is_authenticated() {
                let email = session.email.as_deref().unwrap_or("unknown user");
                output_success(
                    &ctx.output,
                    &format!("Logged in as {} on {}", email, ctx.server_url()),
                    Some(json!({ "authenticated": true, "email": session.email, "user_id": session.user_id, "server": ctx.server_url() })),
                )
            } else {
                output_success(
                    &ctx.output,
                    &format!("Not logged in to {}", ctx.server_url()),
                    Some(json!({ "authenticated": false, "server": ctx.server_url() })),
                )
            }
        }
    }
}

fn store_session(ctx: &mut CliContext, session: Session, verb: &str) -> anyhow::Result<()> {
    let data = json!({ "id": session.user_id, "email": session.email });
    let message = format!("{} as {}", verb, session.email.as_deref().unwrap_or_default());
    ctx.env.session = session;
    ctx.save()?;
    output_success(&ctx.output, &message, Some(data))
}

fn password_or_prompt(password: Option<String>) -> anyhow::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }

    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}
