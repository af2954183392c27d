use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::auth::{shared_secret::generate_token, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config::{config, IdentityMode};

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Mint a shared-secret token for local testing")]
    Issue {
        #[arg(help = "User id placed in the token subject")]
        uid: String,

        #[arg(long, help = "Email claim")]
        email: Option<String>,

        #[arg(long, help = "Lifetime in hours (default: JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue { uid, email, hours } => {
            let identity = &config().identity;
            if identity.mode != IdentityMode::SharedSecret {
                tracing::warn!("Server is configured for JWKS verification; this token will be rejected there");
            }

            let claims = Claims::new(uid.clone(), email, hours.unwrap_or(identity.token_expiry_hours));
            let token = generate_token(&claims, &identity.jwt_secret).context("failed to sign token")?;

            match output_format {
                OutputFormat::Text => {
                    println!("{}", token);
                    Ok(())
                }
                OutputFormat::Json => output_success(
                    &output_format,
                    &format!("Token issued for {}", uid),
                    Some(json!({ "token": token, "expires_at": claims.exp })),
                ),
            }
        }
    }
}
