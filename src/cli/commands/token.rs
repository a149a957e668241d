use chrono::{Duration, Utc};
use clap::Subcommand;
use serde_json::json;
use uuid::Uuid;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::config;
use crate::types::Role;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Issue a signed session token for a known user")]
    Issue {
        #[arg(long, help = "User id")]
        user_id: Uuid,
        #[arg(long, help = "Display name")]
        name: String,
        #[arg(long, help = "Email")]
        email: String,
        #[arg(long, help = "Role: ADMIN, DIRECTOR or ANALYST")]
        role: Role,
        #[arg(long, help = "Organization id")]
        org_id: Uuid,
        #[arg(long, help = "Organization name")]
        org_name: String,
        #[arg(long, help = "Lifetime in hours (defaults to SECURITY_JWT_EXPIRY_HOURS)")]
        hours: Option<u64>,
        #[arg(long, env = "JWT_SECRET", hide_env_values = true, help = "Signing secret")]
        secret: Option<String>,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Issue {
            user_id,
            name,
            email,
            role,
            org_id,
            org_name,
            hours,
            secret,
        } => {
            let settings = &config::config().security;
            let hours = hours.unwrap_or(settings.jwt_expiry_hours);
            let secret = secret.unwrap_or_else(|| settings.jwt_secret.clone());

            let now = Utc::now();
            let claims = Claims {
                sub: user_id,
                name,
                email,
                role,
                organization_id: org_id,
                organization_name: org_name,
                exp: (now + Duration::hours(hours as i64)).timestamp(),
                iat: now.timestamp(),
            };
            let token = generate_jwt(&claims, &secret)?;

            match output_format {
                OutputFormat::Text => println!("{}", token),
                OutputFormat::Json => output_success(
                    &output_format,
                    "Token issued",
                    Some(json!({ "token": token, "expires_at": claims.exp, "claims": claims })),
                )?,
            }
            Ok(())
        }
    }
}
