use log::info;
use sqlx::PgPool;
use std::env;

use crate::error::AppResult;
use crate::models::CreateServiceToken;
use crate::services::ServiceTokenService;

/// Bootstrap: create an initial service token if none exist and
/// QUOTRAK_BOOTSTRAP_TOKEN is set
pub async fn create_bootstrap_token_if_needed(pool: &PgPool) -> AppResult<()> {
    if env::var("QUOTRAK_BOOTSTRAP_TOKEN").is_err() {
        return Ok(());
    }

    if ServiceTokenService::has_any_token(pool).await? {
        info!("Service tokens already exist, skipping bootstrap");
        return Ok(());
    }

    let input = CreateServiceToken {
        description: Some("Bootstrap token (created automatically)".to_string()),
    };

    let token = ServiceTokenService::create(pool, input).await?;

    // Print to stderr directly (not logs) to avoid the token in log aggregators
    eprintln!();
    eprintln!("==============================================");
    eprintln!("BOOTSTRAP TOKEN CREATED - SAVE THIS NOW!");
    eprintln!("Token: {}", token.token);
    eprintln!("This token will NOT be shown again.");
    eprintln!("==============================================");
    eprintln!();
    info!("Bootstrap token created successfully");

    Ok(())
}
