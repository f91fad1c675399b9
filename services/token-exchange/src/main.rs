//! Token Exchange Service - Main Entry Point
//!
//! Reads one `application/x-www-form-urlencoded` token request from stdin,
//! runs the token exchange grant, and writes the OAuth JSON response to
//! stdout. Exits non-zero when the request was rejected.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use tokio::io::AsyncReadExt;
use tracing::info;

use token_exchange::config::Config;
use token_exchange::observability::init_tracing;
use token_exchange::validation::JwtTokenValidator;
use token_exchange::{process_token_request, JwtTokenIssuer, TokenExchangeHandler};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let config = Config::from_env().context("loading configuration")?;
    init_tracing(&config.tracing).context("initializing tracing")?;

    info!(service = %config.tracing.service_name, "Starting Token Exchange Service");

    let validator = JwtTokenValidator::new(&config.subject_token)
        .context("building subject token validator")?;
    let issuer = JwtTokenIssuer::new(&config.issuance).context("building token issuer")?;
    let handler = TokenExchangeHandler::new(Arc::new(validator), config.exchange.clone());

    let mut body = Vec::new();
    tokio::io::stdin()
        .read_to_end(&mut body)
        .await
        .context("reading request body")?;

    let response = process_token_request(&handler, &issuer, body.trim_ascii()).await;
    let status = response.http_status();
    println!("{}", serde_json::to_string_pretty(&response)?);

    info!(status, "Token request processed");
    Ok(if status == 200 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
