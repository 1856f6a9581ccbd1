//! eBay OAuth credential tool
//!
//! Operator CLI around `ebay-auth`:
//! 1. Loads config and opens the JSON property store
//! 2. Builds the flow from the `[client]` table or from stored properties
//! 3. Runs one command and prints its result as JSON on stdout
//!
//! Logs go to stderr as JSON so stdout stays machine-readable.

mod cli;
mod config;
mod error;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use ebay_auth::{AuthFlow, AuthStatus, FileStore, ReqwestTransport, TokenStore};
use serde_json::{Value, json};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Command;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let args = cli::parse(&args)?;

    let config_path = Config::resolve_path(args.config_path.as_deref());
    info!(path = %config_path.display(), "loading configuration");

    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let properties = Arc::new(
        FileStore::open(&config.store.path)
            .with_context(|| format!("failed to open store {}", config.store.path.display()))?,
    );

    info!(
        store = %config.store.path.display(),
        explicit_client = config.client.is_some(),
        timeout_secs = config.http.timeout_secs,
        "configuration loaded"
    );

    let output = match run(&args.command, &config, properties).await {
        Ok(output) => output,
        Err(e) => {
            error!(command = ?args.command, error = %e, "command failed");
            return Err(e);
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn run(command: &Command, config: &Config, properties: Arc<FileStore>) -> Result<Value> {
    if !command.needs_client() {
        let tokens = TokenStore::new(properties);
        return match command {
            Command::Clear => {
                tokens.clear()?;
                Ok(json!({ "cleared": true }))
            }
            _ => Ok(serde_json::to_value(AuthStatus::read(&tokens))?),
        };
    }

    let transport = Arc::new(ReqwestTransport::new(Duration::from_secs(
        config.http.timeout_secs,
    ))?);

    let flow = match &config.client {
        Some(section) => {
            let client = section
                .client_config()
                .context("[client] table has no resolved client secret")?;
            AuthFlow::new(client, properties, transport)
        }
        None => AuthFlow::from_properties(properties, transport)
            .context("client settings missing from property store")?,
    };

    let output = match command {
        Command::Run => {
            let outcome = flow.execute().await?;
            json!({ "outcome": outcome })
        }
        Command::Url { state } => {
            let url = flow.authorization_url(state.as_deref())?;
            json!({
                "authorization_url": url,
                "instructions": "Open the URL in a browser, grant access, then pass the redirected URL to `ebay-oauth complete`"
            })
        }
        Command::Complete { redirect_url } => {
            let record = flow.complete_from_redirect(redirect_url).await?;
            json!({
                "has_refresh_token": record.refresh_token.is_some(),
                "expires_at": record.expires_at_millis,
            })
        }
        Command::Token => json!({ "access_token": flow.access_token().await? }),
        Command::Headers => {
            let headers = flow.api_headers().await?;
            let map: serde_json::Map<String, Value> = headers
                .iter()
                .map(|(name, value)| {
                    let value = value.to_str().unwrap_or_default();
                    (name.as_str().to_owned(), Value::from(value))
                })
                .collect();
            Value::Object(map)
        }
        Command::Status | Command::Clear => serde_json::to_value(flow.status())?,
    };
    Ok(output)
}
