//! # Authorization check CLI
//!
//! Loads a gateway authorization config, seeds the in-memory directory and
//! evaluates one protected action for a set of claims.
//!
//! ```bash
//! authz-check --config authz.toml \
//!     --claims '{"groups": ["Base"]}' \
//!     --object-type tools --source github --object-name create_issue
//!
//! # claims from a file
//! authz-check -c authz.toml --claims @claims.json -t tools -s github -n search
//! ```
//!
//! Exit status: 0 allowed, 1 denied, 2 usage or configuration error.
//!
//! Environment variables:
//! - `MCPGATE_CONFIG` - configuration file
//! - `RUST_LOG` - log filter (overrides `--log-level` and the file setting)
//! - `MCPGATE_JSON_LOGS` - JSON log output

use anyhow::{Context, Result};
use clap::Parser;
use mcpgate_authz::{AuthorizationRequest, AuthzConfig, ClaimSet, PermissionDecider};
use serde::Serialize;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Evaluate one authorization decision
#[derive(Parser, Debug)]
#[command(
    name = "authz-check",
    version,
    about = "Evaluate an MCP gateway authorization decision",
    long_about = None
)]
struct Args {
    /// Configuration file (TOML)
    #[arg(short = 'c', long, env = "MCPGATE_CONFIG")]
    config: PathBuf,

    /// Claims as a JSON object, or @path to a JSON file
    #[arg(long)]
    claims: String,

    /// Object type (e.g. tools)
    #[arg(short = 't', long, default_value = "tools")]
    object_type: String,

    /// Source (proxy) name
    #[arg(short = 's', long)]
    source: String,

    /// Object (tool) name
    #[arg(short = 'n', long)]
    object_name: String,

    /// Log level (trace, debug, info, warn, error); defaults to the config file
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Enable JSON logging format
    #[arg(long, env = "MCPGATE_JSON_LOGS")]
    json_logs: bool,
}

#[derive(Debug, Serialize)]
struct CheckOutput<'a> {
    allowed: bool,
    object_type: &'a str,
    source: &'a str,
    object_name: &'a str,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    match run(&args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            error!("{:#}", e);
            eprintln!("authz-check: {:#}", e);
            ExitCode::from(2)
        }
    }
}

async fn run(args: &Args) -> Result<bool> {
    let config = AuthzConfig::load(&args.config)
        .with_context(|| format!("loading config {}", args.config.display()))?;

    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, args.json_logs || config.logging.json);

    let claims = read_claims(&args.claims)?;

    let store = config
        .build_store()
        .await
        .context("seeding directory from config")?;
    let decider = PermissionDecider::new(config.engine_config(), Arc::new(store))
        .context("building permission decider")?;

    let request = AuthorizationRequest::new(&args.object_type, &args.source, &args.object_name);
    let allowed = decider.verify_request(&claims, &request).await;
    info!(request = %request, allowed, "authorization checked");

    let output = CheckOutput {
        allowed,
        object_type: &request.object_type,
        source: &request.source_id,
        object_name: &request.object_name,
    };
    println!("{}", serde_json::to_string(&output)?);

    Ok(allowed)
}

/// Parse `--claims`: inline JSON or `@file`
fn read_claims(arg: &str) -> Result<ClaimSet> {
    let text = match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("reading claims file {}", path))?,
        None => arg.to_string(),
    };

    ClaimSet::from_json_str(&text).context("parsing claims")
}

/// Initialize tracing/logging subsystem
fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("mcpgate_authz={},authz_check={}", level, level).into());

    // logs go to stderr; stdout carries the decision
    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parsing() {
        let args = Args::parse_from(vec![
            "authz-check",
            "--config",
            "authz.toml",
            "--claims",
            r#"{"groups":["Base"]}"#,
            "-s",
            "github",
            "-n",
            "search",
        ]);

        assert_eq!(args.config, PathBuf::from("authz.toml"));
        assert_eq!(args.object_type, "tools");
        assert_eq!(args.source, "github");
        assert_eq!(args.object_name, "search");
        assert!(args.log_level.is_none());
    }

    #[test]
    fn test_read_inline_claims() {
        let claims = read_claims(r#"{"groups": ["Base"], "email_verified": true}"#).unwrap();
        assert_eq!(claims.len(), 2);
        assert!(read_claims("[1, 2]").is_err());
    }

    #[test]
    fn test_read_claims_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("claims.json");
        std::fs::write(&path, r#"{"sub": "alice"}"#).unwrap();

        let claims = read_claims(&format!("@{}", path.display())).unwrap();
        assert_eq!(claims.len(), 1);
        assert!(read_claims("@/no/such/claims.json").is_err());
    }
}
