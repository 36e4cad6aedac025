//! GateLink daemon — entry point for running the verification-link service.

use clap::Parser;
use gatelink_service::{init_logging, GateService, LogFormat, ServiceConfig};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "gatelink-daemon", about = "GateLink verification-link service")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings are
    /// used as the base; CLI flags and env vars override them.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Address to bind the HTTP server on.
    #[arg(long, env = "GATELINK_BIND_ADDR")]
    bind_addr: Option<String>,

    /// HTTP server port.
    #[arg(long, env = "GATELINK_HTTP_PORT")]
    port: Option<u16>,

    /// Public base URL used when building verification links.
    #[arg(long, env = "GATELINK_PUBLIC_URL")]
    public_url: Option<String>,

    /// Base URL of the address classification endpoint.
    #[arg(long, env = "GATELINK_REPUTATION_ENDPOINT")]
    reputation_endpoint: Option<String>,

    /// Webhook URL for verification audit events.
    #[arg(long, env = "GATELINK_AUDIT_WEBHOOK_URL")]
    audit_webhook_url: Option<String>,

    /// Endpoint of the downstream grant mechanism.
    #[arg(long, env = "GATELINK_GRANT_ENDPOINT")]
    grant_endpoint: Option<String>,

    /// Token time-to-live in seconds.
    #[arg(long, env = "GATELINK_TOKEN_TTL_SECS")]
    token_ttl_secs: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, env = "GATELINK_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "GATELINK_LOG_LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = if let Some(ref path) = cli.config {
        match ServiceConfig::from_toml_file(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                eprintln!("failed to load config file: {e}");
                std::process::exit(2);
            }
        }
    } else {
        ServiceConfig::default()
    };

    if let Some(bind_addr) = cli.bind_addr {
        config.bind_addr = bind_addr;
    }
    if let Some(port) = cli.port {
        config.http_port = port;
    }
    if let Some(public_url) = cli.public_url {
        config.public_url = public_url;
    }
    if let Some(endpoint) = cli.reputation_endpoint {
        config.reputation_endpoint = endpoint;
    }
    if let Some(url) = cli.audit_webhook_url {
        config.audit_webhook_url = Some(url);
    }
    if let Some(endpoint) = cli.grant_endpoint {
        config.grant_endpoint = Some(endpoint);
    }
    if let Some(ttl) = cli.token_ttl_secs {
        config.token_ttl_secs = ttl;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }

    init_logging(
        LogFormat::from_config(&config.log_format),
        &config.log_level,
    );

    if config.grant_endpoint.is_none() {
        tracing::warn!("no grant endpoint configured, grants will be logged and dropped");
    }

    let service = GateService::start(config).await?;
    service.wait_for_signal().await;

    tracing::info!("shutdown signal received, stopping service");
    service.stop().await;
    tracing::info!("gatelink daemon exited cleanly");

    Ok(())
}
