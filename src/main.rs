//! SQL Server Diagnostics MCP Server - Main entry point.
//!
//! Wires configuration into the execution gateway (server registry, admission
//! control, limits) and runs the selected MCP transport.

use clap::Parser;
use sqldiag_mcp_server::config::{Config, TransportMode};
use sqldiag_mcp_server::db::registry::{ServerEntry, ServerRegistry};
use sqldiag_mcp_server::gate::{AdmissionControl, ExecutionGateway, GatewayLimits};
use sqldiag_mcp_server::mcp::ToolsetFlags;
use sqldiag_mcp_server::transport::{HttpTransport, StdioTransport, Transport};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
///
/// Everything goes to stderr: stdout is reserved for the MCP stdio transport.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse();

    // Initialize logging
    init_tracing(&config);

    // Validate configuration before touching anything else
    if let Err(errors) = config.validate() {
        eprintln!("Error: invalid configuration.");
        for message in &errors {
            eprintln!("  - {}", message);
        }
        eprintln!();
        eprintln!("Usage: sqldiag-mcp-server --server <name>=<connection string>");
        eprintln!();
        eprintln!("Examples:");
        eprintln!(
            "  sqldiag-mcp-server --server 'prod=Server=tcp:db1,1433;User Id=diag;Password=...'"
        );
        eprintln!("  sqldiag-mcp-server --server prod=... --server staging=... \\");
        eprintln!("      --enable-first-responder-kit --enable-who-is-active");
        std::process::exit(1);
    }

    info!(
        transport = %config.transport,
        "Starting SQL Diagnostics MCP Server v{}",
        env!("CARGO_PKG_VERSION")
    );

    for warning in config.startup_warnings() {
        warn!("{}", warning);
    }

    // Build the immutable server registry
    let servers = config
        .parse_servers()?
        .into_iter()
        .map(|s| ServerEntry::new(s.name, s.connection_string));
    let registry = ServerRegistry::new(servers);

    info!(
        count = registry.len(),
        max_concurrent = config.max_concurrent_queries,
        per_minute = config.max_queries_per_minute,
        "Gateway configured"
    );

    // Admission control and gateway, shared by every request
    let admission = AdmissionControl::governed(
        config.max_concurrent_queries,
        config.max_queries_per_minute,
    );
    let gateway = Arc::new(ExecutionGateway::new(
        registry,
        admission,
        GatewayLimits {
            command_timeout: config.command_timeout_duration(),
            connect_timeout: config.connect_timeout_duration(),
            max_rows: config.max_rows,
        },
    ));

    let toolsets = ToolsetFlags {
        first_responder_kit: config.enable_first_responder_kit,
        darling_data: config.enable_darling_data,
        who_is_active: config.enable_who_is_active,
    };

    if !toolsets.first_responder_kit && !toolsets.darling_data && !toolsets.who_is_active {
        warn!(
            "No diagnostic toolset enabled; only list_servers, list_databases and read_data are usable"
        );
    }

    // Run the appropriate transport
    let result = match config.transport {
        TransportMode::Stdio => {
            info!("Using stdio transport");
            let transport = StdioTransport::new(gateway, toolsets);
            transport.run().await
        }
        TransportMode::Http => {
            info!(
                host = %config.http_host,
                port = config.http_port,
                endpoint = %config.mcp_endpoint,
                "Using HTTP transport"
            );
            let transport = HttpTransport::new(
                gateway,
                toolsets,
                &config.http_host,
                config.http_port,
                &config.mcp_endpoint,
            );
            transport.run().await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
