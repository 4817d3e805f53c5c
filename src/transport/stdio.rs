//! Stdio transport for the MCP server.
//!
//! This transport uses standard input/output for communication, which is the
//! standard mode for CLI-based MCP integrations. All logging goes to stderr
//! so stdout stays reserved for protocol messages.

use crate::error::DiagResult;
use crate::gate::ExecutionGateway;
use crate::mcp::{DiagService, ToolsetFlags};
use crate::transport::Transport;
use rmcp::{ServiceExt, transport::stdio};
use std::sync::Arc;
use tokio::signal;
use tracing::info;

/// Stdio transport implementation.
///
/// This transport reads JSON-RPC messages from stdin and writes responses to
/// stdout, following the MCP protocol specification.
pub struct StdioTransport {
    gateway: Arc<ExecutionGateway>,
    toolsets: ToolsetFlags,
}

impl StdioTransport {
    /// Create a new stdio transport over the given gateway.
    pub fn new(gateway: Arc<ExecutionGateway>, toolsets: ToolsetFlags) -> Self {
        Self { gateway, toolsets }
    }
}

impl Transport for StdioTransport {
    async fn run(&self) -> DiagResult<()> {
        info!("Starting MCP server with stdio transport");

        let service = DiagService::new(self.gateway.clone(), self.toolsets);

        let transport = stdio();
        let running_service = service.serve(transport).await.map_err(|e| {
            crate::error::DiagError::internal(format!("Failed to start stdio transport: {}", e))
        })?;

        let shutdown_requested = tokio::select! {
            result = running_service.waiting() => {
                match result {
                    Ok(_quit_reason) => {
                        info!("Stdio transport completed normally");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Stdio transport error");
                        return Err(crate::error::DiagError::internal(format!(
                            "Stdio transport error: {}",
                            e
                        )));
                    }
                }
                false
            }
            _ = wait_for_signal() => {
                info!("Shutdown signal received (send again to force exit)");
                true
            }
        };

        if shutdown_requested {
            // Connections are per-request, so there is nothing to drain here;
            // stdio may still be blocking on stdin, which select! cannot
            // interrupt.
            tokio::spawn(async {
                wait_for_signal().await;
                tracing::warn!("Received second signal, forcing immediate exit");
                std::process::exit(1);
            });
            info!("Exiting process");
            std::process::exit(0);
        }

        Ok(())
    }

    fn name(&self) -> &'static str {
        "stdio"
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT");
        }
        _ = terminate => {
            info!("Received SIGTERM");
        }
    }
}
