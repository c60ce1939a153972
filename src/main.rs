//! Entry point for the GDB MCP gateway.
//!
//! Initializes tracing (to stderr, so it doesn't interfere with MCP stdio
//! transport), handles `--version`/`--license`, creates the server, serves
//! on stdin/stdout, and terminates every live GDB subprocess on SIGINT or
//! SIGTERM. Grounded on `main.c`'s option handling and signal registration
//! in the original implementation.

use anyhow::Result;
use clap::Parser;
use gdb_mcp_server::cli::Cli;
use gdb_mcp_server::server::GdbMcpServer;
use rmcp::{transport::stdio, ServiceExt};
use tracing_subscriber::EnvFilter;

const DEFAULT_GDB_PATH: &str = "gdb";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            eprint!("{e}");
            std::process::exit(1);
        }
    };

    if cli.version {
        println!("{}", Cli::version_text());
        return Ok(());
    }
    if cli.license {
        println!("{}", Cli::license_text());
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    tracing::info!("starting gdb-mcp-server v{}", env!("CARGO_PKG_VERSION"));

    let gdb_path = cli.gdb_path.unwrap_or_else(|| DEFAULT_GDB_PATH.to_string());
    let server = GdbMcpServer::new(gdb_path);

    let service = server.clone().serve(stdio()).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    tokio::select! {
        result = service.waiting() => {
            result?;
            tracing::info!("gdb-mcp-server shut down");
        }
        () = wait_for_shutdown_signal() => {
            tracing::info!("shutdown signal received, terminating sessions");
            server.shutdown().await;
        }
    }

    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        signal.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
