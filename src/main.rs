//! Admin console gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                 ADMIN GATEWAY                 │
//!   Console request      │  ┌─────────┐   ┌──────────┐   ┌────────────┐  │
//!   ─────────────────────┼─▶│  http   │──▶│ routing  │──▶│  upstream  │──┼──▶ Backend
//!                        │  │ server  │   │ resolver │   │   client   │  │
//!                        │  └─────────┘   └──────────┘   └─────┬──────┘  │
//!   Console response     │  ┌─────────┐                        │         │
//!   ◀────────────────────┼──│ relay   │◀───────────────────────┘         │
//!                        │  └─────────┘                                  │
//!                        │   config · observability · lifecycle · admin  │
//!                        └───────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use admin_gateway::admin::setup_admin_router;
use admin_gateway::config::loader::{default_config, load_config};
use admin_gateway::config::watcher::ConfigWatcher;
use admin_gateway::lifecycle::signals::wait_for_shutdown_signal;
use admin_gateway::observability::{logging, metrics};
use admin_gateway::{GatewayServer, Shutdown};

#[derive(Parser)]
#[command(name = "admin-gateway")]
#[command(about = "Proxy gateway for the fitness admin console", long_about = None)]
struct Args {
    /// Path to gateway.toml. Built-in defaults are used when omitted.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Reload the config file when it changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => default_config()?,
    };

    logging::init(&config.observability);
    tracing::info!("admin-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backend = config.backend.base_url.as_deref().unwrap_or("<unset>"),
        operations = config.operations.len(),
        request_timeout_secs = config.backend.request_timeout_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // The watcher must outlive the server for reload events to flow.
    let (_watcher, config_updates) = match (&args.config, args.watch) {
        (Some(path), true) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        _ => {
            let (_, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Shutdown::new();
    let listener_config = config.listener.clone();
    let admin_config = config.admin.clone();
    let server = GatewayServer::new(config)?;

    if admin_config.enabled {
        let admin_listener = TcpListener::bind(&admin_config.bind_address).await?;
        tracing::info!(address = %admin_listener.local_addr()?, "Admin API listening");
        let admin_router = setup_admin_router(server.state());
        let mut admin_shutdown = shutdown.subscribe();
        tokio::spawn(async move {
            let result = axum::serve(admin_listener, admin_router)
                .with_graceful_shutdown(async move {
                    let _ = admin_shutdown.recv().await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!(error = %e, "Admin API stopped with error");
            }
        });
    }

    let server_shutdown = shutdown.subscribe();
    let mut server_task = match listener_config.tls {
        Some(tls) => {
            let addr: SocketAddr = listener_config.bind_address.parse()?;
            tokio::spawn(async move {
                server
                    .run_tls(addr, &tls, config_updates, server_shutdown)
                    .await
            })
        }
        None => {
            let listener = TcpListener::bind(&listener_config.bind_address).await?;
            tokio::spawn(async move { server.run(listener, config_updates, server_shutdown).await })
        }
    };

    tokio::select! {
        _ = wait_for_shutdown_signal() => {
            shutdown.trigger();
            server_task.await??;
        }
        result = &mut server_task => {
            // Server exited on its own (e.g. TLS setup failed); stop the rest.
            shutdown.trigger();
            result??;
        }
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
