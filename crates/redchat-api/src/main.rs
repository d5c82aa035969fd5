//! redchat entry point.
//!
//! Binary name: `redchat`
//!
//! Parses CLI arguments, loads configuration, then dispatches to the
//! requested command or starts the HTTP server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use redchat_infra::config::{CONFIG_FILE, apply_env_overrides, load_config, resolve_data_dir};
use redchat_observe::tracing_setup::{filter_for_verbosity, init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(filter_for_verbosity(cli.verbose, cli.quiet), cli.otel)
        .map_err(|e| anyhow::anyhow!(e))?;

    // Shell completions don't need configuration
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "redchat", &mut std::io::stdout());
        return Ok(());
    }

    let data_dir = resolve_data_dir();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| data_dir.join(CONFIG_FILE));
    let mut config = load_config(&config_path).await;
    apply_env_overrides(&mut config, |k| std::env::var(k).ok());

    let result = match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }

            let state = AppState::init(&config, &data_dir).await?;
            let db_pool = state.db_pool.clone();

            let addr = format!("{}:{}", config.server.host, config.server.port);
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            println!(
                "  {} redchat listening on {}",
                console::style("⚡").bold(),
                console::style(format!("http://{addr}")).cyan()
            );
            println!("  {}", console::style("Press Ctrl+C to stop").dim());
            tracing::info!(%addr, provider = %config.llm.provider, model = %config.llm.model, "server started");

            let router = http::router::build_router(state);
            let served = axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await;

            if let Some(pool) = db_pool {
                pool.close().await;
            }
            println!("\n  Server stopped.");
            served.map_err(anyhow::Error::from)
        }

        Commands::Config => cli::config::show_config(&config, &config_path, &data_dir),

        Commands::Check => cli::check::check_provider(&config).await,

        Commands::Completions { .. } => unreachable!("handled above"),
    };

    shutdown_tracing();
    result
}

/// Wait for Ctrl+C or SIGTERM for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
