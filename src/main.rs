use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use secretdrop::cli;
use secretdrop::config::{self, Config};
use secretdrop::store::{FileStore, SecretStore};
use secretdrop::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let log = config::log_settings();
    let filter = tracing_subscriber::EnvFilter::new(&log.filter);
    let (json_layer, text_layer) = if log.json {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    let args = cli::Cli::parse();
    let cfg = config::load()?;

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Secret { command }) => handle_secret_command(command, &cfg).await,
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn open_store(cfg: &Config) -> anyhow::Result<FileStore> {
    FileStore::open(&cfg.data_file_path, cfg.digest)
        .await
        .with_context(|| {
            format!(
                "failed to open secrets file {}",
                cfg.data_file_path.display()
            )
        })
}

async fn run_server(cfg: Config, port: u16) -> anyhow::Result<()> {
    tracing::info!("Opening secrets file {}...", cfg.data_file_path.display());
    let store = open_store(&cfg).await?;
    tracing::info!(digest = %store.digest(), "Secret store ready");

    let state = Arc::new(AppState {
        store: Arc::new(store),
        config: cfg,
    });
    let app = secretdrop::api::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("secretdrop listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("secretdrop stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received");
}

async fn handle_secret_command(cmd: cli::SecretCommands, cfg: &Config) -> anyhow::Result<()> {
    let store = open_store(cfg).await?;
    match cmd {
        cli::SecretCommands::Save { plain_text } => {
            let id = store.save(&plain_text).await?;
            println!("{}", id);
        }
        cli::SecretCommands::Consume { id } => match store.consume(&id).await? {
            Some(value) => println!("{}", value),
            None => anyhow::bail!("secret not found"),
        },
    }
    Ok(())
}
