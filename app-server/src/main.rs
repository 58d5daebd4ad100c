use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use cdp_app_server::chat_handler::ChatRequest;
use cdp_app_server::{AppConfig, build_handler, build_router, logging, scrape_corpus, server};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

#[derive(Debug, Parser)]
#[command(name = "cdp-assistant", version, about = "Support assistant for CDP documentation")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve POST /api/chat.
    Serve {
        /// Overrides server.port.
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Answer one question and print the JSON response.
    Ask { question: String },
    /// Print the classification of a question as JSON.
    Classify { question: String },
    /// Download product documentation into the corpus directories.
    Scrape {
        /// Only this product's site.
        #[arg(short, long)]
        product: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_level);

    let mut config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.server.port = port;
            }
            let handler = Arc::new(build_handler(&config).await?);

            let bind_addr = config.server.bind_addr();
            let listener = TcpListener::bind(&bind_addr)
                .await
                .with_context(|| format!("Failed to bind to {bind_addr}"))?;
            tracing::info!("Listening on {}", listener.local_addr()?);

            axum::serve(listener, server::router(handler))
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await
                .context("Server error")?;
        }
        Command::Ask { question } => {
            let handler = build_handler(&config).await?;
            let response = handler.chat(ChatRequest { question }).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        Command::Classify { question } => {
            let router = build_router(&config)?;
            let classification = router.classify(&question);
            println!("{}", serde_json::to_string_pretty(&classification)?);
        }
        Command::Scrape { product } => {
            let reports = scrape_corpus(&config, product.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
    }

    Ok(())
}
