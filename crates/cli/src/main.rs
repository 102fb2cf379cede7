//! Windlass CLI: the main entry point.
//!
//! Commands:
//! - `onboard` writes a starter config file
//! - `serve`   starts the HTTP gateway
//! - `ask`     runs one workflow request from the terminal
//! - `tools`   lists the registered tools
//! - `doctor`  diagnoses config and reasoner health

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "windlass",
    about = "Windlass: multi-step reasoning workflow engine",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter configuration file
    Onboard,

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask a single question and stream the answer
    Ask {
        /// The question text
        question: String,

        /// Pin the business area instead of classifying (general, finance,
        /// law, marketing, management)
        #[arg(short, long)]
        tag: Option<String>,

        /// Workflow mode: fast, thinking, research, or auto
        #[arg(short, long, default_value = "auto")]
        mode: String,
    },

    /// List the registered tools
    Tools,

    /// Diagnose configuration and reasoner health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask {
            question,
            tag,
            mode,
        } => commands::ask::run(question, tag, mode).await?,
        Commands::Tools => commands::tools::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
