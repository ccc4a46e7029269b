//! Walk an OpenAI-backed agent through the chart-generation scenarios.
//!
//! Requires `OPENAI_API_KEY` (a `.env` file is honoured). Set `RUST_LOG=debug` to
//! see tool dispatch and chart output paths.

use clap::Parser;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use vizagent::demo::{self, DemoOptions, RunMode};
use vizagent::prelude::*;

#[derive(Parser)]
#[command(name = "visualization-tools")]
#[command(about = "Create business charts by asking an AI agent", long_about = None)]
#[command(version)]
struct Cli {
    /// Which chart tools the agent gets
    #[arg(long, value_enum, default_value_t = RunMode::default())]
    mode: RunMode,

    /// Model to use for the agent
    #[arg(long, default_value = "gpt-4o")]
    model: String,

    /// Wait for each complete response instead of streaming it
    #[arg(long)]
    no_stream: bool,

    /// Skip the multi-chart dashboard request at the end
    #[arg(long)]
    skip_dashboard: bool,

    /// Directory the chart folders are created under
    #[arg(long, default_value = ".")]
    output_root: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let gateway = Arc::new(OpenAIGateway::new());
    let broker = LlmBroker::new(cli.model, gateway);
    let options = DemoOptions {
        stream: !cli.no_stream,
        skip_dashboard: cli.skip_dashboard,
        output_root: cli.output_root,
    };

    let mut stdout = io::stdout();
    demo::run(cli.mode, &broker, &options, &mut stdout).await?;
    stdout.flush()?;

    Ok(())
}
