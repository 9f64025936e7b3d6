//! mu - resumable photo and video upload client
//!
//! Thin front-end over mu-core: inspects media, previews upload
//! parameters, and drives legacy or resumable uploads.

mod commands;
mod exit_code;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::commands::Commands;
use crate::output::OutputConfig;

/// Resumable photo and video upload client
#[derive(Parser, Debug)]
#[command(name = "mu", version, about, long_about = None)]
pub struct Cli {
    /// Output strict JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Only print errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

fn init_tracing(debug: bool) {
    let default = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let output_config = OutputConfig {
        json: cli.json,
        no_color: cli.no_color,
        quiet: cli.quiet,
    };

    let code = commands::execute(cli.command, output_config).await;
    std::process::exit(code.code());
}
