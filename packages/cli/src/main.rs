mod commands;
mod config;
mod store;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{inspect, new, normalize, schema, InspectArgs, NewArgs, NormalizeArgs, SchemaArgs};

/// Clause CLI - contract template tooling
#[derive(Parser, Debug)]
#[command(name = "clause")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show pages, fields and key collisions of stored templates
    Inspect(InspectArgs),

    /// Print the field schema derived from a template's document
    Schema(SchemaArgs),

    /// Reload and re-save a template, repairing legacy placeholders
    Normalize(NormalizeArgs),

    /// Create a template from the starter page
    New(NewArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Inspect(args) => inspect(args, &cwd),
        Command::Schema(args) => schema(args, &cwd),
        Command::Normalize(args) => normalize(args, &cwd),
        Command::New(args) => new(args, &cwd).await,
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
