mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{apply, check, outline, reconcile, ApplyArgs, CheckArgs, OutlineArgs, ReconcileArgs};
use tracing_subscriber::EnvFilter;

/// Stylecascade CLI - named paragraph styles for JSON documents
#[derive(Parser, Debug)]
#[command(name = "stylecascade")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-derive paragraph formatting from the styles each paragraph names
    Reconcile(ReconcileArgs),

    /// Apply a style to a range of paragraphs
    Apply(ApplyArgs),

    /// Print outline numbering labels
    Outline(OutlineArgs),

    /// Report outline gaps and unknown style names
    Check(CheckArgs),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cwd = match std::env::current_dir() {
        Ok(dir) => dir.display().to_string(),
        Err(err) => {
            eprintln!("{} Cannot get current directory: {}", "Error:".red().bold(), err);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Reconcile(args) => reconcile(args, &cwd),
        Command::Apply(args) => apply(args, &cwd),
        Command::Outline(args) => outline(args, &cwd),
        Command::Check(args) => check(args, &cwd),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
