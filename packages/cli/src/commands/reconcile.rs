use super::{collect_documents, load_engine, read_document, resolve_input, write_document};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use tracing::debug;

#[derive(Args, Debug)]
pub struct ReconcileArgs {
    /// Document file or directory (defaults to the project's docs directory)
    pub input: Option<PathBuf>,

    /// Style list to use instead of the project's
    #[arg(short, long)]
    pub styles: Option<PathBuf>,

    /// Report documents that are out of date without rewriting them
    #[arg(long)]
    pub check: bool,
}

pub fn reconcile(args: ReconcileArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let engine = load_engine(&config, cwd, args.styles.as_deref())?;
    let input = resolve_input(args.input, &config, cwd);

    println!("🔄 {} styles", "Reconciling".green().bold());
    println!("   Input: {}", input.display());
    println!();

    let files = collect_documents(&input, &config)?;
    let mut outdated = 0;

    for file in &files {
        let doc = read_document(file)?;
        let (reconciled, batch) = engine.reconcile(&doc)?;
        debug!(file = %file.display(), steps = batch.steps.len(), "Reconciled document");

        if batch.is_empty() {
            println!("   {} {}", "✓".green(), file.display());
            continue;
        }
        outdated += 1;

        if args.check {
            println!(
                "   {} {} ({} corrections)",
                "✗".red(),
                file.display(),
                batch.steps.len()
            );
        } else {
            write_document(file, &reconciled)?;
            println!(
                "   {} {} ({} corrections)",
                "✎".yellow(),
                file.display(),
                batch.steps.len()
            );
        }
    }

    println!();
    println!("✨ {} {} documents", "Done".green().bold(), files.len());

    if args.check && outdated > 0 {
        return Err(anyhow::anyhow!("{} documents are out of date", outdated));
    }

    Ok(())
}
