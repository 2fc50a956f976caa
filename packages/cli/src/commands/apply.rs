use super::{load_engine, read_document, write_document};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Document file to restyle
    pub input: PathBuf,

    /// Style to apply ("None" clears the paragraph style)
    #[arg(short = 'n', long)]
    pub style: String,

    /// Block index of the first paragraph to style
    #[arg(long, default_value_t = 0)]
    pub from: usize,

    /// Block index of the last paragraph to style (defaults to `from`)
    #[arg(long)]
    pub to: Option<usize>,

    /// Style list to use instead of the project's
    #[arg(short, long)]
    pub styles: Option<PathBuf>,

    /// Write the result here instead of over the input
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn apply(args: ApplyArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let engine = load_engine(&config, cwd, args.styles.as_deref())?;
    let doc = read_document(&args.input)?;

    let last = args.to.unwrap_or(args.from);
    if args.from > last || last >= doc.blocks.len() {
        return Err(anyhow::anyhow!(
            "Block range {}..={} is outside the document ({} blocks)",
            args.from,
            last,
            doc.blocks.len()
        ));
    }

    // Block indices to positions spanning their content
    let from = doc.content_range(args.from).start;
    let to = doc.content_range(last).end;
    let (styled, batch) = engine.apply_style(&doc, &args.style, from, to)?;

    let output = args.output.unwrap_or(args.input);
    write_document(&output, &styled)?;

    println!(
        "{} Applied {} to blocks {}..={} ({} steps)",
        "✓".green(),
        args.style.bold(),
        args.from,
        last,
        batch.steps.len()
    );
    println!("   Output: {}", output.display());

    Ok(())
}
