use super::{collect_documents, load_engine, read_document, resolve_input};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use stylecascade_editor::{Diagnostic, StyleEngine};

#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Document file or directory (defaults to the project's docs directory)
    pub input: Option<PathBuf>,

    /// Style list to use instead of the project's
    #[arg(short, long)]
    pub styles: Option<PathBuf>,

    /// Also list documents without problems
    #[arg(short, long)]
    pub verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

#[derive(Serialize)]
struct FileReport<'a> {
    file: String,
    diagnostics: &'a [Diagnostic],
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let engine = load_engine(&config, cwd, args.styles.as_deref())?;
    let input = resolve_input(args.input, &config, cwd);
    let json = args.format == "json";

    if !json {
        println!("🔍 {} documents", "Checking".green().bold());
        println!("   Input: {}", input.display());
        println!();
    }

    let files = collect_documents(&input, &config)?;
    let mut total_diagnostics = 0;

    for file in &files {
        total_diagnostics += check_file(&engine, file, args.verbose, json)?;
    }

    if !json {
        println!();
        println!(
            "✨ {} Check complete!",
            if total_diagnostics > 0 {
                "Done".red().bold()
            } else {
                "Done".green().bold()
            }
        );
        println!("   Files checked: {}", files.len());
        if total_diagnostics == 0 {
            println!("   {} No issues found!", "✓".green());
        }
    }

    if total_diagnostics > 0 {
        return Err(anyhow::anyhow!("{} problems found", total_diagnostics));
    }

    Ok(())
}

fn check_file(engine: &StyleEngine, file_path: &Path, verbose: bool, json: bool) -> Result<usize> {
    let doc = read_document(file_path)?;
    let diagnostics = engine.check(&doc);

    if json {
        let report = FileReport {
            file: file_path.display().to_string(),
            diagnostics: &diagnostics,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(diagnostics.len());
    }

    if diagnostics.is_empty() {
        if verbose {
            println!("{} {}", "✓".green(), file_path.display());
        }
        return Ok(0);
    }

    println!("{}", file_path.display());
    for diagnostic in &diagnostics {
        let kind = match diagnostic {
            Diagnostic::OutlineGap { .. } => "outline-gap".yellow().bold(),
            Diagnostic::UnknownStyle { .. } => "unknown-style".red().bold(),
        };
        println!("  {} {}", kind, diagnostic);
    }
    println!();

    Ok(diagnostics.len())
}
