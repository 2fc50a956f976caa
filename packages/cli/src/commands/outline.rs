use super::{read_document, write_document};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;
use stylecascade_editor::render_outline;

#[derive(Args, Debug)]
pub struct OutlineArgs {
    /// Document file to number
    pub input: PathBuf,

    /// Persist the counter reset flags into the document
    #[arg(short, long)]
    pub write: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    pub format: String,
}

pub fn outline(args: OutlineArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let mut doc = read_document(&args.input)?;

    let outline = render_outline(&doc, &config.engine);
    let step = outline.flags_step(&doc);

    if args.format == "json" {
        println!("{}", serde_json::to_string_pretty(&outline)?);
    } else {
        println!("{}", args.input.display());
        for entry in &outline.entries {
            let indent = "  ".repeat(entry.level as usize);
            match &entry.label {
                Some(label) => println!(
                    "{}{} {}",
                    indent,
                    label.bold(),
                    doc.blocks[entry.index].text()
                ),
                None => println!("{}{}", indent, "(placeholder)".dimmed()),
            }
        }
        println!();
    }

    if args.write {
        match step {
            Some(step) => {
                step.apply(&mut doc)?;
                write_document(&args.input, &doc)?;
                println!("{} Counter flags updated", "✓".green());
            }
            None => println!("{} Counter flags already current", "✓".green()),
        }
    }

    Ok(())
}
