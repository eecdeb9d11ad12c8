use super::{read_document, resolve};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct RepairArgs {
    /// Saved document to repair
    pub file: PathBuf,

    /// Write the repaired document here instead of in place
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn repair(args: RepairArgs, cwd: &Path) -> Result<()> {
    let input = resolve(cwd, &args.file);
    let output = args
        .output
        .as_deref()
        .map(|p| resolve(cwd, p))
        .unwrap_or_else(|| input.clone());

    println!("🔧 {} {}", "Repairing".green().bold(), input.display());
    let (report, _) = read_document(&input)?;

    if report.repairs.is_empty() && output == input {
        println!("   {} document is already valid", "✓".green());
        return Ok(());
    }
    for repair in &report.repairs {
        println!("   {} {}", "•".yellow(), repair);
    }

    fs::write(&output, report.document.to_json_pretty()?)?;
    println!();
    println!(
        "✨ {} {} repair(s) written to {}",
        "Done".green().bold(),
        report.repairs.len(),
        output.display()
    );
    Ok(())
}
