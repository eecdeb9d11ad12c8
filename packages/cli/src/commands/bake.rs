use super::{read_document, resolve};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use freeform_editor::{Document, EditorConfig, ViewportMode};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Args, Debug)]
pub struct BakeArgs {
    /// Saved document to bake
    pub file: PathBuf,

    /// Viewport to bake (tablet, mobile)
    #[arg(short, long, default_value = "mobile")]
    pub viewport: String,

    /// Write the baked document here instead of in place
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn bake(args: BakeArgs, cwd: &Path) -> Result<()> {
    let viewport: ViewportMode = args.viewport.parse().map_err(anyhow::Error::msg)?;
    if viewport == ViewportMode::Desktop {
        return Err(anyhow::anyhow!(
            "Desktop geometry is the base and is never baked. Use: tablet or mobile"
        ));
    }

    let config = EditorConfig::load(cwd)?;
    let input = resolve(cwd, &args.file);
    let output = args
        .output
        .as_deref()
        .map(|p| resolve(cwd, p))
        .unwrap_or_else(|| input.clone());

    let (report, ids) = read_document(&input)?;
    debug!(repairs = report.repairs.len(), "loaded document for baking");

    let mut document = Document::from_saved(report.document, ids).with_config(&config);
    let width = config.breakpoints.width(viewport);
    let baked = document.generate_breakpoint_positions(viewport, width);

    fs::write(&output, document.to_saved().to_json_pretty()?)?;
    println!(
        "✨ {} baked {} element(s) at {} ({}px) → {}",
        "Done".green().bold(),
        baked,
        viewport,
        width,
        output.display()
    );
    Ok(())
}
