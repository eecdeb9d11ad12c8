use anyhow::Result;
use clap::Args;
use colored::Colorize;
use freeform_editor::{Document, EditorConfig, IdGenerator, DEFAULT_CONFIG_NAME};
use std::fs;
use std::path::Path;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Starter document file name
    #[arg(short, long, default_value = "site.json")]
    pub document: String,

    /// Force overwrite existing files
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &Path) -> Result<()> {
    let config_path = cwd.join(DEFAULT_CONFIG_NAME);

    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing FreeForm site...".bright_blue().bold());

    let config = EditorConfig::default();
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    let document_path = cwd.join(&args.document);
    if !document_path.exists() || args.force {
        let document = Document::new(IdGenerator::new(&args.document)).with_config(&config);
        fs::write(&document_path, document.to_saved().to_json_pretty()?)?;
        println!("  {} Created {}", "✓".green(), args.document);
    }

    println!();
    println!("{}", "✅ Site initialized!".green().bold());
    println!();
    println!("Next steps:");
    println!("  1. Open {} in the editor", args.document);
    println!("  2. Run: freeform inspect {}", args.document);

    Ok(())
}
