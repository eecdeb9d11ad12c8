use super::{read_document, resolve};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use freeform_editor::{SavedDocument, ViewportMode, DEFAULT_CONFIG_NAME};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Saved document or directory of documents
    pub input: PathBuf,

    /// Print a JSON summary instead of text
    #[arg(long)]
    pub json: bool,
}

/// Per-document summary
#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub path: String,
    pub pages: Vec<PageSummary>,
    pub elements: usize,
    /// Elements with stored geometry per viewport
    pub tablet_overrides: usize,
    pub mobile_overrides: usize,
    pub repairs: Vec<String>,
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageSummary {
    pub title: String,
    pub slug: String,
    pub sections: usize,
    pub widget_sections: usize,
    pub elements: usize,
}

pub fn summarize(path: &str, document: &SavedDocument, repairs: Vec<String>) -> DocumentSummary {
    let pages = document
        .pages
        .iter()
        .map(|page| PageSummary {
            title: page.title.clone(),
            slug: page.slug.clone(),
            sections: page.sections.len(),
            widget_sections: page.sections.iter().filter(|s| !s.kind.is_blank()).count(),
            elements: page.sections.iter().map(|s| s.element_ids().len()).sum(),
        })
        .collect();

    let overrides = |mode| {
        document
            .elements
            .iter()
            .filter(|e| e.breakpoints.contains(mode))
            .count()
    };

    DocumentSummary {
        path: path.to_string(),
        pages,
        elements: document.elements.len(),
        tablet_overrides: overrides(ViewportMode::Tablet),
        mobile_overrides: overrides(ViewportMode::Mobile),
        repairs,
    }
}

fn find_documents(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("json"))
        .filter(|e| e.file_name() != DEFAULT_CONFIG_NAME)
        .map(|e| e.path().to_path_buf())
        .collect()
}

pub fn inspect(args: InspectArgs, cwd: &Path) -> Result<()> {
    let input = resolve(cwd, &args.input);
    let files = if input.is_file() {
        vec![input]
    } else if input.is_dir() {
        find_documents(&input)
    } else {
        return Err(anyhow::anyhow!(
            "Input path does not exist: {}",
            args.input.display()
        ));
    };

    let mut summaries = Vec::new();
    for file in &files {
        let (report, _) = read_document(file)?;
        let repairs = report.repairs.iter().map(ToString::to_string).collect();
        summaries.push(summarize(&file.display().to_string(), &report.document, repairs));
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    for summary in &summaries {
        print_summary(summary);
    }
    println!(
        "✨ {} {} document(s) inspected",
        "Done".green().bold(),
        summaries.len()
    );
    Ok(())
}

fn print_summary(summary: &DocumentSummary) {
    println!("📄 {}", summary.path.bright_white().bold());
    for page in &summary.pages {
        println!(
            "   {} {} (/{}) - {} section(s), {} widget(s), {} element(s)",
            "•".cyan(),
            page.title,
            page.slug,
            page.sections,
            page.widget_sections,
            page.elements
        );
    }
    println!(
        "   Elements: {}  tablet overrides: {}  mobile overrides: {}",
        summary.elements, summary.tablet_overrides, summary.mobile_overrides
    );

    if summary.repairs.is_empty() {
        println!("   {} no repairs needed", "✓".green());
    } else {
        for repair in &summary.repairs {
            println!("   {} {}", "⚠".yellow(), repair);
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use freeform_editor::{
        AddElementOptions, Document, ElementType, IdGenerator, SectionKind,
    };

    #[test]
    fn test_summary_counts() {
        let mut doc = Document::new(IdGenerator::from_seed("inspect"));
        doc.add_section(0, SectionKind::MenuWidget, None).unwrap();
        doc.add_element(
            ElementType::Heading,
            0.0,
            0.0,
            ViewportMode::Desktop,
            1200.0,
            600.0,
            AddElementOptions::default(),
        )
        .unwrap();
        doc.generate_breakpoint_positions(ViewportMode::Tablet, 768.0);

        let summary = summarize("site.json", &doc.to_saved(), Vec::new());
        assert_eq!(summary.elements, 1);
        assert_eq!(summary.tablet_overrides, 1);
        assert_eq!(summary.mobile_overrides, 0);
        assert_eq!(
            summary.pages,
            vec![PageSummary {
                title: "Home".to_string(),
                slug: "home".to_string(),
                sections: 2,
                widget_sections: 1,
                elements: 1,
            }]
        );
    }

    #[test]
    fn test_directory_scan_skips_config() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_NAME), "{}").unwrap();
        std::fs::write(dir.path().join("a.json"), "{}").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "").unwrap();

        let found = find_documents(dir.path());
        assert_eq!(found, vec![dir.path().join("a.json")]);
    }
}
