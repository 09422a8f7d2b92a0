use anyhow::Result;
use colored::*;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets::UTF8_FULL};
use maid_core::{AppError, IncludedKind, ScanReport};
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Where the document goes: a buffered file, created with its parent
/// directories, or standard output.
pub fn open_destination(path: Option<&Path>) -> Result<Box<dyn Write>> {
    let Some(path) = path else {
        return Ok(Box::new(BufWriter::new(io::stdout().lock())));
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| AppError::FileWrite {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    let file = File::create(path).map_err(|e| AppError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })?;
    log::debug!("Opened output file: {}", path.display());
    Ok(Box::new(BufWriter::new(file)))
}

/// Non-fatal problems collected during the walk.
pub fn print_warnings(errors: &[AppError]) {
    if errors.is_empty() {
        return;
    }
    eprintln!(
        "\n{} {} path(s) could not be processed:",
        "Warning:".yellow().bold(),
        errors.len()
    );
    for error in errors {
        eprintln!("  {} {}", "-".yellow(), error);
    }
}

pub fn print_included_table(report: &ScanReport) {
    if report.included.is_empty() {
        eprintln!("\n{}", "(No files included)".yellow());
        return;
    }
    eprintln!("\n{}", " Included Files ".green().bold().underline());
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Path").fg(Color::Green),
        Cell::new("Kind").fg(Color::Green),
        Cell::new("Lines").fg(Color::Green),
        Cell::new("Removed").fg(Color::Green),
        Cell::new("Rules").fg(Color::Green),
    ]);
    for file in &report.included {
        let path = Cell::new(file.path.display()).fg(Color::Cyan);
        let row = match &file.kind {
            IncludedKind::Text {
                lines,
                removed,
                rules,
            } => vec![
                path,
                Cell::new("text"),
                Cell::new(lines).set_alignment(comfy_table::CellAlignment::Right),
                Cell::new(removed).set_alignment(comfy_table::CellAlignment::Right),
                Cell::new(rules.join(", ")).fg(Color::DarkGrey),
            ],
            IncludedKind::Binary { size } => vec![
                path,
                Cell::new("binary").fg(Color::DarkGrey),
                Cell::new(format!("{size} bytes"))
                    .set_alignment(comfy_table::CellAlignment::Right)
                    .fg(Color::DarkGrey),
                Cell::new(""),
                Cell::new(""),
            ],
        };
        table.add_row(row);
    }
    eprintln!("{table}");
}

pub fn print_summary(report: &ScanReport, output: Option<&Path>) {
    let removed: usize = report
        .included
        .iter()
        .map(|f| match f.kind {
            IncludedKind::Text { removed, .. } => removed,
            IncludedKind::Binary { .. } => 0,
        })
        .sum();
    eprintln!(
        "{:<16} {}",
        "Included:".green(),
        report.included.len().to_string().cyan()
    );
    eprintln!(
        "{:<16} {}",
        "Skipped:".green(),
        report.skipped.len().to_string().cyan()
    );
    eprintln!("{:<16} {}", "Lines removed:".green(), removed.to_string().cyan());
    if let Some(path) = output {
        println!(
            "{} Markdown file created: {}",
            "✅".green(),
            path.display().to_string().blue()
        );
    }
}
