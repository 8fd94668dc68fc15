// src/cli/ui.rs
use crate::core::align::{SelectorChoice, SharedSelector};
use crate::core::model::Anchor;
use colored::*;
use dialoguer::Select;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Create a progress bar for batch runs
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap(),
    );
    pb
}

/// Interactive anchor selector backed by a terminal prompt.
///
/// Presents up to five candidate pairs with their offsets and confidence;
/// the last two entries map to `Reject` and `Cancel`.
pub fn interactive_selector() -> SharedSelector {
    Arc::new(|candidates: &[Anchor]| {
        let mut items: Vec<String> = candidates
            .iter()
            .map(|a| {
                format!(
                    "events ({}, {})  offset {:+.2}s  confidence {:.2}  [{}]",
                    a.i,
                    a.j,
                    a.offset_ms as f64 / 1000.0,
                    a.confidence,
                    a.method
                )
            })
            .collect();
        items.push("None of these".to_string());
        items.push("Cancel".to_string());

        let picked = Select::new()
            .with_prompt("Pick the anchor pair that lines up the two tracks")
            .items(&items)
            .default(0)
            .interact();

        match picked {
            Ok(idx) if idx < candidates.len() => SelectorChoice::Choose(idx),
            Ok(idx) if idx == candidates.len() => SelectorChoice::Reject,
            _ => SelectorChoice::Cancel,
        }
    })
}
