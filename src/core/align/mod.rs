//! Bilingual alignment: anchor finding, global shift, and validation.
//!
//! The anchor finder proposes `(i, j)` event pairs between a reference
//! track and a shifted track; the aligner adopts one (automatically or via
//! a selector callback), applies the implied global shift to the shifted
//! track, and validates that the reference track's timing survives into a
//! trial merge.

pub mod aligner;
pub mod anchor;
pub mod similarity;

pub use aligner::{Aligner, AlignerConfig};
pub use anchor::{AnchorConfig, AnchorFinder};

use crate::core::model::Anchor;

/// Anchor-finding strategy selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncStrategy {
    /// Try strategies in order: first_line, scan, translation, semantic.
    #[default]
    Auto,
    /// Pair the first events only.
    FirstLine,
    /// Similarity scan over the opening events.
    Scan,
    /// Translation-assisted scan (requires a translator).
    Translation,
    /// Always defer the choice to the selector callback.
    Manual,
}

impl SyncStrategy {
    /// Parse from a CLI/config name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "auto" => Some(SyncStrategy::Auto),
            "first_line" | "first-line" => Some(SyncStrategy::FirstLine),
            "scan" => Some(SyncStrategy::Scan),
            "translation" => Some(SyncStrategy::Translation),
            "manual" => Some(SyncStrategy::Manual),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStrategy::Auto => "auto",
            SyncStrategy::FirstLine => "first_line",
            SyncStrategy::Scan => "scan",
            SyncStrategy::Translation => "translation",
            SyncStrategy::Manual => "manual",
        }
    }
}

impl std::fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a selector callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorChoice {
    /// Adopt the candidate at this index of the presented slice.
    Choose(usize),
    /// None of the candidates are right; fail with `ManualRequired`.
    Reject,
    /// Abort the alignment entirely.
    Cancel,
}

/// Selector callback: tests inject deterministic closures, the CLI wires
/// an interactive prompt, GUIs wire widgets.
pub type Selector = Box<dyn Fn(&[Anchor]) -> SelectorChoice + Send + Sync>;

/// Shareable selector for callers that retry alignment with the same
/// callback (the orchestrator's ladder re-wraps it per attempt).
pub type SharedSelector = std::sync::Arc<dyn Fn(&[Anchor]) -> SelectorChoice + Send + Sync>;
