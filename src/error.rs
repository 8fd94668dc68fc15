//! Error types for the bisub CLI application.
//!
//! This module defines the `BisubError` enum covering all error conditions
//! that can occur during subtitle parsing, track selection, bilingual
//! alignment, merging, and collaborator invocation, plus helper methods to
//! construct errors and generate user-friendly messages.
use std::path::PathBuf;
use thiserror::Error;

/// Represents all possible errors in the bisub application.
///
/// Each variant provides specific context to facilitate debugging and
/// user-friendly reporting.
///
/// # Examples
///
/// ```rust
/// use bisub_cli::error::{BisubError, BisubResult};
///
/// fn example() -> BisubResult<()> {
///     Err(BisubError::SubtitleFormat {
///         format: "SRT".to_string(),
///         message: "Invalid timestamp format".to_string(),
///     })
/// }
/// ```
///
/// # Exit Codes
///
/// Each error variant maps to an exit code via `BisubError::exit_code`.
#[derive(Error, Debug)]
pub enum BisubError {
    /// I/O operation failed during file system access.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error due to invalid or missing settings.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error
        message: String,
    },

    /// Subtitle format error indicating invalid timestamps or structure.
    #[error("Subtitle format error [{format}]: {message}")]
    SubtitleFormat {
        /// The subtitle format that caused the error (e.g., "SRT", "ASS")
        format: String,
        /// Detailed error message describing the issue
        message: String,
    },

    /// Text decoding failed even after encoding-detection retries.
    #[error("Encoding error: {message}")]
    Encoding {
        /// Description of the decode failure
        message: String,
    },

    /// The video container exposes no text or image subtitle tracks.
    #[error("No subtitle tracks found in: {0}")]
    NoSubtitleTracks(PathBuf),

    /// No candidate track reached the scorer's acceptance threshold.
    ///
    /// The caller may fall back to OCR, supply an explicit track override,
    /// or abort with this as the user-visible reason.
    #[error("No acceptable {language} subtitle track among {candidates} candidates")]
    NoAcceptableCandidate {
        /// The target language that could not be satisfied
        language: String,
        /// Number of candidate tracks that were scored
        candidates: usize,
    },

    /// Bilingual alignment failed; the reason is discriminated so the
    /// orchestrator can decide whether a retry strategy remains.
    #[error("Alignment failed: {0}")]
    Alignment(#[from] AlignmentFailure),

    /// Translation collaborator error (timeout, quota, transport).
    #[error("Translation service error: {0}")]
    Translation(String),

    /// Container-extraction collaborator error (ffprobe/ffmpeg failure or
    /// deadline exceeded).
    #[error("Container extraction error: {0}")]
    Container(String),

    /// OCR collaborator error.
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Writing the merged output failed; no partial file survives.
    #[error("Output write failed for {path}: {message}")]
    OutputWrite {
        /// The intended output path
        path: PathBuf,
        /// Description of the temp-write or rename failure
        message: String,
    },

    /// Indicates that the specified file was not found.
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Unsupported file type encountered.
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The job was cancelled by the caller.
    #[error("Operation cancelled")]
    Cancelled,

    /// Generic command execution error.
    #[error("{0}")]
    CommandExecution(String),

    /// Catch-all error variant wrapping any other failure.
    #[error("Unknown error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Distinct alignment failure reasons.
///
/// The orchestrator pattern-matches on these to decide retries: a low
/// confidence result may be retried with translation enabled, but a
/// cancelled selection never is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AlignmentFailure {
    /// The anchor finder produced no candidates at all.
    #[error("no anchor candidates between the two tracks")]
    NoAnchorCandidates,

    /// The best candidate's confidence is below the configured threshold.
    #[error("best anchor confidence {best:.2} below threshold {required:.2}")]
    ConfidenceTooLow {
        /// Confidence of the best candidate found
        best: f32,
        /// The configured minimum confidence
        required: f32,
    },

    /// The implied shift exceeds 5 s and large offsets were not confirmed.
    #[error("offset {offset_ms} ms exceeds 5000 ms; rerun with --allow-large-offset")]
    LargeOffsetRequiresConfirmation {
        /// The implied global shift in milliseconds
        offset_ms: i64,
    },

    /// Reference-track timing could not be reproduced in the merged output.
    #[error("reference timing preserved for only {preserved_ratio:.0}% of events")]
    ValidationFailed {
        /// Percentage of reference boundaries reproduced within tolerance
        preserved_ratio: f32,
    },

    /// Automatic strategies are exhausted; a human selector is needed.
    #[error("automatic anchor selection failed; manual selection required")]
    ManualRequired,

    /// The selector callback returned `Cancel`.
    #[error("anchor selection cancelled")]
    SelectionCancelled,
}

impl AlignmentFailure {
    /// Whether the orchestrator may still retry with another strategy.
    ///
    /// Cancellation is final; everything else leaves room for a fallback.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, AlignmentFailure::SelectionCancelled)
    }
}

// Convert reqwest error to translation service error
impl From<reqwest::Error> for BisubError {
    fn from(err: reqwest::Error) -> Self {
        BisubError::Translation(err.to_string())
    }
}

// Convert file exploration error to command execution error
impl From<walkdir::Error> for BisubError {
    fn from(err: walkdir::Error) -> Self {
        BisubError::CommandExecution(format!("Directory scan failed: {}", err))
    }
}

// Convert config crate error to configuration error
impl From<config::ConfigError> for BisubError {
    fn from(err: config::ConfigError) -> Self {
        match err {
            config::ConfigError::NotFound(path) => BisubError::Config {
                message: format!("Configuration file not found: {}", path),
            },
            config::ConfigError::Message(msg) => BisubError::Config { message: msg },
            _ => BisubError::Config {
                message: format!("Configuration error: {}", err),
            },
        }
    }
}

impl From<serde_json::Error> for BisubError {
    fn from(err: serde_json::Error) -> Self {
        BisubError::Container(format!("JSON parse error: {}", err))
    }
}

/// Specialized `Result` type for bisub operations.
pub type BisubResult<T> = Result<T, BisubError>;

impl BisubError {
    /// Create a configuration error with the given message.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use bisub_cli::error::BisubError;
    /// let err = BisubError::config("invalid setting");
    /// assert_eq!(err.to_string(), "Configuration error: invalid setting");
    /// ```
    pub fn config<S: Into<String>>(message: S) -> Self {
        BisubError::Config {
            message: message.into(),
        }
    }

    /// Create a subtitle format error for the given format and message.
    pub fn subtitle_format<S1, S2>(format: S1, message: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        BisubError::SubtitleFormat {
            format: format.into(),
            message: message.into(),
        }
    }

    /// Create an encoding error with the given message.
    pub fn encoding<S: Into<String>>(message: S) -> Self {
        BisubError::Encoding {
            message: message.into(),
        }
    }

    /// Create a translation service error with the given message.
    pub fn translation<S: Into<String>>(message: S) -> Self {
        BisubError::Translation(message.into())
    }

    /// Create a container extraction error with the given message.
    pub fn container<S: Into<String>>(message: S) -> Self {
        BisubError::Container(message.into())
    }

    /// Create an OCR error with the given message.
    pub fn ocr<S: Into<String>>(message: S) -> Self {
        BisubError::Ocr(message.into())
    }

    /// Create an output write error for the given path.
    pub fn output_write<S: Into<String>>(path: PathBuf, message: S) -> Self {
        BisubError::OutputWrite {
            path,
            message: message.into(),
        }
    }

    /// Return the corresponding exit code for this error variant.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use bisub_cli::error::BisubError;
    /// assert_eq!(BisubError::config("x").exit_code(), 2);
    /// ```
    pub fn exit_code(&self) -> i32 {
        match self {
            BisubError::Io(_) => 1,
            BisubError::Config { .. } => 2,
            BisubError::Translation(_) | BisubError::Container(_) | BisubError::Ocr(_) => 3,
            BisubError::SubtitleFormat { .. } | BisubError::Encoding { .. } => 4,
            BisubError::Alignment(_) => 5,
            BisubError::NoSubtitleTracks(_) | BisubError::NoAcceptableCandidate { .. } => 6,
            BisubError::OutputWrite { .. } => 7,
            BisubError::Cancelled => 130,
            _ => 1,
        }
    }

    /// Return a user-friendly error message with suggested remedies.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use bisub_cli::error::BisubError;
    /// let msg = BisubError::config("missing key").user_friendly_message();
    /// assert!(msg.contains("Configuration error:"));
    /// ```
    pub fn user_friendly_message(&self) -> String {
        match self {
            BisubError::Io(e) => format!("File operation error: {}", e),
            BisubError::Config { message } => format!(
                "Configuration error: {}\nHint: run 'bisub config --help' for details",
                message
            ),
            BisubError::SubtitleFormat { message, .. } => format!(
                "Subtitle processing error: {}\nHint: check file format and encoding",
                message
            ),
            BisubError::Encoding { message } => format!(
                "Encoding error: {}\nHint: run 'bisub detect-encoding' on the input file",
                message
            ),
            BisubError::NoSubtitleTracks(path) => format!(
                "No subtitle tracks found in {}\nHint: supply external subtitle files instead",
                path.display()
            ),
            BisubError::NoAcceptableCandidate {
                language,
                candidates,
            } => format!(
                "No acceptable {} track among {} candidates\nHint: use 'bisub tracks' to inspect them and pass an explicit track override",
                language, candidates
            ),
            BisubError::Alignment(reason) => format!(
                "Alignment failed: {}\nHint: try --use-translation or --strategy manual",
                reason
            ),
            BisubError::Translation(msg) => format!(
                "Translation service error: {}\nHint: check network connection and translator endpoint settings",
                msg
            ),
            BisubError::Container(msg) => format!(
                "Container extraction error: {}\nHint: ensure ffmpeg and ffprobe are installed and on PATH",
                msg
            ),
            BisubError::Ocr(msg) => format!("OCR error: {}", msg),
            BisubError::OutputWrite { path, message } => format!(
                "Failed to write {}: {}\nHint: no partial output was left behind",
                path.display(),
                message
            ),
            BisubError::FileNotFound(path) => format!("File not found: {}", path),
            BisubError::UnsupportedFileType(t) => format!("Unsupported file type: {}", t),
            BisubError::Cancelled => "Operation cancelled".to_string(),
            BisubError::CommandExecution(msg) => msg.clone(),
            BisubError::Other(err) => {
                format!("Unknown error: {}\nHint: please report this issue", err)
            }
        }
    }
}
