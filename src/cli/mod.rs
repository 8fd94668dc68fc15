//! Command-line interface for the bisub bilingual subtitle tool.
//!
//! The CLI is built using `clap` and follows a subcommand pattern:
//! - `merge` - align two subtitle tracks and write one bilingual track
//! - `batch` - run independent merge jobs over a directory
//! - `tracks` - inspect a video's subtitle streams with scorer verdicts
//! - `detect-encoding` - character encoding detection and conversion
//! - `config` - configuration management and inspection
//! - `generate-completion` - shell completion script generation
//!
//! # Examples
//!
//! ```bash
//! # Merge an external Chinese SRT with a video's embedded English track
//! bisub merge -v movie.mkv --primary movie.zh.srt
//!
//! # Batch a season directory into bilingual ASS
//! bisub batch ./Season01 --format ass
//!
//! # See why a track was (not) chosen
//! bisub tracks movie.mkv
//! ```

mod batch_args;
mod config_args;
mod detect_encoding_args;
mod generate_completion_args;
mod merge_args;
mod tracks_args;
pub mod table;
pub mod ui;

pub use batch_args::BatchArgs;
use clap::{Parser, Subcommand};
pub use config_args::{ConfigAction, ConfigArgs};
pub use detect_encoding_args::DetectEncodingArgs;
pub use generate_completion_args::GenerateCompletionArgs;
pub use merge_args::MergeArgs;
pub use tracks_args::TracksArgs;
pub use ui::{create_progress_bar, interactive_selector, print_error, print_success, print_warning};

/// Main CLI application structure defining the top-level interface.
#[derive(Parser, Debug)]
#[command(name = "bisub")]
#[command(about = "Bilingual subtitle alignment and merging tool")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for the bisub CLI application.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Align two subtitle tracks and merge them into one bilingual track
    Merge(MergeArgs),

    /// Run independent merge jobs over every video in a directory
    Batch(BatchArgs),

    /// List a video's subtitle streams with language and scorer verdicts
    Tracks(TracksArgs),

    /// Detect and convert character encoding of subtitle files
    DetectEncoding(DetectEncodingArgs),

    /// Manage and inspect application configuration
    Config(ConfigArgs),

    /// Generate shell completion scripts
    GenerateCompletion(GenerateCompletionArgs),
}

/// Executes the bisub CLI application with parsed arguments.
///
/// This is the main entry point for CLI execution, routing parsed
/// command-line arguments to their respective command handlers. Errors
/// propagate to `main` for exit-code mapping.
pub async fn run() -> crate::Result<()> {
    let config_service = std::sync::Arc::new(crate::config::ProductionConfigService::new()?);
    run_with_config(config_service.as_ref()).await
}

/// Run the CLI with a provided configuration service.
///
/// Dependency injection point: tests drive the CLI with a
/// [`TestConfigService`](crate::config::TestConfigService) instead of the
/// user's real configuration file.
pub async fn run_with_config(
    config_service: &dyn crate::config::ConfigService,
) -> crate::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Merge(args) => {
            args.validate()
                .map_err(crate::error::BisubError::CommandExecution)?;
            crate::commands::merge_command::execute(args, config_service).await?;
        }
        Commands::Batch(args) => {
            crate::commands::batch_command::execute(args, config_service).await?;
        }
        Commands::Tracks(args) => {
            crate::commands::tracks_command::execute(args, config_service).await?;
        }
        Commands::DetectEncoding(args) => {
            crate::commands::detect_encoding_command::execute(args)?;
        }
        Commands::Config(args) => {
            crate::commands::config_command::execute(args, config_service)?;
        }
        Commands::GenerateCompletion(args) => {
            let mut cmd = <Cli as clap::CommandFactory>::command();
            let cmd_name = cmd.get_name().to_string();
            let mut stdout = std::io::stdout();
            clap_complete::generate(args.shell, &mut cmd, cmd_name, &mut stdout);
        }
    }
    Ok(())
}
