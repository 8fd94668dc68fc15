//! Single-job bilingual merge command.
//!
//! Resolves the two track sources from CLI arguments, wires the
//! collaborators the job needs (container extraction, translation, an
//! interactive selector when requested), runs the orchestrator, and
//! reports the outcome with any degradation warnings.

use crate::Result;
use crate::cli::MergeArgs;
use crate::cli::ui::{interactive_selector, print_success, print_warning};
use crate::commands::parse_language;
use crate::config::ConfigService;
use crate::core::language::LanguageTag;
use crate::core::pipeline::{JobContext, JobSpec, SourceSpec, execute_job};
use crate::services::container::FfmpegContainerProvider;
use crate::services::ocr::NullOcrProvider;
use crate::services::translator::HttpTranslator;
use std::sync::Arc;
use std::time::Duration;

/// Execute a single merge job.
pub async fn execute(args: MergeArgs, config_service: &dyn ConfigService) -> Result<()> {
    let mut config = config_service.get_config()?;
    args.apply_to_config(&mut config);
    crate::config::validator::validate_config(&config)?;

    let primary_language = parse_language(&config.merge.primary_language)?;
    let secondary_language = match &args.secondary_lang {
        Some(code) => parse_language(code)?,
        None => LanguageTag::En,
    };

    let primary_source = match &args.primary {
        Some(path) => SourceSpec::File(path.clone()),
        None => SourceSpec::FromVideo {
            track_override: args.primary_track,
        },
    };
    let secondary_source = match &args.secondary {
        Some(path) => SourceSpec::File(path.clone()),
        None => SourceSpec::FromVideo {
            track_override: args.secondary_track,
        },
    };
    let needs_video = args.primary.is_none() || args.secondary.is_none();

    let mut ctx = JobContext::new(config.clone());
    if needs_video {
        ctx.container = Some(Arc::new(FfmpegContainerProvider::new()));
        ctx.ocr = Some(Arc::new(NullOcrProvider));
    }
    if config.alignment.use_translation {
        ctx.translator = Some(Arc::new(HttpTranslator::new(
            config.translator.endpoint.clone(),
            config.translator.api_key.clone(),
            Duration::from_secs(config.translator.timeout_seconds),
        )?));
    }
    if args.interactive {
        ctx.selector = Some(interactive_selector());
    }

    let spec = JobSpec {
        video: args.video.clone(),
        primary_source,
        secondary_source,
        primary_language,
        secondary_language,
        output: args.output.clone(),
    };

    let outcome = execute_job(&ctx, &spec).await?;
    for warning in &outcome.warnings {
        print_warning(warning);
    }
    print_success(&format!(
        "{} (shift {:+.2}s, anchor confidence {:.2})",
        outcome.output_path.display(),
        outcome.shift_ms as f64 / 1000.0,
        outcome.anchor_confidence
    ));
    Ok(())
}
