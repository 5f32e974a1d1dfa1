//! Logging and observability infrastructure for creaturedex
//!
//! Structured logging is done with `tracing`; the CLI installs a
//! `tracing-subscriber` registry once at startup. Library crates only emit
//! events and spans.

use std::io::IsTerminal;
use tracing::{Level, error, info, span};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Check if colored output should be used.
///
/// Returns true only if stderr is a terminal and NO_COLOR is not set.
fn use_color() -> bool {
    std::io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Filter directive used when `RUST_LOG` is not set.
#[must_use]
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "creaturedex=debug,info"
    } else {
        "creaturedex=info,warn"
    }
}

/// Initialize tracing subscriber for structured logging
///
/// `RUST_LOG` takes precedence over the verbosity flag. Verbose mode adds
/// targets and span close events (with their timings) to the output.
/// Logs go to stderr so that `--json` output on stdout stays machine-readable.
///
/// # Errors
///
/// Returns an error if a global subscriber has already been installed.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose)))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    if verbose {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .with_span_events(FmtSpan::CLOSE)
                    .compact(),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(use_color())
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_line_number(false)
                    .with_file(false)
                    .compact(),
            )
            .try_init()?;
    }

    Ok(())
}

/// Create a span for one pipeline stage (`scan`, `explain`, `identify`)
pub fn stage_span(stage: &'static str) -> tracing::Span {
    span!(Level::INFO, "stage", stage = stage)
}

/// Log stage completion with duration
pub fn log_stage_complete(stage: &str, duration_ms: u128) {
    info!(stage = %stage, duration_ms = %duration_ms, "Stage completed");
}

/// Log stage failure with context
pub fn log_stage_error(stage: &str, error: &str, duration_ms: u128) {
    error!(
        stage = %stage,
        duration_ms = %duration_ms,
        error = %error,
        "Stage failed"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_depends_on_verbosity() {
        assert!(default_filter(true).contains("creaturedex=debug"));
        assert!(default_filter(false).contains("creaturedex=info"));
    }

    #[test]
    fn test_default_filters_parse() {
        assert!(EnvFilter::try_new(default_filter(true)).is_ok());
        assert!(EnvFilter::try_new(default_filter(false)).is_ok());
    }

    #[test]
    fn test_stage_span_without_subscriber_is_usable() {
        let span = stage_span("scan");
        let _entered = span.enter();
        log_stage_complete("scan", 12);
    }
}
