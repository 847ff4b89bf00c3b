use std::path::Path;

use covid_core::settings::Settings;
use covid_data::source::{CachedDownload, DataSource, FileSource};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` uses the CLI's level names and is mapped to an
/// [`EnvFilter`] directive, falling back to `"warn"`. Output goes to stderr
/// so stdout only carries the report.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(level_directive(log_level))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .try_init()?;

    Ok(())
}

/// Map CLI level names to tracing level names (tracing uses lowercase).
fn level_directive(log_level: &str) -> String {
    let upper = log_level.to_uppercase();
    match upper.as_str() {
        "DEBUG" => "debug".to_string(),
        "INFO" => "info".to_string(),
        "WARNING" | "WARN" => "warn".to_string(),
        "ERROR" => "error".to_string(),
        _ => log_level.to_lowercase(),
    }
}

// ── Source bootstrap ───────────────────────────────────────────────────────────

/// Create the directory that will hold the cached download.
pub fn ensure_cache_dir(cache_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = cache_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// Pick the data source named by `settings`.
///
/// `--file` wins over the cached download; `--update` only applies to the
/// download.
pub fn build_source(settings: &Settings) -> anyhow::Result<Box<dyn DataSource>> {
    if let Some(path) = &settings.file {
        if settings.update {
            tracing::warn!("--update has no effect together with --file");
        }
        return Ok(Box::new(FileSource::new(path)));
    }

    let cache_path = settings.cache_path();
    ensure_cache_dir(&cache_path)?;
    Ok(Box::new(
        CachedDownload::new(settings.url.clone(), cache_path).force_refresh(settings.update),
    ))
}

// ── Tests ──────────────────────────────────────────────────────────────────────
