mod bootstrap;

use std::io::Write;

use anyhow::Result;
use covid_core::settings::Settings;
use covid_data::aggregator::Aggregator;
use covid_report::json_view::render_json;
use covid_report::table_view::TableRenderer;

fn main() -> Result<()> {
    let settings = Settings::load();

    bootstrap::setup_logging(&settings.log_level)?;

    tracing::info!("covid-stats v{} starting", env!("CARGO_PKG_VERSION"));

    // Reject bad flag combinations before touching the network or disk.
    let query = settings.query()?;
    if query.filter.is_match_all() {
        tracing::info!("Bucket mode: {}, no filter", query.bucket_mode);
    } else {
        tracing::info!(
            "Bucket mode: {}, region: {}, age group: {}, year: {}",
            query.bucket_mode,
            query.filter.region_code.as_deref().unwrap_or("*"),
            query.filter.age_group.as_deref().unwrap_or("*"),
            query.filter.year.as_deref().unwrap_or("*"),
        );
    }

    let mut source = bootstrap::build_source(&settings)?;
    let result =
        Aggregator::from_query(&query).aggregate_source(source.as_mut(), query.delimiter)?;

    if !result.warnings.is_empty() {
        tracing::warn!("{} malformed rows were skipped", result.warnings.len());
    }
    tracing::info!(
        "{} of {} rows matched the filter",
        result.rows_matched,
        result.rows_read
    );

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if settings.wants_json() {
        let json = render_json(&result.matrix, &result.header, query.bucket_mode)?;
        writeln!(out, "{}", json)?;
    } else {
        TableRenderer::new().write(&mut out, &result.matrix, &result.header)?;
    }
    out.flush()?;

    Ok(())
}
