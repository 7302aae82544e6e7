//! Registers key requests on monitored entities.
//!
//! Reads a `|` separated file of `entitySelector|request_name` rows, groups the
//! request names by selector, resolves each selector to entity IDs and writes
//! one key request settings object per entity in a single batch.

pub mod aggregator;
pub mod config;
pub mod input;
pub mod metrics_defs;
pub mod payload;
pub mod platform;
pub mod resolver;
pub mod types;

#[cfg(test)]
mod testutils;

use config::Config;
use platform::{PlatformClient, PlatformError};
use types::{Resolution, ResolvedRecord};

#[derive(thiserror::Error, Debug)]
pub enum KeyRequestError {
    #[error("input error: {0}")]
    Input(#[from] input::InputError),
    #[error("could not submit settings objects: {0}")]
    Submit(#[source] PlatformError),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Summary of a completed run.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RunReport {
    pub records: usize,
    pub skipped_rows: usize,
    pub matched_selectors: usize,
    pub unmatched_selectors: usize,
    pub failed_selectors: usize,
    pub write_objects: usize,
    pub submitted: bool,
}

impl RunReport {
    fn new(skipped_rows: usize, resolved: &[ResolvedRecord]) -> Self {
        let mut report = RunReport {
            records: resolved.len(),
            skipped_rows,
            ..Default::default()
        };

        for record in resolved {
            match &record.resolution {
                Resolution::Matched { entity_ids } if !entity_ids.is_empty() => {
                    report.matched_selectors += 1
                }
                Resolution::Matched { .. } | Resolution::NoMatch => {
                    report.unmatched_selectors += 1
                }
                Resolution::Failed { .. } => report.failed_selectors += 1,
            }
        }

        report
    }
}

/// Runs the whole pipeline: read, aggregate, resolve, build and submit. Each
/// stage completes before the next one starts.
pub async fn run(config: &Config, client: &dyn PlatformClient) -> Result<RunReport, KeyRequestError> {
    tracing::debug!(
        base_url = %config.platform.base_url,
        input = %config.input_filename.display(),
        "Starting run"
    );

    let rows = input::read_rows_from_path(&config.input_filename)?;
    let aggregator = aggregator::aggregate(rows);
    let skipped_rows = aggregator.skipped_rows();
    let records = aggregator.into_records();

    let resolved = resolver::resolve(records, client).await;
    if config.verbose_logging {
        tracing::debug!("Aggregated records: {}", serde_json::to_string(&resolved)?);
    }

    let mut report = RunReport::new(skipped_rows, &resolved);

    let payload = payload::build_payload(&resolved);
    report.write_objects = payload.len();

    if config.dry_run {
        tracing::info!(
            "Dry run, not submitting payload: {}",
            serde_json::to_string(&payload)?
        );
    } else if payload.is_empty() {
        tracing::warn!("No selector resolved to any entity, nothing to submit");
    } else {
        if config.verbose_logging {
            tracing::debug!("Payload: {}", serde_json::to_string(&payload)?);
        }
        payload::submit(&payload, client)
            .await
            .map_err(KeyRequestError::Submit)?;
        report.submitted = true;
    }

    tracing::info!(
        records = report.records,
        skipped_rows = report.skipped_rows,
        matched = report.matched_selectors,
        unmatched = report.unmatched_selectors,
        failed = report.failed_selectors,
        write_objects = report.write_objects,
        submitted = report.submitted,
        "Run complete"
    );

    Ok(report)
}
