//! Groups input rows by entity selector.
//!
//! Selectors are compared as exact strings. The output keeps the order in
//! which each selector was first seen, and each record keeps its request names
//! in file order, duplicates included.

use crate::metrics_defs::INPUT_ROWS_SKIPPED;
use crate::types::{AggregationRecord, InputRow, RawRow, RowError};
use indexmap::IndexMap;

#[derive(Debug, Default)]
pub struct Aggregator {
    by_selector: IndexMap<String, Vec<String>>,
    skipped_rows: usize,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one data row. Malformed rows are counted and returned as errors,
    /// leaving the existing records untouched.
    pub fn add_row(&mut self, row: RawRow) -> Result<(), RowError> {
        let row = InputRow::try_from(row).inspect_err(|_| self.skipped_rows += 1)?;

        match self.by_selector.get_mut(&row.entity_selector) {
            Some(request_names) => {
                tracing::debug!(
                    selector = %row.entity_selector,
                    request_name = %row.request_name,
                    "Adding request name to existing selector"
                );
                request_names.push(row.request_name);
            }
            None => {
                tracing::debug!(
                    selector = %row.entity_selector,
                    request_name = %row.request_name,
                    "New selector"
                );
                self.by_selector
                    .insert(row.entity_selector, vec![row.request_name]);
            }
        }

        Ok(())
    }

    pub fn skipped_rows(&self) -> usize {
        self.skipped_rows
    }

    pub fn into_records(self) -> Vec<AggregationRecord> {
        self.by_selector
            .into_iter()
            .map(|(entity_selector, request_names)| AggregationRecord {
                entity_selector,
                request_names,
            })
            .collect()
    }
}

/// Aggregates all rows of an input file. The first row is the header and is
/// always discarded. Malformed data rows are skipped with a warning.
pub fn aggregate<I>(rows: I) -> Aggregator
where
    I: IntoIterator<Item = RawRow>,
{
    let mut rows = rows.into_iter();
    let mut aggregator = Aggregator::new();

    if let Some(header) = rows.next() {
        tracing::debug!(
            header = ?header.fields,
            "Skipping header row, expected \"entitySelector|request_name\""
        );
    }

    for row in rows {
        if let Err(e) = aggregator.add_row(row) {
            tracing::warn!("Skipping malformed row: {e}");
            metrics::counter!(INPUT_ROWS_SKIPPED.name).increment(1);
        }
    }

    aggregator
}
