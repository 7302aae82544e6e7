use crate::metrics_defs::SELECTORS_RESOLVED;
use crate::platform::PlatformClient;
use crate::types::{AggregationRecord, EntityPage, Resolution, ResolvedRecord};

/// Looks up the entities behind every record's selector, one request at a time.
///
/// A failed lookup is recorded on that record and never stops the remaining
/// lookups. Only the first page of results is used.
pub async fn resolve(
    records: Vec<AggregationRecord>,
    client: &dyn PlatformClient,
) -> Vec<ResolvedRecord> {
    let mut resolved = Vec::with_capacity(records.len());

    for record in records {
        let resolution = resolve_selector(&record.entity_selector, client).await;

        metrics::counter!(SELECTORS_RESOLVED.name, "outcome" => resolution.outcome()).increment(1);

        resolved.push(ResolvedRecord { record, resolution });
    }

    resolved
}

async fn resolve_selector(selector: &str, client: &dyn PlatformClient) -> Resolution {
    tracing::debug!(selector = %selector, "Resolving entity selector");

    match client.query_entities(selector).await {
        Ok(page) => resolution_from_page(selector, page),
        Err(e) => {
            tracing::error!(selector = %selector, "Could not resolve entity selector: {e}");
            Resolution::Failed {
                reason: e.to_string(),
            }
        }
    }
}

fn resolution_from_page(selector: &str, page: EntityPage) -> Resolution {
    if page.total_count == 0 {
        tracing::info!(selector = %selector, "No entities match selector");
        return Resolution::NoMatch;
    }

    if page.next_page_key.is_some() || page.total_count > page.entities.len() as u64 {
        tracing::warn!(
            selector = %selector,
            total_count = page.total_count,
            returned = page.entities.len(),
            "Selector matches more entities than the first page holds, only the first page is used"
        );
    }

    let entity_ids: Vec<_> = page.entities.into_iter().map(|e| e.entity_id).collect();
    for entity_id in &entity_ids {
        tracing::debug!(selector = %selector, entity_id = %entity_id, "Got entity");
    }

    Resolution::Matched { entity_ids }
}
