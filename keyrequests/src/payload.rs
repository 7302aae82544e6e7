use crate::metrics_defs::SETTINGS_OBJECTS_BUILT;
use crate::platform::{PlatformClient, PlatformError};
use crate::types::{KEY_REQUEST_SCHEMA_ID, KeyRequestValue, ResolvedRecord, WriteObject};

/// Builds one settings object per resolved entity ID, in record order and then
/// in resolved entity order. Every object of a record carries all of that
/// record's request names. All objects target the key request schema.
pub fn build_payload(records: &[ResolvedRecord]) -> Vec<WriteObject<'_>> {
    let payload: Vec<_> = records
        .iter()
        .flat_map(|resolved| {
            let key_request_names = resolved.record.request_names.as_slice();
            resolved
                .resolution
                .entity_ids()
                .iter()
                .map(move |entity_id| WriteObject {
                    schema_id: KEY_REQUEST_SCHEMA_ID,
                    scope: entity_id,
                    value: KeyRequestValue { key_request_names },
                })
        })
        .collect();

    metrics::counter!(SETTINGS_OBJECTS_BUILT.name).increment(payload.len() as u64);

    payload
}

/// Submits the whole payload as one batch. A rejected batch is not retried.
pub async fn submit(
    payload: &[WriteObject<'_>],
    client: &dyn PlatformClient,
) -> Result<(), PlatformError> {
    if let Err(e) = client.write_settings(payload).await {
        match &e {
            PlatformError::Rejected { status, body } => tracing::error!(
                status = %status,
                body = %body,
                "Error posting settings objects"
            ),
            other => tracing::error!("Error posting settings objects: {other}"),
        }
        return Err(e);
    }

    tracing::info!(objects = payload.len(), "Settings objects submitted");
    Ok(())
}
