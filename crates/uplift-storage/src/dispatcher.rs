//! Per-file transfer task

use std::sync::Arc;
use std::time::Instant;
use uplift_core::LocalFile;

use crate::store::UploadStore;
use crate::strategy::{DispatchContext, UploadStrategy};

pub(crate) struct DispatchJob {
    pub store: UploadStore,
    pub uploader_key: String,
    pub key: String,
    pub file: LocalFile,
    pub strategy: Arc<UploadStrategy>,
    pub context: DispatchContext,
}

/// Run one transfer and move its record to `success` or `error`.
///
/// The record is already `loading` when this starts. Failures stay on the
/// record; nothing here can affect sibling transfers.
pub(crate) async fn dispatch(job: DispatchJob) {
    let DispatchJob {
        store,
        uploader_key,
        key,
        file,
        strategy,
        context,
    } = job;

    let start = Instant::now();
    let size = file.size();

    match strategy.upload(&key, &file, &context).await {
        Ok(url) => {
            tracing::info!(
                uploader_key = %uploader_key,
                key = %key,
                service = %strategy.service(),
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Upload successful"
            );

            match store
                .update_record(&uploader_key, &key, |record| record.succeed(url.clone()))
                .await
            {
                Ok(record) => {
                    if record.is_image() {
                        store.spawn_dimension_lookup(uploader_key, key, url);
                    }
                }
                Err(e) => tracing::debug!(
                    uploader_key = %uploader_key,
                    key = %key,
                    error = %e,
                    "Upload finished for a record that no longer exists"
                ),
            }
        }
        Err(e) => {
            tracing::error!(
                uploader_key = %uploader_key,
                key = %key,
                service = %strategy.service(),
                size_bytes = size,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                error = %e,
                "Upload failed"
            );

            let message = e.to_string();
            if let Err(e) = store
                .update_record(&uploader_key, &key, |record| record.fail(message))
                .await
            {
                tracing::debug!(
                    uploader_key = %uploader_key,
                    key = %key,
                    error = %e,
                    "Upload failed for a record that no longer exists"
                );
            }
        }
    }
}
