use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::errors::AppResult;
use crate::queue::{PlaylistExportProducer, EXPORT_PLAYLISTS_QUEUE};

/// Message consumed by the export worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    pub playlist_id: String,
    pub target_email: String,
}

/// Hands playlist exports to the queue. Ownership is checked by the caller
/// through `PlaylistService::verify_playlist_owner` before this runs.
#[derive(Clone)]
pub struct ExportService {
    producer: Arc<dyn PlaylistExportProducer>,
}

impl ExportService {
    pub fn new(producer: Arc<dyn PlaylistExportProducer>) -> Self {
        Self { producer }
    }

    pub async fn export_playlist(&self, playlist_id: &str, target_email: &str) -> AppResult<()> {
        let request = ExportRequest {
            playlist_id: playlist_id.to_string(),
            target_email: target_email.to_string(),
        };
        let message = serde_json::to_string(&request).map_err(anyhow::Error::from)?;

        self.producer
            .send_message(EXPORT_PLAYLISTS_QUEUE, &message)
            .await?;

        tracing::info!(playlist_id = %playlist_id, "playlist export queued");
        Ok(())
    }
}
