//! Application state.

use std::sync::Arc;

use dcast_drive::DriveClient;
use dcast_media::FfmpegEncoder;
use dcast_pipeline::TranscodePipeline;
use dcast_progress::{MemoryProgressStore, ProgressStore};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub drive: Arc<DriveClient>,
    pub progress: Arc<dyn ProgressStore>,
    pub pipeline: TranscodePipeline,
    /// Client for fetching remote files in upload-from-link.
    pub http: reqwest::Client,
}

impl AppState {
    /// Create new application state.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let drive = Arc::new(DriveClient::from_env()?);
        let progress: Arc<dyn ProgressStore> = Arc::new(MemoryProgressStore::new());
        let encoder = Arc::new(FfmpegEncoder::from_env());
        let pipeline = TranscodePipeline::new(drive.clone(), progress.clone(), encoder);
        let http = reqwest::Client::new();

        Ok(Self {
            config,
            drive,
            progress,
            pipeline,
            http,
        })
    }
}
