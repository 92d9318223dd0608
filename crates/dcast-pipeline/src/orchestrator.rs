//! Background transcode-and-publish orchestration.
//!
//! An accepted video upload is staged to a scratch directory, encoded into
//! each ladder rendition, and published to the destination folder, with a
//! progress record updated at every step. The caller gets the job id back
//! immediately; everything else happens on a spawned task.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use dcast_drive::ByteStream;
use dcast_media::{check_binary, ffmpeg_path, ffprobe_path, probe_duration};
use dcast_media::{CheckpointFn, Encoder, FfmpegCommand, MediaError};
use dcast_models::{
    EncodeSettings, JobId, JobStatus, ProgressPatch, PublishedFile, RenditionTarget,
    RENDITION_LADDER,
};
use dcast_progress::ProgressStore;
use futures_util::StreamExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::error::PipelineResult;
use crate::metrics;
use crate::percent::{encoding_percent, ladder_percent, uploading_percent};
use crate::plan::UploadPlan;
use crate::publisher::Publisher;

/// Runs upload jobs: direct publishes inline, transcodes on background tasks.
///
/// Clones share the same publisher, progress store, and encoder.
#[derive(Clone)]
pub struct TranscodePipeline {
    publisher: Arc<dyn Publisher>,
    progress: Arc<dyn ProgressStore>,
    encoder: Arc<dyn Encoder>,
    ffmpeg: PathBuf,
    ffprobe: PathBuf,
    settings: EncodeSettings,
}

impl TranscodePipeline {
    pub fn new(
        publisher: Arc<dyn Publisher>,
        progress: Arc<dyn ProgressStore>,
        encoder: Arc<dyn Encoder>,
    ) -> Self {
        Self {
            publisher,
            progress,
            encoder,
            ffmpeg: ffmpeg_path(),
            ffprobe: ffprobe_path(),
            settings: EncodeSettings::default(),
        }
    }

    /// Overrides the binaries consulted for duration probing.
    pub fn with_probe_binaries(mut self, ffmpeg: PathBuf, ffprobe: PathBuf) -> Self {
        self.ffmpeg = ffmpeg;
        self.ffprobe = ffprobe;
        self
    }

    pub fn with_settings(mut self, settings: EncodeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Publishes a non-video (or encode-declined) upload as-is and returns
    /// the created file.
    pub async fn direct_publish(
        &self,
        plan: &UploadPlan,
        media: ByteStream,
    ) -> PipelineResult<PublishedFile> {
        let parent_id = self
            .publisher
            .ensure_folder_path(&plan.folder_id, &plan.relative_path)
            .await?;
        let file = self
            .publisher
            .publish_stream(&plan.file_name, &parent_id, &plan.media_type, media)
            .await?;
        info!(file_id = %file.id, name = %file.name, "published upload directly");
        Ok(file)
    }

    /// Seeds a job record and spawns the transcode in the background.
    /// Returns the job id without waiting for any of the work.
    pub async fn start_transcode(&self, plan: UploadPlan, media: ByteStream) -> JobId {
        let job_id = JobId::new();
        self.progress.set(&job_id, ProgressPatch::default()).await;
        metrics::record_job_started();
        info!(job_id = %job_id, name = %plan.file_name, "transcode job accepted");

        let pipeline = self.clone();
        let task_id = job_id.clone();
        tokio::spawn(async move {
            pipeline.run_job(task_id, plan, media).await;
        });
        job_id
    }

    /// Drives one job to a terminal record. Failures land in the job record
    /// rather than propagating; the caller has already moved on.
    async fn run_job(&self, job_id: JobId, plan: UploadPlan, media: ByteStream) {
        let started = Instant::now();
        // Scratch space is removed once the job settles, success or not.
        let outcome = match tempfile::Builder::new().prefix("upload-").tempdir() {
            Ok(work_dir) => {
                let result = self.execute(&job_id, &plan, work_dir.path(), media).await;
                if let Err(e) = work_dir.close() {
                    warn!(job_id = %job_id, error = %e, "failed to remove job scratch directory");
                }
                result
            }
            Err(e) => Err(e.into()),
        };
        match outcome {
            Ok(files) => {
                metrics::record_job_finished("done", started.elapsed());
                info!(
                    job_id = %job_id,
                    files = files.len(),
                    elapsed_secs = started.elapsed().as_secs_f64(),
                    "transcode job complete"
                );
            }
            Err(e) => {
                metrics::record_job_finished("error", started.elapsed());
                warn!(job_id = %job_id, error = %e, "transcode job failed");
                self.progress
                    .set(&job_id, ProgressPatch::error(e.to_string()))
                    .await;
            }
        }
    }

    async fn execute(
        &self,
        job_id: &JobId,
        plan: &UploadPlan,
        work_dir: &Path,
        media: ByteStream,
    ) -> PipelineResult<Vec<PublishedFile>> {
        let input_path = work_dir.join(input_file_name(&plan.file_name));
        let staged = stage_to_disk(&input_path, media).await?;
        metrics::record_staged_bytes(staged);
        info!(job_id = %job_id, bytes = staged, "staged upload for encoding");

        let parent_id = self
            .publisher
            .ensure_folder_path(&plan.folder_id, &plan.relative_path)
            .await?;

        if !self.encoder.check().await {
            return Err(MediaError::encoder_unavailable(self.encoder.location()).into());
        }
        let ffprobe = if check_binary(&self.ffprobe).await {
            Some(self.ffprobe.as_path())
        } else {
            None
        };

        let base = base_name(&plan.file_name);
        let total = RENDITION_LADDER.len();
        self.progress
            .set(
                job_id,
                ProgressPatch::status(JobStatus::Encoding)
                    .with_current(RENDITION_LADDER[0].label)
                    .with_done(0)
                    .with_percent(0),
            )
            .await;

        let duration = probe_duration(&input_path, &self.ffmpeg, ffprobe).await;
        if duration.is_none() {
            warn!(job_id = %job_id, "source duration unknown, encode progress will be coarse");
        }

        let mut published = Vec::with_capacity(total);
        for (index, target) in RENDITION_LADDER.iter().enumerate() {
            let output_name = target.output_name(&base);
            let output_path = work_dir.join(&output_name);

            self.progress
                .set(
                    job_id,
                    ProgressPatch::status(JobStatus::Encoding)
                        .with_current(target.label)
                        .with_done(index as u32)
                        .with_percent(ladder_percent(index, total)),
                )
                .await;

            let last_time = self
                .encode_rendition(job_id, index, target, &input_path, &output_path, duration)
                .await?;

            self.progress
                .set(
                    job_id,
                    ProgressPatch::status(JobStatus::Uploading)
                        .with_current(target.label)
                        .with_done(index as u32)
                        .with_percent(uploading_percent(index, total, last_time, duration)),
                )
                .await;

            let publish_started = Instant::now();
            let file = self
                .publisher
                .publish_file(&output_name, &parent_id, "video/mp4", &output_path)
                .await?;
            metrics::record_rendition_published(target.label, publish_started.elapsed());
            info!(
                job_id = %job_id,
                rendition = target.label,
                file_id = %file.id,
                "published rendition"
            );
            published.push(file);

            self.progress
                .set(
                    job_id,
                    ProgressPatch::status(JobStatus::Progress)
                        .with_current(target.label)
                        .with_done((index + 1) as u32)
                        .with_percent(ladder_percent(index + 1, total)),
                )
                .await;
        }

        self.progress
            .set(
                job_id,
                ProgressPatch::status(JobStatus::Done)
                    .with_done(total as u32)
                    .with_files(published.clone())
                    .with_percent(100),
            )
            .await;
        Ok(published)
    }

    /// Encodes one rendition, forwarding encoder checkpoints into the job
    /// record while the source duration is known. Returns the last source
    /// position the encoder reported.
    async fn encode_rendition(
        &self,
        job_id: &JobId,
        index: usize,
        target: &RenditionTarget,
        input: &Path,
        output: &Path,
        duration: Option<f64>,
    ) -> PipelineResult<f64> {
        let args = FfmpegCommand::new(input, output)
            .video_filter(target.scale_pad_filter())
            .output_args(self.settings.to_output_args())
            .build_args();

        let (tx, mut rx) = mpsc::unbounded_channel::<f64>();
        let on_checkpoint: CheckpointFn = Box::new(move |secs| {
            let _ = tx.send(secs);
        });

        let encode_started = Instant::now();
        let run = self.encoder.run(&args, on_checkpoint);
        tokio::pin!(run);

        let total = RENDITION_LADDER.len();
        let mut last_time = 0.0_f64;
        let outcome = loop {
            tokio::select! {
                result = &mut run => break result,
                checkpoint = rx.recv() => {
                    if let Some(secs) = checkpoint {
                        last_time = secs;
                        if let Some(duration) = duration {
                            self.progress
                                .set(
                                    job_id,
                                    ProgressPatch::status(JobStatus::Encoding)
                                        .with_current(target.label)
                                        .with_done(index as u32)
                                        .with_percent(encoding_percent(
                                            index, total, secs, duration,
                                        )),
                                )
                                .await;
                        }
                    }
                }
            }
        };
        outcome?;

        // The sender lives inside the callback, which the encoder drops when
        // the run finishes; collect anything reported after the last poll.
        while let Some(secs) = rx.recv().await {
            last_time = secs;
        }

        metrics::record_rendition_encoded(target.label, encode_started.elapsed());
        Ok(last_time)
    }
}

/// Staging filename: keeps the upload's extension so the encoder can sniff
/// the container, with a neutral fallback.
fn input_file_name(file_name: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, ext))
            if !stem.is_empty() && !ext.is_empty() && !ext.contains('/') && !ext.contains('\\') =>
        {
            format!("input.{ext}")
        }
        _ => "input.dat".to_string(),
    }
}

/// Rendition name base: the upload's name minus its extension.
fn base_name(file_name: &str) -> String {
    if file_name.is_empty() {
        return "video".to_string();
    }
    let stem = match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem,
        _ => file_name,
    };
    stem.replace('/', "_").replace('\\', "_")
}

async fn stage_to_disk(path: &Path, mut media: ByteStream) -> PipelineResult<u64> {
    let mut file = tokio::fs::File::create(path).await?;
    let mut written = 0u64;
    while let Some(chunk) = media.next().await {
        let chunk = chunk?;
        written += chunk.len() as u64;
        file.write_all(&chunk).await?;
    }
    file.flush().await?;
    Ok(written)
}
