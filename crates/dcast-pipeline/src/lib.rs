//! Transcode-and-publish job pipeline.
//!
//! Accepted uploads either publish directly or run through the rendition
//! ladder on a background task, with progress tracked per job:
//!
//! - [`TranscodePipeline`]: stages, encodes, and publishes uploads
//! - [`UploadPlan`]: per-file intake parameters and the pipeline decision
//! - [`Publisher`]: destination seam, implemented by the Drive client
//! - [`percent`]: progress percent math over the rendition ladder

pub mod error;
pub mod metrics;
pub mod orchestrator;
pub mod percent;
pub mod plan;
pub mod publisher;

pub use error::{PipelineError, PipelineResult};
pub use orchestrator::TranscodePipeline;
pub use plan::{encode_requested, UploadPlan};
pub use publisher::Publisher;
