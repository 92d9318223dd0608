//! Upload intake decisions.

use dcast_models::is_video_source;

/// Reads the `encode` form field. Absent means yes; only an explicit
/// `0`, `false`, or `no` (case-insensitive) declines encoding.
pub fn encode_requested(field: Option<&str>) -> bool {
    let value = field.unwrap_or("1").to_lowercase();
    !(value == "0" || value == "false" || value == "no")
}

/// Parameters for one uploaded file, as accepted by the upload endpoint.
#[derive(Debug, Clone)]
pub struct UploadPlan {
    pub file_name: String,
    pub media_type: String,
    /// Drive folder the upload lands under.
    pub folder_id: String,
    /// Slash-separated subfolder path below `folder_id`, created on demand.
    pub relative_path: String,
    pub encode: bool,
}

impl UploadPlan {
    /// Whether this upload goes through the transcode pipeline rather than
    /// being published as-is.
    pub fn wants_pipeline(&self) -> bool {
        self.encode && is_video_source(&self.media_type, &self.file_name)
    }
}
