use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::PhotoId;

/// A photo known to the gallery service.
///
/// `filename` is the server-generated storage name; `original_filename` is
/// what the uploader called the file and is what downloads are saved as.
/// Dimension and size fields are absent until the server has inspected the
/// image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub filename: String,
    pub original_filename: String,
    pub upload_date: DateTime<Utc>,
    pub file_size: Option<u64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    /// Whether server-side face processing has finished for this photo.
    #[serde(default)]
    pub processed: bool,
    /// Number of faces detected so far.
    #[serde(default)]
    pub faces_count: u32,
}
