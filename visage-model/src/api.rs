//! Request and response envelopes used by the gallery service endpoints.

use serde::{Deserialize, Serialize};

use crate::ids::PersonId;
use crate::person::Person;
use crate::photo::Photo;

/// Response envelope of the batch upload endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub message: String,
    pub photos: Vec<Photo>,
    /// True when server-side face processing was kicked off for the batch.
    #[serde(default)]
    pub processing: bool,
}

/// One page of the photo listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoPage {
    pub photos: Vec<Photo>,
    pub total: u64,
    pub pages: u32,
    pub current_page: u32,
    #[serde(default)]
    pub has_next: bool,
    #[serde(default)]
    pub has_prev: bool,
}

/// Response of the album detail endpoint: the person plus every photo they
/// appear in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumDetail {
    pub person: Person,
    pub photos: Vec<Photo>,
}

/// Body of the album rename endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenameRequest {
    pub name: String,
}

/// Body of the album merge endpoint. The server treats the pair as
/// order-insensitive; which record survives is its decision alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    pub person_id_1: PersonId,
    pub person_id_2: PersonId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_request_wire_shape() {
        let request = MergeRequest {
            person_id_1: PersonId(1),
            person_id_2: PersonId(2),
        };
        let json = serde_json::to_value(&request).expect("serializable");
        assert_eq!(json["person_id_1"], 1);
        assert_eq!(json["person_id_2"], 2);
    }

    #[test]
    fn photo_page_defaults_navigation_flags() {
        let raw = r#"{
            "photos": [],
            "total": 0,
            "pages": 0,
            "current_page": 1
        }"#;
        let page: PhotoPage = serde_json::from_str(raw).expect("valid payload");
        assert!(!page.has_next);
        assert!(!page.has_prev);
    }
}
