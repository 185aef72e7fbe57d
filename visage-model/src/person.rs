use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{FaceId, PersonId, PhotoId};

/// Pixel-coordinate bounding box of a detected face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

/// A face detected in a photo, possibly assigned to a person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Face {
    pub id: FaceId,
    pub photo_id: PhotoId,
    pub person_id: Option<PersonId>,
    pub bounding_box: BoundingBox,
    /// Grouping confidence reported by the recognizer, 0.0 to 1.0.
    #[serde(default)]
    pub confidence: f64,
    pub created_date: DateTime<Utc>,
}

/// A person record, presented to users as an album.
///
/// The representative face is server-chosen (highest confidence) and is used
/// as the album cover. A merged person no longer appears in album listings;
/// the flag is kept so stale local copies can be recognized as such.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub created_date: DateTime<Utc>,
    pub photo_count: u32,
    pub representative_face: Option<Face>,
    #[serde(default)]
    pub is_merged: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_album_payload() {
        let raw = r#"{
            "id": 3,
            "name": "Alice",
            "created_date": "2025-05-20T08:00:00Z",
            "photo_count": 12,
            "representative_face": {
                "id": 9,
                "photo_id": 42,
                "person_id": 3,
                "bounding_box": {"top": 10, "right": 120, "bottom": 110, "left": 20},
                "confidence": 0.92,
                "created_date": "2025-05-20T08:00:01Z"
            },
            "is_merged": false
        }"#;

        let person: Person = serde_json::from_str(raw).expect("valid payload");
        assert_eq!(person.id, PersonId(3));
        assert_eq!(person.name, "Alice");
        let face = person.representative_face.expect("has cover face");
        assert_eq!(face.photo_id, PhotoId(42));
        assert_eq!(face.bounding_box.left, 20);
    }

    #[test]
    fn tolerates_album_without_cover() {
        let raw = r#"{
            "id": 4,
            "name": "Unknown Person",
            "created_date": "2025-05-20T08:00:00Z",
            "photo_count": 0,
            "representative_face": null
        }"#;

        let person: Person = serde_json::from_str(raw).expect("valid payload");
        assert!(person.representative_face.is_none());
        assert!(!person.is_merged);
    }
}
