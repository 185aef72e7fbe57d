use serde::{Deserialize, Serialize};

/// Aggregate gallery statistics served by the admin endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdminStats {
    pub total_photos: u64,
    pub total_persons: u64,
    pub total_faces: u64,
    pub processed_photos: u64,
    /// Percentage of photos the face pipeline has finished, 0.0 to 100.0.
    pub processing_progress: f64,
    /// Human-readable storage figure, when the server reports one.
    #[serde(default)]
    pub total_storage: Option<String>,
}

impl AdminStats {
    /// Whether background processing has caught up with all uploads.
    pub fn is_fully_processed(&self) -> bool {
        self.processed_photos >= self.total_photos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_helpers() {
        let stats = AdminStats {
            total_photos: 10,
            total_persons: 4,
            total_faces: 17,
            processed_photos: 7,
            processing_progress: 70.0,
            total_storage: None,
        };
        assert!(!stats.is_fully_processed());

        let done = AdminStats {
            processed_photos: 10,
            processing_progress: 100.0,
            ..stats
        };
        assert!(done.is_fully_processed());
    }
}
