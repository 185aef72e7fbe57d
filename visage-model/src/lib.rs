//! Shared entity and wire-contract types for the Visage gallery client.
//!
//! Everything here mirrors what the gallery service serves over its JSON API:
//! photos, person albums derived from face grouping, aggregate statistics,
//! and the request/response envelopes the endpoints use. The orchestration
//! crate (`visage-client`) consumes these types; nothing in this crate talks
//! to the network.

pub mod api;
pub mod ids;
pub mod person;
pub mod photo;
pub mod stats;

pub use api::{AlbumDetail, MergeRequest, PhotoPage, RenameRequest, UploadResponse};
pub use ids::{FaceId, PersonId, PhotoId};
pub use person::{BoundingBox, Face, Person};
pub use photo::Photo;
pub use stats::AdminStats;
