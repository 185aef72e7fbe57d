//! Strongly typed identifiers.
//!
//! The gallery service issues integer primary keys. Keeping one newtype per
//! entity prevents a photo id from ever being handed to an album endpoint.

use serde::{Deserialize, Serialize};

/// Identifier of an uploaded photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhotoId(pub i64);

impl PhotoId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for PhotoId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PhotoId {
    fn from(value: i64) -> Self {
        PhotoId(value)
    }
}

/// Identifier of a person, which doubles as the album identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(pub i64);

impl PersonId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for PersonId {
    fn from(value: i64) -> Self {
        PersonId(value)
    }
}

/// Identifier of a detected face within a photo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceId(pub i64);

impl FaceId {
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl std::fmt::Display for FaceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for FaceId {
    fn from(value: i64) -> Self {
        FaceId(value)
    }
}
