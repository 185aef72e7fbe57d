//! GalleryStore - local mirror of server-known entities.
//!
//! Photos, person albums, and aggregate stats as last confirmed by the
//! remote service. Mutations happen only at reconciliation points: created
//! entities after a successful upload, removal after a confirmed delete, an
//! in-place rename, or a wholesale album replacement after operations whose
//! result the client must not guess (merge). Nothing here talks to the
//! network and nothing survives the process.

use std::collections::HashMap;

use log::trace;

use visage_model::{AdminStats, Person, PersonId, Photo, PhotoId};

/// Local mirror of the server's photos, albums, and stats.
#[derive(Debug, Default)]
pub struct GalleryStore {
    photos: HashMap<PhotoId, Photo>,
    photo_order: Vec<PhotoId>,
    albums: Vec<Person>,
    stats: Option<AdminStats>,
}

impl GalleryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or update photos, preserving first-seen order.
    pub fn insert_photos(&mut self, photos: Vec<Photo>) {
        for photo in photos {
            trace!("[Store] upserting photo {}", photo.id);
            if self.photos.insert(photo.id, photo.clone()).is_none() {
                self.photo_order.push(photo.id);
            }
        }
    }

    pub fn photo(&self, id: PhotoId) -> Option<&Photo> {
        self.photos.get(&id)
    }

    /// All known photos in first-seen order.
    pub fn photos(&self) -> impl Iterator<Item = &Photo> {
        self.photo_order
            .iter()
            .filter_map(|id| self.photos.get(id))
    }

    pub fn photo_count(&self) -> usize {
        self.photos.len()
    }

    pub fn remove_photo(&mut self, id: PhotoId) -> Option<Photo> {
        self.photo_order.retain(|known| *known != id);
        self.photos.remove(&id)
    }

    /// Replace the album listing wholesale. Used both for plain refreshes
    /// and for invalidation after a merge, where the surviving record's
    /// attributes are server-defined.
    pub fn replace_albums(&mut self, albums: Vec<Person>) {
        trace!("[Store] replacing {} albums", albums.len());
        self.albums = albums;
    }

    /// Drop the album listing without a replacement. The next successful
    /// refresh repopulates it.
    pub fn invalidate_albums(&mut self) {
        self.albums.clear();
    }

    pub fn albums(&self) -> &[Person] {
        &self.albums
    }

    pub fn album(&self, id: PersonId) -> Option<&Person> {
        self.albums.iter().find(|album| album.id == id)
    }

    /// Rename an album in place, returning the previous name so an
    /// optimistic edit can be rolled back.
    pub fn rename_album(&mut self, id: PersonId, name: &str) -> Option<String> {
        let album = self.albums.iter_mut().find(|album| album.id == id)?;
        let previous = std::mem::replace(&mut album.name, name.to_string());
        Some(previous)
    }

    pub fn apply_stats(&mut self, stats: AdminStats) {
        self.stats = Some(stats);
    }

    pub fn stats(&self) -> Option<&AdminStats> {
        self.stats.as_ref()
    }

    /// Forget everything. The mirror repopulates from the next fetches.
    pub fn clear(&mut self) {
        self.photos.clear();
        self.photo_order.clear();
        self.albums.clear();
        self.stats = None;
    }
}
