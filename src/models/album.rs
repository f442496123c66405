//! Photo album records, derived per request from an `sd/` prefix listing.

use serde::Serialize;

/// One image in an album: the pair of keys the page links together.
#[derive(Serialize, Clone, Debug, PartialEq, Eq)]
pub struct AlbumImage {
    /// Key of the reduced preview under `{album}_photos/thumbnails/`.
    pub thumbnail: String,

    /// Key of the full-size asset under `{album}_photos/sd/`.
    pub full: String,
}

/// A full album listing, sorted by filename ascending.
#[derive(Serialize, Clone, Debug)]
pub struct AlbumListing {
    /// Album name with the `_photos` suffix stripped.
    pub name: String,

    pub images: Vec<AlbumImage>,
}

impl AlbumListing {
    pub fn empty(name: &str) -> Self {
        Self {
            name: name.to_string(),
            images: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.images.len()
    }
}
