//! Listing aggregation.
//!
//! Turns raw prefix listings into the album and video records the pages
//! render. Records are derived fresh on every request; the only store calls
//! are a single prefix listing (plus URL issuance for video posters).

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use crate::errors::AppError;
use crate::models::album::{AlbumImage, AlbumListing};
use crate::models::video::{VideoQuality, VideoRecord};
use crate::paths;
use crate::services::delivery_service::{BROWSE_URL_TTL, DeliveryService};
use crate::storage::ObjectStore;

#[derive(Clone)]
pub struct ListingService {
    store: Arc<dyn ObjectStore>,
    delivery: DeliveryService,
}

impl ListingService {
    pub fn new(store: Arc<dyn ObjectStore>, delivery: DeliveryService) -> Self {
        Self { store, delivery }
    }

    /// List a photo album: every image under `{album}_photos/sd/`, sorted by
    /// filename, each paired with its thumbnail key.
    pub async fn photo_album(&self, album: &str) -> Result<AlbumListing, AppError> {
        let name = album.strip_suffix("_photos").unwrap_or(album);
        let prefix = format!("{}_photos/sd/", name);
        let listed = self.store.list(&prefix).await?;

        let mut filenames: Vec<String> = listed
            .iter()
            .map(|info| paths::file_name(&info.key).to_string())
            .filter(|filename| paths::is_image_file(filename))
            .collect();
        filenames.sort();
        debug!(album = name, count = filenames.len(), "album listed");

        let images = filenames
            .into_iter()
            .map(|filename| AlbumImage {
                thumbnail: paths::photo_thumbnail_key(name, &filename),
                full: paths::photo_key(name, "sd", &filename),
            })
            .collect();

        Ok(AlbumListing {
            name: name.to_string(),
            images,
        })
    }

    /// List a video category from its confirmed thumbnails.
    ///
    /// Variant keys are synthesized for the whole quality ladder without an
    /// existence check; delivery verifies them when a URL is requested.
    pub async fn video_category(&self, category: &str) -> Result<Vec<VideoRecord>, AppError> {
        let namespace = paths::video_namespace(category);
        let prefix = format!("{}/thumbnails/", namespace);
        let listed = self.store.list(&prefix).await?;

        let mut records = Vec::new();
        for info in listed {
            if !info.key.to_ascii_lowercase().ends_with(".jpg") {
                continue;
            }
            let name = paths::base_name(paths::file_name(&info.key)).to_string();
            let thumbnail_url = self
                .delivery
                .issue_url(&info.key, BROWSE_URL_TTL, None)
                .await?;

            let variants: BTreeMap<VideoQuality, String> = VideoQuality::ALL
                .into_iter()
                .map(|quality| {
                    let key = paths::video_key(
                        &namespace,
                        quality.as_str(),
                        &format!("{}.mp4", name),
                    );
                    (quality, key)
                })
                .collect();

            records.push(VideoRecord {
                name,
                thumbnail_url,
                variants,
            });
        }

        records.sort_by(|a, b| a.name.cmp(&b.name));
        debug!(category = namespace, count = records.len(), "videos listed");
        Ok(records)
    }
}
