//! Page handlers.
//!
//! Pages are assembled by string composition with explicit escaping, the same
//! way the rest of the crate builds structured text responses. Listing
//! failures degrade to an empty page with a zero count; browsing never
//! hard-fails on a transient store error.

use axum::{
    extract::{Path, State},
    response::Html,
};
use tracing::error;

use crate::models::album::AlbumListing;
use crate::models::video::{VideoQuality, VideoRecord};
use crate::routes::routes::AppState;

/// Event categories the selection pages link to.
const CATEGORIES: [&str; 3] = ["wedding", "mehdi", "haldi"];

/// GET `/`
pub async fn index() -> Html<String> {
    let body = concat!(
        r#"<p><a href="/photos">Photos</a></p>"#,
        r#"<p><a href="/videos">Videos</a></p>"#
    );
    Html(page("Wedding gallery", body))
}

/// GET `/photos`
pub async fn photos_selection() -> Html<String> {
    let mut body = String::new();
    for category in CATEGORIES {
        body.push_str(&format!(
            r#"<p><a href="/photos/{0}">{0}</a></p>"#,
            html_escape(category)
        ));
    }
    Html(page("Photo albums", &body))
}

/// GET `/videos`
pub async fn videos_selection() -> Html<String> {
    let mut body = String::new();
    for category in CATEGORIES {
        body.push_str(&format!(
            r#"<p><a href="/{0}_videos">{0}</a></p>"#,
            html_escape(category)
        ));
    }
    Html(page("Video events", &body))
}

/// GET `/photos/{album}`
pub async fn album_photos(
    State(state): State<AppState>,
    Path(album): Path<String>,
) -> Html<String> {
    let listing = match state.listing.photo_album(&album).await {
        Ok(listing) => listing,
        Err(err) => {
            error!(album, error = %err, "album listing failed, rendering empty page");
            AlbumListing::empty(&album)
        }
    };
    Html(render_album(&listing))
}

/// GET `/wedding_videos`
pub async fn wedding_videos(State(state): State<AppState>) -> Html<String> {
    video_category_page(state, "wedding").await
}

/// GET `/mehdi_videos`
pub async fn mehdi_videos(State(state): State<AppState>) -> Html<String> {
    video_category_page(state, "mehdi").await
}

/// GET `/haldi_videos`
pub async fn haldi_videos(State(state): State<AppState>) -> Html<String> {
    video_category_page(state, "haldi").await
}

/// Shared body of the three per-event video pages; they differ only in the
/// category string.
async fn video_category_page(state: AppState, category: &str) -> Html<String> {
    let videos = match state.listing.video_category(category).await {
        Ok(videos) => videos,
        Err(err) => {
            error!(category, error = %err, "video listing failed, rendering empty page");
            Vec::new()
        }
    };
    Html(render_videos(category, &videos))
}

fn render_album(listing: &AlbumListing) -> String {
    let mut body = format!("<p>{} photos</p><div class=\"grid\">", listing.total());
    for image in &listing.images {
        body.push_str(&format!(
            concat!(
                r#"<figure><a href="/serve_image/{full}">"#,
                r#"<img src="/serve_thumbnail/{full}" loading="lazy"></a>"#,
                r#"<a href="/download/{name}/sd/{file}/sd">download</a></figure>"#
            ),
            full = html_escape(&image.full),
            name = html_escape(&listing.name),
            file = html_escape(crate::paths::file_name(&image.full)),
        ));
    }
    body.push_str("</div>");
    page(&format!("{} photos", listing.name), &body)
}

fn render_videos(category: &str, videos: &[VideoRecord]) -> String {
    let mut body = format!("<p>{} videos</p>", videos.len());
    for video in videos {
        let poster = format!(r#"<img src="{}" loading="lazy">"#, html_escape(&video.thumbnail_url));
        // The poster links to the canonical rung; per-quality links follow.
        match video.variants.get(&VideoQuality::DEFAULT) {
            Some(default_key) => body.push_str(&format!(
                r#"<figure><a href="/download_video?video_path={}">{}</a><figcaption>{}</figcaption>"#,
                html_escape(default_key),
                poster,
                html_escape(&video.name),
            )),
            None => body.push_str(&format!(
                r#"<figure>{}<figcaption>{}</figcaption>"#,
                poster,
                html_escape(&video.name),
            )),
        }
        for (quality, key) in &video.variants {
            let href = format!("/download_video?video_path={}&quality={}", key, quality);
            body.push_str(&format!(
                r#" <a href="{}">{}</a>"#,
                html_escape(&href),
                quality,
            ));
        }
        body.push_str("</figure>");
    }
    page(&format!("{} videos", category), &body)
}

fn page(title: &str, body: &str) -> String {
    format!(
        concat!(
            "<!doctype html><html><head><meta charset=\"utf-8\">",
            "<title>{title}</title>",
            "<link rel=\"icon\" href=\"/favicon.ico\">",
            "</head><body><h1>{title}</h1>{body}</body></html>"
        ),
        title = html_escape(title),
        body = body,
    )
}

fn html_escape(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::album::AlbumImage;

    #[test]
    fn album_page_counts_and_links_every_image() {
        let listing = AlbumListing {
            name: "wedding".to_string(),
            images: vec![AlbumImage {
                thumbnail: "wedding_photos/thumbnails/a.jpg".to_string(),
                full: "wedding_photos/sd/a.jpg".to_string(),
            }],
        };
        let html = render_album(&listing);
        assert!(html.contains("1 photos"));
        assert!(html.contains("/serve_image/wedding_photos/sd/a.jpg"));
        assert!(html.contains("/serve_thumbnail/wedding_photos/sd/a.jpg"));
        assert!(html.contains("/download/wedding/sd/a.jpg/sd"));
    }

    #[test]
    fn empty_album_renders_zero_count() {
        let html = render_album(&AlbumListing::empty("haldi"));
        assert!(html.contains("0 photos"));
    }

    #[test]
    fn video_page_links_poster_to_the_canonical_rung() {
        let record = VideoRecord {
            name: "clip".to_string(),
            thumbnail_url: "https://store.invalid/t.jpg".to_string(),
            variants: VideoQuality::ALL
                .into_iter()
                .map(|q| (q, format!("wedding_videos/{}/clip.mp4", q)))
                .collect(),
        };
        let html = render_videos("wedding", &[record]);
        assert!(html.contains("1 videos"));
        assert!(html.contains("video_path=wedding_videos/720p/clip.mp4"));
        assert!(html.contains("video_path=wedding_videos/360p/clip.mp4&amp;quality=360p"));
    }

    #[test]
    fn escaping_covers_markup_characters() {
        assert_eq!(html_escape("a<b>&\"c\""), "a&lt;b&gt;&amp;&quot;c&quot;");
    }
}
