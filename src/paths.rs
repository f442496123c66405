//! Object key conventions.
//!
//! Every asset in the bucket lives under `{category}/{segment}/{filename}`,
//! where the segment is a quality or role token (`sd`, `360p`..`1080p`,
//! `thumbnails`). The functions here only compute strings; they never touch
//! the store. A malformed input produces a key that fails the existence
//! check downstream rather than an error here.

/// Extensions accepted as album images, matched case-insensitively.
const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// Canonical key for a photo: `{base}_photos/{segment}/{filename}`.
///
/// Callers are inconsistent about whether the album name already carries the
/// `_photos` suffix, so a trailing suffix is stripped before rebuilding.
pub fn photo_key(album: &str, segment: &str, filename: &str) -> String {
    let base = album.strip_suffix("_photos").unwrap_or(album);
    format!("{}_photos/{}/{}", base, segment, filename)
}

/// Thumbnail key for a photo: same filename under the `thumbnails` segment.
pub fn photo_thumbnail_key(album: &str, filename: &str) -> String {
    photo_key(album, "thumbnails", file_name(filename))
}

/// Canonical key for a video variant: `{category}/{quality}/{filename}`.
pub fn video_key(category: &str, quality: &str, filename: &str) -> String {
    format!("{}/{}/{}", category, quality, filename)
}

/// Thumbnail key for a video. The extension is always forced to `.jpg`,
/// regardless of the video container.
pub fn video_thumbnail_key(category: &str, name: &str) -> String {
    format!("{}/thumbnails/{}.jpg", category, base_name(name))
}

/// Re-point an existing `{category}/{segment}/{file}` key at another quality
/// segment. Keys with fewer than three segments are returned unchanged.
pub fn with_quality(key: &str, quality: &str) -> String {
    let parts: Vec<&str> = key.split('/').collect();
    if parts.len() < 3 {
        return key.to_string();
    }
    let category = parts[..parts.len() - 2].join("/");
    format!("{}/{}/{}", category, quality, parts[parts.len() - 1])
}

/// Video namespace for an event category: `wedding` and `wedding_videos`
/// both resolve to `wedding_videos`.
pub fn video_namespace(category: &str) -> String {
    let base = category.strip_suffix("_videos").unwrap_or(category);
    format!("{}_videos", base)
}

/// Quality/role segment of a `{category}/{segment}/{file}` key, if the key
/// has one.
pub fn quality_segment(key: &str) -> Option<&str> {
    let mut parts = key.rsplit('/');
    parts.next()?;
    parts.next()
}

/// Final path component of a key.
pub fn file_name(key: &str) -> &str {
    key.rsplit('/').next().unwrap_or(key)
}

/// Filename with its extension stripped.
pub fn base_name(filename: &str) -> &str {
    let name = file_name(filename);
    match name.rsplit_once('.') {
        Some((base, _)) if !base.is_empty() => base,
        _ => name,
    }
}

/// Attachment filename offered to the client: `{base}_{quality}.{ext}`.
/// Path separators, quotes, and control characters are dropped so the name
/// is safe inside a `Content-Disposition` header.
pub fn download_name(filename: &str, quality: &str, ext: &str) -> String {
    let raw = format!("{}_{}.{}", base_name(filename), quality, ext);
    raw.chars()
        .filter(|c| !matches!(c, '/' | '\\' | '"') && !c.is_control())
        .collect()
}

/// Whether a filename carries one of the album image extensions.
pub fn is_image_file(name: &str) -> bool {
    match name.rsplit_once('.') {
        Some((_, ext)) => IMAGE_EXTENSIONS
            .iter()
            .any(|candidate| ext.eq_ignore_ascii_case(candidate)),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn photo_key_builds_canonical_path() {
        assert_eq!(
            photo_key("wedding_photos", "sd", "x.jpg"),
            "wedding_photos/sd/x.jpg"
        );
    }

    #[test]
    fn photo_key_normalizes_redundant_suffix() {
        assert_eq!(
            photo_key("wedding", "sd", "x.jpg"),
            photo_key("wedding_photos", "sd", "x.jpg")
        );
    }

    #[test]
    fn photo_thumbnail_substitutes_segment() {
        assert_eq!(
            photo_thumbnail_key("mehdi_photos", "mehdi_photos/sd/a.jpg"),
            "mehdi_photos/thumbnails/a.jpg"
        );
    }

    #[test]
    fn video_thumbnail_forces_jpg() {
        assert_eq!(
            video_thumbnail_key("wedding_videos", "clip.mp4"),
            "wedding_videos/thumbnails/clip.jpg"
        );
    }

    #[test]
    fn with_quality_swaps_segment() {
        assert_eq!(
            with_quality("wedding_videos/360p/clip.mp4", "1080p"),
            "wedding_videos/1080p/clip.mp4"
        );
        // Too few segments: unchanged.
        assert_eq!(with_quality("clip.mp4", "1080p"), "clip.mp4");
    }

    #[test]
    fn base_name_strips_extension_only() {
        assert_eq!(base_name("clip.final.mp4"), "clip.final");
        assert_eq!(base_name("noext"), "noext");
        assert_eq!(base_name("a/b/c.jpg"), "c");
    }

    #[test]
    fn download_name_includes_quality() {
        assert_eq!(download_name("photo.png", "sd", "jpg"), "photo_sd.jpg");
    }

    #[test]
    fn download_name_drops_header_unsafe_characters() {
        assert_eq!(
            download_name("we\"ird.mp4", "720p", "mp4"),
            "weird_720p.mp4"
        );
    }

    #[test]
    fn video_namespace_appends_suffix_once() {
        assert_eq!(video_namespace("wedding"), "wedding_videos");
        assert_eq!(video_namespace("wedding_videos"), "wedding_videos");
    }

    #[test]
    fn quality_segment_reads_second_to_last() {
        assert_eq!(quality_segment("wedding_videos/360p/c.mp4"), Some("360p"));
        assert_eq!(quality_segment("c.mp4"), None);
    }

    #[test]
    fn image_extension_filter_is_case_insensitive() {
        assert!(is_image_file("a.JPG"));
        assert!(is_image_file("b.jpeg"));
        assert!(is_image_file("c.Png"));
        assert!(is_image_file("d.gif"));
        assert!(!is_image_file("e.mp4"));
        assert!(!is_image_file("noext"));
    }
}
