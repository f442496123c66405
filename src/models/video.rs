//! Video records and the fixed quality ladder.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The resolution ladder produced by the offline transcoder. Every video in
/// the bucket is assumed to exist at each rung; the assumption is checked
/// lazily when a play or download URL is requested, never at listing time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum VideoQuality {
    #[serde(rename = "360p")]
    Q360,
    #[serde(rename = "480p")]
    Q480,
    #[serde(rename = "720p")]
    Q720,
    #[serde(rename = "1080p")]
    Q1080,
}

/// Encoder parameters for one ladder rung.
#[derive(Debug, Clone, Copy)]
pub struct EncodePreset {
    pub width: u32,
    pub height: u32,
    pub bitrate: &'static str,
}

impl VideoQuality {
    pub const ALL: [VideoQuality; 4] = [
        VideoQuality::Q360,
        VideoQuality::Q480,
        VideoQuality::Q720,
        VideoQuality::Q1080,
    ];

    /// Rung used where a single canonical variant key is needed.
    pub const DEFAULT: VideoQuality = VideoQuality::Q720;

    pub fn as_str(self) -> &'static str {
        match self {
            VideoQuality::Q360 => "360p",
            VideoQuality::Q480 => "480p",
            VideoQuality::Q720 => "720p",
            VideoQuality::Q1080 => "1080p",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "360p" => Some(VideoQuality::Q360),
            "480p" => Some(VideoQuality::Q480),
            "720p" => Some(VideoQuality::Q720),
            "1080p" => Some(VideoQuality::Q1080),
            _ => None,
        }
    }

    pub fn preset(self) -> EncodePreset {
        match self {
            VideoQuality::Q360 => EncodePreset {
                width: 640,
                height: 360,
                bitrate: "800k",
            },
            VideoQuality::Q480 => EncodePreset {
                width: 854,
                height: 480,
                bitrate: "1500k",
            },
            VideoQuality::Q720 => EncodePreset {
                width: 1280,
                height: 720,
                bitrate: "2500k",
            },
            VideoQuality::Q1080 => EncodePreset {
                width: 1920,
                height: 1080,
                bitrate: "5000k",
            },
        }
    }
}

impl fmt::Display for VideoQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One video in a category listing.
///
/// Only the thumbnail's existence has been confirmed; `variants` holds the
/// conventional key for every rung whether or not the object is present.
#[derive(Serialize, Clone, Debug)]
pub struct VideoRecord {
    /// Base name shared by the thumbnail and every variant.
    pub name: String,

    /// Display URL for the poster thumbnail (signed or public).
    pub thumbnail_url: String,

    /// Conventional object key per ladder rung.
    pub variants: BTreeMap<VideoQuality, String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_round_trips_through_str() {
        for quality in VideoQuality::ALL {
            assert_eq!(VideoQuality::parse(quality.as_str()), Some(quality));
        }
        assert_eq!(VideoQuality::parse("4k"), None);
    }

    #[test]
    fn presets_match_the_transcode_ladder() {
        let preset = VideoQuality::Q480.preset();
        assert_eq!((preset.width, preset.height), (854, 480));
        assert_eq!(preset.bitrate, "1500k");
        assert_eq!(VideoQuality::Q1080.preset().bitrate, "5000k");
    }
}
