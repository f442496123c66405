//! Offline batch transcoder.
//!
//! Consumes a directory of raw video files and produces the conventional
//! object layout the gallery serves from: one poster thumbnail under
//! `{category}/thumbnails/` and one H.264 variant per ladder rung under
//! `{category}/{quality}/`. Runs to completion and exits; a failure on one
//! file or rung is logged and the batch moves on. No retries.
//!
//! Encoding is delegated to an `ffmpeg` child process, which must be on the
//! PATH.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::process::Command;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::imaging;
use crate::models::video::VideoQuality;
use crate::paths;
use crate::storage::ObjectStore;

/// Container extensions picked up by the directory scan.
const VIDEO_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "mkv"];

/// Timestamp of the frame used for the poster thumbnail.
const POSTER_FRAME_TIME: &str = "00:00:01.000";

/// A batch request parsed from the command line.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    pub input_dir: PathBuf,
    /// Override for the category namespace; defaults to the directory name.
    pub category: Option<String>,
}

/// Transcode and upload every video file in the job's directory.
pub async fn run(store: Arc<dyn ObjectStore>, job: TranscodeJob) -> Result<()> {
    let category = match &job.category {
        Some(category) => paths::video_namespace(&category.to_lowercase()),
        None => category_for_dir(&job.input_dir),
    };

    let videos = scan_videos(&job.input_dir)?;
    if videos.is_empty() {
        warn!(dir = %job.input_dir.display(), "no video files found");
        return Ok(());
    }
    info!(count = videos.len(), category, "starting transcode batch");

    for video in &videos {
        if let Err(err) = process_video(store.as_ref(), video, &category).await {
            error!(video = %video.display(), error = %err, "skipping file");
        }
    }

    info!(category, "transcode batch finished");
    Ok(())
}

/// Category namespace for a directory: its lowercased name with `_videos`
/// appended when missing.
fn category_for_dir(dir: &Path) -> String {
    let name = dir
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("videos")
        .to_lowercase();
    paths::video_namespace(&name)
}

/// Non-recursive scan for video files, sorted for a stable batch order.
fn scan_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading input directory {}", dir.display()))?;

    let mut found = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && is_video_file(&path) {
            found.push(path);
        }
    }
    found.sort();
    Ok(found)
}

fn is_video_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            VIDEO_EXTENSIONS
                .iter()
                .any(|candidate| ext.eq_ignore_ascii_case(candidate))
        })
        .unwrap_or(false)
}

/// Process one file inside a throwaway work directory, removed afterwards
/// whatever the outcome.
async fn process_video(store: &dyn ObjectStore, input: &Path, category: &str) -> Result<()> {
    let file_name = input
        .file_name()
        .and_then(|name| name.to_str())
        .context("video file name is not valid UTF-8")?;
    let base = paths::base_name(file_name).to_string();

    let work_dir = input
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(format!(".transcode-{}", Uuid::new_v4()));
    tokio::fs::create_dir_all(&work_dir)
        .await
        .with_context(|| format!("creating work directory {}", work_dir.display()))?;

    let result = transcode_one(store, input, category, &base, &work_dir).await;

    if let Err(err) = tokio::fs::remove_dir_all(&work_dir).await {
        warn!(dir = %work_dir.display(), error = %err, "could not remove work directory");
    }
    result
}

async fn transcode_one(
    store: &dyn ObjectStore,
    input: &Path,
    category: &str,
    base: &str,
    work_dir: &Path,
) -> Result<()> {
    // Poster thumbnail: one frame, square-cropped to the display size.
    let frame_path = work_dir.join(format!("{}_frame.png", base));
    extract_frame(input, &frame_path).await?;
    let frame = tokio::fs::read(&frame_path).await?;
    let poster = imaging::square_thumbnail(&frame, imaging::POSTER_EDGE, imaging::POSTER_QUALITY)?;
    let poster_path = work_dir.join(format!("{}_thumb.jpg", base));
    tokio::fs::write(&poster_path, &poster).await?;

    let thumbnail_key = paths::video_thumbnail_key(category, base);
    store.put_file(&thumbnail_key, &poster_path, "image/jpeg").await?;
    info!(key = thumbnail_key, "uploaded poster thumbnail");

    for quality in VideoQuality::ALL {
        let output = work_dir.join(format!("{}_{}.mp4", base, quality));
        if let Err(err) = encode_variant(input, &output, quality).await {
            error!(video = base, %quality, error = %err, "encode failed");
            continue;
        }

        let key = paths::video_key(category, quality.as_str(), &format!("{}.mp4", base));
        match store.put_file(&key, &output, "video/mp4").await {
            Ok(()) => info!(key, "uploaded variant"),
            Err(err) => error!(key, error = %err, "upload failed"),
        }
    }

    Ok(())
}

/// Grab a single frame near the start of the video.
async fn extract_frame(input: &Path, output: &Path) -> Result<()> {
    let status = Command::new("ffmpeg")
        .arg("-ss")
        .arg(POSTER_FRAME_TIME)
        .arg("-i")
        .arg(input)
        .arg("-vframes")
        .arg("1")
        .arg("-y")
        .arg(output)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .context("spawning ffmpeg for frame extraction")?;
    if !status.success() {
        bail!("ffmpeg frame extraction exited with {}", status);
    }
    Ok(())
}

/// Encode one ladder rung: H.264 medium preset, AAC audio, faststart.
async fn encode_variant(input: &Path, output: &Path, quality: VideoQuality) -> Result<()> {
    let preset = quality.preset();
    let status = Command::new("ffmpeg")
        .arg("-i")
        .arg(input)
        .args(["-c:v", "libx264", "-preset", "medium"])
        .args(["-b:v", preset.bitrate])
        .arg("-vf")
        .arg(format!("scale={}:{}", preset.width, preset.height))
        .args(["-c:a", "aac", "-b:a", "128k"])
        .args(["-movflags", "+faststart", "-y"])
        .arg(output)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .context("spawning ffmpeg for encode")?;
    if !status.success() {
        bail!("ffmpeg encode exited with {}", status);
    }
    Ok(())
}
