use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::fmt;
use std::path::PathBuf;

use crate::transcode::TranscodeJob;

/// Centralized application configuration.
/// Combines environment variables and CLI arguments.
#[derive(Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub bucket: String,
    pub region: String,
    pub endpoint: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub public_base_url: Option<String>,
}

/// Command-line + environment configuration.
#[derive(Parser, Debug)]
#[command(author, version, about = "Personal media gallery server")]
pub struct Args {
    /// Host to bind to (overrides GALLERY_HOST)
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to (overrides PORT)
    #[arg(long)]
    pub port: Option<u16>,

    /// Bucket holding the gallery assets (overrides GALLERY_BUCKET)
    #[arg(long)]
    pub bucket: Option<String>,

    /// Store region (overrides GALLERY_REGION)
    #[arg(long)]
    pub region: Option<String>,

    /// Custom store endpoint for S3-compatible backends (overrides GALLERY_ENDPOINT)
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Base URL for public object links (overrides GALLERY_PUBLIC_BASE_URL)
    #[arg(long)]
    pub public_base_url: Option<String>,

    /// Transcode the videos in this directory, upload them, and exit
    #[arg(long, value_name = "DIR")]
    pub transcode: Option<PathBuf>,

    /// Category namespace for --transcode (defaults to the directory name)
    #[arg(long)]
    pub category: Option<String>,
}

impl AppConfig {
    /// Parse environment variables + CLI args into AppConfig and an optional
    /// batch transcode job.
    pub fn from_env_and_args() -> Result<(Self, Option<TranscodeJob>)> {
        // Parse CLI once
        let args = Args::parse();

        // --- Environment fallback ---
        let env_host = env::var("GALLERY_HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let env_port = match env::var("PORT") {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("parsing PORT value `{}`", value))?,
            Err(env::VarError::NotPresent) => 8080,
            Err(err) => return Err(err).context("reading PORT"),
        };
        let env_bucket = env::var("GALLERY_BUCKET").unwrap_or_else(|_| "photo-directory".into());
        let env_region = env::var("GALLERY_REGION").unwrap_or_else(|_| "us-east-1".into());

        // --- Merge ---
        let cfg = Self {
            host: args.host.unwrap_or(env_host),
            port: args.port.unwrap_or(env_port),
            bucket: args.bucket.unwrap_or(env_bucket),
            region: args.region.unwrap_or(env_region),
            endpoint: args.endpoint.or_else(|| env::var("GALLERY_ENDPOINT").ok()),
            access_key_id: env::var("GALLERY_ACCESS_KEY_ID").ok(),
            secret_access_key: env::var("GALLERY_SECRET_ACCESS_KEY").ok(),
            public_base_url: args
                .public_base_url
                .or_else(|| env::var("GALLERY_PUBLIC_BASE_URL").ok()),
        };

        let job = args.transcode.map(|input_dir| TranscodeJob {
            input_dir,
            category: args.category,
        });

        Ok((cfg, job))
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// Keeps the credential pair out of startup logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .field(
                "access_key_id",
                &self.access_key_id.as_deref().map(|_| "***"),
            )
            .field(
                "secret_access_key",
                &self.secret_access_key.as_deref().map(|_| "***"),
            )
            .field("public_base_url", &self.public_base_url)
            .finish()
    }
}
