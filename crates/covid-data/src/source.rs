//! Data sources that hand the aggregator a readable, header-first stream.
//!
//! [`FileSource`] opens a local file. [`CachedDownload`] keeps a local copy of
//! the upstream CSV and only talks to the network when the copy is missing or
//! a refresh was requested.

use std::fs::{self, File};
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use chrono::{DateTime, Local};
use covid_core::error::{CovidError, Result};
use tracing::{debug, info, warn};

/// Read buffer for the (large) raw data file.
const READ_BUFFER_SIZE: usize = 1 << 20;

/// Maximum number of download attempts before giving up.
pub const MAX_DOWNLOAD_ATTEMPTS: u32 = 3;

/// Upper bound for one full download of the raw file.
pub const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

// ── DataSource ────────────────────────────────────────────────────────────────

/// Something that can supply the raw delimited rows, header first.
///
/// Every call to [`DataSource::open`] returns a fresh stream positioned at the
/// start of the data.
pub trait DataSource {
    fn open(&mut self) -> Result<Box<dyn BufRead>>;

    /// Human-readable location used in log lines.
    fn describe(&self) -> String;
}

fn open_file(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|source| CovidError::SourceUnavailable {
        location: path.display().to_string(),
        source,
    })?;
    Ok(Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)))
}

// ── FileSource ────────────────────────────────────────────────────────────────

/// A plain local file.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for FileSource {
    fn open(&mut self) -> Result<Box<dyn BufRead>> {
        open_file(&self.path)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

// ── CachedDownload ────────────────────────────────────────────────────────────

/// Local copy of an upstream file, downloaded on first use.
///
/// The cache is byte-identical to the upstream file. A forced refresh is
/// honoured once, on the next [`DataSource::open`].
#[derive(Debug, Clone)]
pub struct CachedDownload {
    url: String,
    cache_path: PathBuf,
    force_refresh: bool,
}

impl CachedDownload {
    pub fn new(url: impl Into<String>, cache_path: impl Into<PathBuf>) -> Self {
        Self {
            url: url.into(),
            cache_path: cache_path.into(),
            force_refresh: false,
        }
    }

    /// Download again on the next open even if a cached copy exists.
    pub fn force_refresh(mut self, force: bool) -> Self {
        self.force_refresh = force;
        self
    }

    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Modification time of the cached copy, or `None` when absent.
    pub fn cached_at(&self) -> Option<DateTime<Local>> {
        let modified = fs::metadata(&self.cache_path).ok()?.modified().ok()?;
        Some(DateTime::<Local>::from(modified))
    }

    /// Drop the cached copy and download it again.
    pub fn refresh(&self) -> Result<()> {
        if self.cache_path.exists() {
            fs::remove_file(&self.cache_path)?;
            debug!("removed cached copy {}", self.cache_path.display());
        }
        self.download_with_retry()
    }

    /// Back-off schedule: attempt 1 → 0 ms, attempt 2 → 100 ms, attempt 3 → 200 ms.
    fn download_with_retry(&self) -> Result<()> {
        let mut last_err = None;

        for attempt in 0..MAX_DOWNLOAD_ATTEMPTS {
            if attempt > 0 {
                let sleep_ms = u64::from(attempt) * 100;
                debug!(attempt, sleep_ms, "retrying download after back-off");
                thread::sleep(Duration::from_millis(sleep_ms));
            }

            match self.download_once() {
                Ok(bytes) => {
                    info!(
                        bytes,
                        "downloaded {} to {}",
                        self.url,
                        self.cache_path.display()
                    );
                    return Ok(());
                }
                Err(e) => {
                    warn!(attempt, error = %e, "download attempt failed");
                    last_err = Some(e);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| self.download_error("no download attempted")))
    }

    /// Fetch the URL into a temporary sibling, then rename it into place.
    fn download_once(&self) -> Result<u64> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(DOWNLOAD_TIMEOUT)
            .build()
            .map_err(|e| self.download_error(e))?;

        let mut response = client
            .get(&self.url)
            .send()
            .and_then(|r| r.error_for_status())
            .map_err(|e| self.download_error(e))?;

        if let Some(parent) = self.cache_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.cache_path.with_extension("part");
        let mut out = File::create(&tmp)?;
        let bytes = match response.copy_to(&mut out) {
            Ok(bytes) => bytes,
            Err(e) => {
                drop(out);
                let _ = fs::remove_file(&tmp);
                return Err(self.download_error(e));
            }
        };
        out.sync_all()?;
        drop(out);
        fs::rename(&tmp, &self.cache_path)?;

        Ok(bytes)
    }

    fn download_error(&self, message: impl std::fmt::Display) -> CovidError {
        CovidError::Download {
            url: self.url.clone(),
            message: message.to_string(),
        }
    }
}

impl DataSource for CachedDownload {
    fn open(&mut self) -> Result<Box<dyn BufRead>> {
        if self.force_refresh {
            self.refresh()?;
            self.force_refresh = false;
        } else if self.cached_at().is_none() {
            self.download_with_retry()?;
        }
        if let Some(at) = self.cached_at() {
            warn!(
                "Using {} downloaded at {}",
                self.cache_path.display(),
                at.format("%Y-%m-%d %H:%M:%S")
            );
        }
        open_file(&self.cache_path)
    }

    fn describe(&self) -> String {
        format!("{} (cached at {})", self.url, self.cache_path.display())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
