//! Moderated newsgroup lookup
//!
//! The set of moderated groups is built from a Usenet active file, whose
//! lines read `group high low flag`. Groups flagged `m` are added; groups
//! listed with any other flag are removed. Groups absent from the file are
//! left alone, so partial active files can be applied on top of each other.
//!
//! The set is kept on disk as a sorted list, one group per line.

use std::collections::BTreeSet;
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use flate2::read::GzDecoder;
use tracing::{debug, info};

use crate::error::GatewayError;
use crate::policy::ModerationCheck;

/// File name of the moderated group list under the lib directory
pub const STORE_FILE: &str = "moderated";

/// File name the downloaded active file is kept under
pub const ACTIVE_FILE: &str = "active.gz";

/// Upper limit on the active file download
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Moderated newsgroup names
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModeratedGroups {
    groups: BTreeSet<String>,
}

/// Counts from applying an active file
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActiveStats {
    /// Groups newly marked moderated
    pub added: usize,
    /// Groups no longer moderated
    pub removed: usize,
    /// Lines that were not `group high low flag`
    pub skipped: usize,
}

impl ModeratedGroups {
    /// Empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of moderated groups
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether no group is known to be moderated
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Whether `group` is moderated
    pub fn contains(&self, group: &str) -> bool {
        self.groups.contains(group)
    }

    /// Path of the store inside `lib_dir`
    pub fn store_path(lib_dir: &Path) -> PathBuf {
        lib_dir.join(STORE_FILE)
    }

    /// Load the store written by [`save`](Self::save)
    pub fn load(path: &Path) -> Result<Self, GatewayError> {
        let text = fs::read_to_string(path)?;
        let groups = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Ok(Self { groups })
    }

    /// Load the store if it exists, or start empty
    pub fn load_or_default(path: &Path) -> Result<Self, GatewayError> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::new())
        }
    }

    /// Write the store, replacing any previous copy in one step
    pub fn save(&self, path: &Path) -> Result<(), GatewayError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut text = String::new();
        for group in &self.groups {
            text.push_str(group);
            text.push('\n');
        }

        let tmp = path.with_extension("tmp");
        fs::write(&tmp, text)?;
        fs::rename(&tmp, path)?;
        debug!("Wrote {} moderated groups to {}", self.len(), path.display());
        Ok(())
    }

    /// Apply an uncompressed active file
    pub fn apply_active<R: Read>(&mut self, active: R) -> Result<ActiveStats, GatewayError> {
        let mut stats = ActiveStats::default();
        let mut reader = BufReader::new(active);
        let mut raw = Vec::new();

        loop {
            raw.clear();
            if reader.read_until(b'\n', &mut raw)? == 0 {
                break;
            }
            let line = String::from_utf8_lossy(&raw);
            let fields: Vec<&str> = line.split_whitespace().collect();

            let &[group, _high, _low, flag] = fields.as_slice() else {
                if !line.trim().is_empty() {
                    stats.skipped += 1;
                }
                continue;
            };

            if flag == "m" {
                if self.groups.insert(group.to_string()) {
                    stats.added += 1;
                }
            } else if self.groups.remove(group) {
                stats.removed += 1;
            }
        }

        info!(
            "Active file applied: {} added, {} removed, {} malformed lines",
            stats.added, stats.removed, stats.skipped
        );
        Ok(stats)
    }

    /// Apply a gzip-compressed active file from disk
    pub fn import_gzip(&mut self, path: &Path) -> Result<ActiveStats, GatewayError> {
        let file = fs::File::open(path).map_err(|e| {
            GatewayError::Fetch(format!("Unable to open {}: {}", path.display(), e))
        })?;
        self.apply_active(GzDecoder::new(file))
    }
}

impl ModerationCheck for ModeratedGroups {
    fn first_moderated<'a>(&self, groups: &'a [String]) -> Option<&'a str> {
        groups
            .iter()
            .map(String::as_str)
            .find(|group| self.contains(group))
    }
}

/// Download the active file at `url` into `dest`
pub async fn fetch_active(url: &str, dest: &Path) -> Result<(), GatewayError> {
    info!("Retrieving {}", url);

    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()
        .map_err(|e| GatewayError::Fetch(format!("Failed to create HTTP client: {}", e)))?;

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| GatewayError::Fetch(format!("Unable to reach server: {}", e)))?;

    let status = response.status();
    if !status.is_success() {
        return Err(GatewayError::Fetch(format!(
            "Server unable to fulfil request: {}",
            status
        )));
    }

    let body = response
        .bytes()
        .await
        .map_err(|e| GatewayError::Fetch(format!("Download of {} failed: {}", url, e)))?;

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(dest, &body)?;
    info!("Saved {} bytes to {}", body.len(), dest.display());
    Ok(())
}

/// Download the active file and fold it into the store under `lib_dir`
pub async fn update(url: &str, lib_dir: &Path) -> Result<ModeratedGroups, GatewayError> {
    let active = lib_dir.join(ACTIVE_FILE);
    fetch_active(url, &active).await?;
    import(&active, lib_dir)
}

/// Fold a local gzip active file into the store under `lib_dir`
pub fn import(active: &Path, lib_dir: &Path) -> Result<ModeratedGroups, GatewayError> {
    let store = ModeratedGroups::store_path(lib_dir);
    let mut groups = ModeratedGroups::load_or_default(&store)?;
    groups.import_gzip(active)?;
    groups.save(&store)?;
    info!("Moderated store updated: {} groups", groups.len());
    Ok(groups)
}
