//! Daily history of inbound messages
//!
//! Every message is appended verbatim, followed by a newline, to a file
//! named after the current UTC date. The history shows afterwards why a
//! message went through or not; production gateways may switch it off.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::error::GatewayError;

/// Permissions of a newly created history file
#[cfg(unix)]
const HISTORY_FILE_MODE: u32 = 0o644;

/// History file for the day of `now`, `{dir}/YYYY-MM-DD`
pub fn history_file(dir: &Path, now: DateTime<Utc>) -> PathBuf {
    dir.join(now.format("%Y-%m-%d").to_string())
}

/// Append the inbound bytes `raw` to the history file for the day of `now`
///
/// The bytes are written exactly as received, invalid UTF-8 included.
pub fn record(dir: &Path, raw: &[u8], now: DateTime<Utc>) -> Result<PathBuf, GatewayError> {
    fs::create_dir_all(dir)?;
    let path = history_file(dir, now);

    let mut options = OpenOptions::new();
    options.create(true).append(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(HISTORY_FILE_MODE);
    }

    let existed = path.exists();
    let mut file = options.open(&path)?;
    if !existed {
        debug!("Created new history file: {}", path.display());
    }

    file.write_all(raw)?;
    file.write_all(b"\n")?;
    Ok(path)
}
