//! Gateway configuration
//!
//! Settings are read from a TOML file and may be overridden from the command
//! line. The configuration value is passed explicitly to every stage; nothing
//! reads global state.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::GatewayError;
use crate::hsub;

/// Environment variable naming an alternative configuration file
pub const CONFIG_ENV: &str = "MAIL2NEWS";

/// Configuration file looked up in the home directory when nothing else is given
pub const DEFAULT_CONFIG_FILE: &str = ".mail2newsrc";

/// Complete gateway configuration
///
/// # Example
///
/// ```
/// use mail2news::GatewayConfig;
///
/// let config: GatewayConfig = toml::from_str(r#"
///     [nntp]
///     path = "news.example.com"
///
///     [[peers]]
///     host = "news-in.example.net"
///     pattern = '^alt\.anonymous\.messages'
///     method = "ihave"
/// "#).unwrap();
///
/// assert_eq!(config.nntp.path, "news.example.com");
/// assert_eq!(config.peers.len(), 1);
/// assert_eq!(config.thresholds.max_crossposts, 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Filesystem locations
    pub paths: PathsConfig,
    /// Log verbosity
    pub logging: LoggingConfig,
    /// Injection identity
    pub nntp: NntpConfig,
    /// Numeric limits
    pub thresholds: Thresholds,
    /// Header and body filtering lists
    pub filters: FilterConfig,
    /// Hashed-subject settings
    pub hsub: HsubConfig,
    /// Moderated-group store settings
    pub moderated: ModeratedConfig,
    /// Upstream peers in delivery order
    pub peers: Vec<PeerConfig>,
}

/// `[paths]`: where logs, history and the moderated store live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the daily log files
    pub log: PathBuf,
    /// Directory holding the daily history files
    pub history: PathBuf,
    /// Directory holding the active-file snapshot and moderated store
    pub lib: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        let base = home_dir().join("mail2news");
        Self {
            log: base.join("log"),
            history: base.join("history"),
            lib: base.join("lib"),
        }
    }
}

/// `[logging]`: log verbosity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of error, warn, info, debug
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// `[nntp]`: identity the gateway injects articles under
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NntpConfig {
    /// Path header value; also the right-hand side of synthesized Message-IDs
    pub path: String,
    /// X-Abuse-Contact value
    pub abuse_contact: Option<String>,
    /// From header inserted when the message has none
    pub default_from: String,
}

impl Default for NntpConfig {
    fn default() -> Self {
        Self {
            path: "mail2news.invalid".to_string(),
            abuse_contact: Some("abuse@mail2news.invalid".to_string()),
            default_from: "Unknown User <nobody@mail2news.invalid>".to_string(),
        }
    }
}

/// `[thresholds]`: timeouts and size and age limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Per-peer connect and operation timeout in seconds
    pub timeout_secs: u64,
    /// Oldest accepted recipient date stamp, in hours before now
    pub hours_past: i64,
    /// Newest accepted recipient date stamp, in hours after now
    pub hours_future: i64,
    /// Maximum number of valid newsgroups in one article
    pub max_crossposts: usize,
    /// Maximum serialized article size
    pub max_bytes: usize,
}

impl Thresholds {
    /// Per-peer timeout as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            hours_past: 48,
            hours_future: 24,
            max_crossposts: 3,
            max_bytes: 200_000,
        }
    }
}

/// `[filters]`: header and body filtering lists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Headers stripped before posting
    pub remove_headers: Vec<String>,
    /// Headers whose presence rejects the message
    pub poison_headers: Vec<String>,
    /// Substrings rejecting a relay HELO
    pub poison_helo: Vec<String>,
    /// Substrings rejecting a From header
    pub poison_from: Vec<String>,
    /// Substrings rejecting a Newsgroups header
    pub poison_newsgroups: Vec<String>,
    /// Literal strings removed from single-part bodies
    pub body_delimiters: Vec<String>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        let strings = |list: &[&str]| list.iter().map(|s| s.to_string()).collect();
        Self {
            remove_headers: strings(&[
                "To",
                "Return-Path",
                "Received",
                "X-Original-To",
                "Delivered-To",
                "Content-Length",
                "Lines",
                "Xref",
                "NNTP-Posting-Host",
                "X-Spam-Checker-Version",
                "X-Spam-Level",
                "X-Spam-Status",
                "X-Spambayes-Classification",
            ]),
            poison_headers: strings(&["Control"]),
            poison_helo: Vec::new(),
            poison_from: Vec::new(),
            poison_newsgroups: Vec::new(),
            body_delimiters: strings(&[
                "-----BEGIN TYPE III ANONYMOUS MESSAGE-----\nMessage-type: plaintext\n\n",
                "-----END TYPE III ANONYMOUS MESSAGE-----\n",
            ]),
        }
    }
}

/// `[hsub]`: hashed-subject settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HsubConfig {
    /// Output length in hex characters
    pub length: usize,
}

impl Default for HsubConfig {
    fn default() -> Self {
        Self {
            length: hsub::DEFAULT_LENGTH,
        }
    }
}

/// `[moderated]`: moderated newsgroup store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModeratedConfig {
    /// Location of the gzip-compressed Usenet active file
    pub active_url: String,
    /// Reject posts to moderated groups found in the store
    pub reject_on_post: bool,
}

impl Default for ModeratedConfig {
    fn default() -> Self {
        Self {
            active_url: "https://ftp.isc.org/pub/usenet/CONFIG/active.gz".to_string(),
            reject_on_post: false,
        }
    }
}

/// One upstream peer as written in the configuration file
///
/// `pattern` is optional: a peer without one accepts every newsgroup, which
/// covers the plain host/method form of peer table. `method` is kept as text
/// so that an unknown method skips the peer at routing time instead of
/// failing the whole configuration. A missing `host` or `method` reads as
/// empty and is skipped the same way.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PeerConfig {
    /// `host`, `host:port` or `[ipv6]:port`
    pub host: String,
    /// Regex every newsgroup must match
    pub pattern: Option<String>,
    /// `ihave` or `post`
    pub method: String,
}

impl PeerConfig {
    /// Create a peer entry
    pub fn new(host: impl Into<String>, pattern: Option<&str>, method: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            pattern: pattern.map(str::to_string),
            method: method.into(),
        }
    }
}

/// Per-invocation options that do not live in the configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Recipient supplied by the MTA
    pub recipient: Option<String>,
    /// Newsgroups overriding anything in the message
    pub newsgroups: Option<String>,
    /// HELO/EHLO of the relaying client
    pub helo: Option<String>,
    /// Do not write the history file
    pub no_history: bool,
}

impl GatewayConfig {
    /// Parse configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, GatewayError> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            GatewayError::Config(format!("{}: unable to read config file: {}", path.display(), e))
        })?;
        toml::from_str(&text)
            .map_err(|e| GatewayError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Locate and load the configuration
    ///
    /// An explicit path or one named by [`CONFIG_ENV`] must exist. When
    /// neither is given, `~/.mail2newsrc` is read if present and the built-in
    /// defaults are used otherwise.
    pub fn load(explicit: Option<&Path>) -> Result<Self, GatewayError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::from_file(Path::new(&path));
        }
        let default = home_dir().join(DEFAULT_CONFIG_FILE);
        if default.is_file() {
            Self::from_file(&default)
        } else {
            Ok(Self::default())
        }
    }

    /// Check settings that would make every message fail
    pub fn validate(&self) -> Result<(), GatewayError> {
        if self.thresholds.max_crossposts == 0 {
            return Err(GatewayError::Config(
                "thresholds.max_crossposts must be at least 1".to_string(),
            ));
        }
        if self.thresholds.timeout_secs == 0 {
            return Err(GatewayError::Config(
                "thresholds.timeout_secs must be at least 1".to_string(),
            ));
        }
        if self.thresholds.hours_past < 0 || self.thresholds.hours_future < 0 {
            return Err(GatewayError::Config(
                "thresholds.hours_past and hours_future cannot be negative".to_string(),
            ));
        }
        if !hsub::is_supported_length(self.hsub.length) {
            return Err(GatewayError::Config(format!(
                "hsub.length {} is not an even value between {} and {}",
                self.hsub.length,
                hsub::MIN_LENGTH,
                hsub::MAX_LENGTH
            )));
        }
        Ok(())
    }
}

fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}
