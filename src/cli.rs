//! Command-line interface
//!
//! With no subcommand the gateway reads one message from standard input,
//! which is how an MTA pipe invokes it. The maintenance subcommands cover
//! hSub values and the moderated group store.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::{GatewayConfig, RunOptions};

/// Mail-to-news gateway
#[derive(Parser, Debug)]
#[command(name = "mail2news")]
#[command(about = "Deliver inbound email to Usenet peers", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(flatten)]
    pub options: GlobalOptions,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Flags accepted before or after any subcommand
#[derive(Args, Debug, Default, Clone)]
pub struct GlobalOptions {
    /// Configuration file (default: $MAIL2NEWS, then ~/.mail2newsrc)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory for the daily log files
    #[arg(short, long = "logpath", global = true)]
    pub log_path: Option<PathBuf>,

    /// Logging level (error, warn, info, debug)
    #[arg(long = "loglevel", global = true)]
    pub log_level: Option<String>,

    /// Directory for the daily history files
    #[arg(long = "histpath", global = true)]
    pub hist_path: Option<PathBuf>,

    /// Recipient of the message
    #[arg(short = 'u', long = "user", global = true)]
    pub user: Option<String>,

    /// Newsgroups to post the message in
    #[arg(short, long, global = true)]
    pub newsgroups: Option<String>,

    /// Entry to use in the Path header
    #[arg(long, global = true)]
    pub path: Option<String>,

    /// HELO/EHLO name of the sending relay
    #[arg(long, global = true)]
    pub helo: Option<String>,

    /// Don't store messages in a history file
    #[arg(long = "nohist", global = true)]
    pub no_history: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Gate one message from standard input (the default)
    Post,
    /// Hashed Subject utilities
    Hsub {
        #[command(subcommand)]
        action: HsubAction,
    },
    /// Moderated newsgroup store
    Moderated {
        #[command(subcommand)]
        action: ModeratedAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum HsubAction {
    /// Print an hSub of TEXT
    Hash {
        /// Text to hash
        text: String,

        /// 16 hex digit IV (random if omitted)
        #[arg(long)]
        iv: Option<String>,

        /// Output length in hex characters (even, 32 to 56)
        #[arg(long)]
        length: Option<usize>,
    },
    /// Check whether HSUB was made from TEXT
    Check {
        /// Text to check
        text: String,

        /// hSub to check against
        hsub: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum ModeratedAction {
    /// Download the Usenet active file and rebuild the store
    Update {
        /// Active file location (default from configuration)
        #[arg(long)]
        url: Option<String>,
    },
    /// Rebuild the store from a local gzip active file
    Import {
        /// Path to the gzip-compressed active file
        file: PathBuf,
    },
    /// Print the first moderated group among GROUPS
    Check {
        /// Newsgroups to look up
        #[arg(required = true)]
        groups: Vec<String>,
    },
}

impl GlobalOptions {
    /// Overlay command-line values onto the loaded configuration
    pub fn apply(&self, config: &mut GatewayConfig) {
        if let Some(path) = &self.log_path {
            config.paths.log = path.clone();
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        if let Some(path) = &self.hist_path {
            config.paths.history = path.clone();
        }
        if let Some(path) = &self.path {
            config.nntp.path = path.clone();
        }
    }

    /// Per-message options for the pipeline
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            recipient: self.user.clone(),
            newsgroups: self.newsgroups.clone(),
            helo: self.helo.clone(),
            no_history: self.no_history,
        }
    }
}
