//! mail2news binary
//!
//! Exit status is 0 whether a message was delivered or silently rejected;
//! senders never get a bounce. Status 1 means the gateway itself could not
//! run: bad configuration, no log file, or no usable Path.

use std::io::Read;
use std::path::Path;
use std::process::ExitCode;

use chrono::Utc;
use clap::Parser;
use tracing::{error, info, warn};

use mail2news::cli::{Cli, Command, HsubAction, ModeratedAction};
use mail2news::moderated::{self, ModeratedGroups};
use mail2news::policy::ModerationCheck;
use mail2news::{GatewayConfig, GatewayError, RunOptions, delivery, history, hsub, logging, pipeline};

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        None | Some(Command::Post) => gate(&config, &cli.options.run_options()),
        Some(Command::Hsub { action }) => run_hsub(&config, action),
        Some(Command::Moderated { action }) => run_moderated(&config, action),
    }
}

fn load_config(cli: &Cli) -> Result<GatewayConfig, GatewayError> {
    let mut config = GatewayConfig::load(cli.options.config.as_deref())?;
    cli.options.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn runtime() -> Result<tokio::runtime::Runtime, GatewayError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(GatewayError::Io)
}

/// Gate the message on standard input
fn gate(config: &GatewayConfig, options: &RunOptions) -> ExitCode {
    let _guard = match logging::init(&config.paths.log, &config.logging.level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {}. Check file permissions?", e);
            return ExitCode::FAILURE;
        }
    };

    let mut input = Vec::new();
    if let Err(e) = std::io::stdin().read_to_end(&mut input) {
        error!("Unable to read message from standard input: {}", e);
        return ExitCode::SUCCESS;
    }
    let now = Utc::now();

    if options.no_history {
        info!("Message not logged due to --nohist switch");
    } else if let Err(e) = history::record(&config.paths.history, &input, now) {
        error!("Unable to write history file: {}", e);
    }

    let raw = String::from_utf8_lossy(&input);

    let moderated = moderation_store(config);
    let moderation = moderated.as_ref().map(|m| m as &dyn ModerationCheck);

    let prepared = match pipeline::process(&raw, options, config, now, moderation) {
        Ok(prepared) => prepared,
        Err(reason) if reason.is_fatal() => {
            error!("{}", reason);
            return ExitCode::FAILURE;
        }
        Err(reason) => {
            warn!("Rejecting message: {}", reason);
            return ExitCode::SUCCESS;
        }
    };

    if prepared.peers.is_empty() {
        warn!("Message {} has nowhere to go", prepared.message_id);
        return ExitCode::SUCCESS;
    }

    let rt = match runtime() {
        Ok(rt) => rt,
        Err(e) => {
            error!("Unable to start runtime: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = rt.block_on(delivery::deliver(
        &prepared.message_id,
        &prepared.payload,
        &prepared.peers,
        config.thresholds.max_bytes,
        config.thresholds.timeout(),
    ));

    match result {
        Ok(reports) => {
            let delivered = reports.iter().filter(|r| r.outcome.is_delivered()).count();
            info!(
                "{} delivered to {} of {} peers",
                prepared.message_id,
                delivered,
                reports.len()
            );
        }
        Err(reason) => warn!("Rejecting message: {}", reason),
    }

    ExitCode::SUCCESS
}

/// The moderated store, when configured to reject moderated posts
fn moderation_store(config: &GatewayConfig) -> Option<ModeratedGroups> {
    if !config.moderated.reject_on_post {
        return None;
    }

    let path = ModeratedGroups::store_path(&config.paths.lib);
    if !path.exists() {
        warn!(
            "Moderated store {} not found, moderated groups will not be checked",
            path.display()
        );
        return None;
    }

    match ModeratedGroups::load(&path) {
        Ok(groups) => Some(groups),
        Err(e) => {
            warn!("Unable to load moderated store: {}", e);
            None
        }
    }
}

fn run_hsub(config: &GatewayConfig, action: HsubAction) -> ExitCode {
    match action {
        HsubAction::Hash { text, iv, length } => {
            let length = length.unwrap_or(config.hsub.length);
            let result = match iv {
                Some(iv) => parse_iv(&iv).and_then(|iv| hsub::hash_with_iv(&text, &iv, length)),
                None => hsub::hash(&text, length),
            };
            match result {
                Some(value) => {
                    println!("{}", value);
                    ExitCode::SUCCESS
                }
                None => {
                    eprintln!(
                        "Error: IV must be {} hex digits and length an even value from {} to {}",
                        hsub::IV_HEX_LEN,
                        hsub::MIN_LENGTH,
                        hsub::MAX_LENGTH
                    );
                    ExitCode::FAILURE
                }
            }
        }
        HsubAction::Check { text, hsub: value } => {
            let matched = hsub::check(&text, &value);
            println!("{}", matched);
            if matched {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn parse_iv(text: &str) -> Option<[u8; hsub::IV_BYTES]> {
    let mut iv = [0u8; hsub::IV_BYTES];
    hex::decode_to_slice(text, &mut iv).ok()?;
    Some(iv)
}

fn run_moderated(config: &GatewayConfig, action: ModeratedAction) -> ExitCode {
    if let Err(e) = logging::init_stderr(&config.logging.level) {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let lib = config.paths.lib.as_path();
    let result = match action {
        ModeratedAction::Update { url } => {
            let url = url.unwrap_or_else(|| config.moderated.active_url.clone());
            runtime().and_then(|rt| rt.block_on(moderated::update(&url, lib)))
        }
        ModeratedAction::Import { file } => moderated::import(&file, lib),
        ModeratedAction::Check { groups } => return check_moderated(lib, &groups),
    };

    match result {
        Ok(groups) => {
            println!("Moderated store updated: {} groups", groups.len());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn check_moderated(lib: &Path, groups: &[String]) -> ExitCode {
    let store = match ModeratedGroups::load(&ModeratedGroups::store_path(lib)) {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error: unable to load moderated store: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(group) = store.first_moderated(groups) {
        println!("{}", group);
    }
    ExitCode::SUCCESS
}
