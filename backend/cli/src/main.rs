mod simulate;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use singlefile_config::{config_dir, config_file_path, load_and_prepare, write_config, CaptureConfig};
use singlefile_hooks::HOOKS_FRAMES_WEB_SCRIPT;
use singlefile_logging::{init_logger, BridgeEventLogger, LoggerOptions};

use simulate::{ExtensionHost, FontRegistration, Phase, SimulatedPage};

#[derive(Parser)]
#[command(name = "singlefile-hooks")]
#[command(about = "Page-capture hook bridge: font interception and deferred-image signaling")]
#[command(version)]
struct Cli {
    /// Config file (defaults to ~/.singlefile/hooks.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Base URL the host resolves internal resource paths against
    #[arg(long, global = true, default_value = "chrome-extension://singlefile")]
    extension_base: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the events broadcast for one deferred-image phase
    Signals {
        #[arg(value_enum)]
        phase: Phase,
        #[arg(long)]
        block_cookies: bool,
        #[arg(long)]
        block_storage: bool,
        #[arg(long)]
        keep_zoom_level: bool,
    },
    /// Replay font registrations through a hooked page and print the collected fonts
    Fonts {
        /// JSON array of { family, src | srcBase64, descriptors }
        file: PathBuf,
        /// Seconds to wait for binary sources to be converted
        #[arg(long, default_value_t = 5)]
        timeout_secs: u64,
    },
    /// Print the effective configuration
    Config {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| config_file_path(&config_dir()));

    let (config, report) = load_and_prepare(&config_path).await?;

    init_logger(&LoggerOptions {
        level: config.logging.level_or_default(),
        json: config.logging.json,
        log_dir: config.logging.dir.as_deref(),
    })?;
    report.log();
    if !report.is_valid() {
        bail!("Config at {} has {} error(s)", config_path.display(), report.errors.len());
    }

    let hooks_script_path = config
        .hooks_script_path
        .as_deref()
        .unwrap_or(HOOKS_FRAMES_WEB_SCRIPT);
    let host = ExtensionHost::new(cli.extension_base.clone());

    match cli.command {
        Commands::Signals { phase, block_cookies, block_storage, keep_zoom_level } => {
            let base = config.deferred_images_options();
            let options = base
                .block_cookies(base.load_deferred_images_block_cookies || block_cookies)
                .block_storage(base.load_deferred_images_block_storage || block_storage)
                .keep_zoom_level(base.load_deferred_images_keep_zoom_level || keep_zoom_level);

            let page = SimulatedPage::new(&host, hooks_script_path);
            BridgeEventLogger::attach(page.events());
            for name in page.signals(phase, &options) {
                println!("{name}");
            }
        }
        Commands::Fonts { file, timeout_secs } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read fonts file: {}", file.display()))?;
            let registrations: Vec<FontRegistration> = serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse fonts file: {}", file.display()))?;
            info!(count = registrations.len(), "Replaying font registrations");

            let page = SimulatedPage::new(&host, hooks_script_path);
            BridgeEventLogger::attach(page.events());
            let fonts = page
                .replay_fonts(&registrations, Duration::from_secs(timeout_secs))
                .await?;
            println!("{}", serde_json::to_string_pretty(&fonts)?);
        }
        Commands::Config { init } => {
            if init {
                if config_path.exists() {
                    info!(path = %config_path.display(), "Config file already exists");
                } else {
                    write_config(&CaptureConfig::default(), &config_path).await?;
                }
            }
            print!("{}", serde_yaml::to_string(&config)?);
        }
    }

    Ok(())
}
