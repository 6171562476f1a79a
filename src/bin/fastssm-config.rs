//! # FastSSM Configuration Validator
//!
//! Command-line tool for checking provider configuration before it reaches a
//! plan. Loads the layered configuration, validates it, and prints the
//! resolved settings with secrets masked.

use clap::{Parser, Subcommand};
use fastssm::config::{ConfigLoader, ProviderConfig};
use std::path::PathBuf;
use std::process;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "fastssm-config")]
#[command(about = "Validate FastSSM provider configuration")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    /// Configuration file (defaults to $FASTSSM_CONFIG_PATH, then environment only)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output level (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load and validate configuration
    Validate,

    /// Print the resolved configuration as JSON, secrets masked
    Show,

    /// Print the effective retry and deadline settings
    Retry,
}

fn main() {
    let cli = Cli::parse();

    // An explicit filter directive gets the provider's own logging setup
    if std::env::var_os("FASTSSM_LOG").is_some() {
        fastssm::logging::init_structured_logging();
    } else {
        let level = match cli.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        };

        let _subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }

    let result = load(&cli).and_then(|config| match &cli.command {
        Some(Commands::Show) => show(&config),
        Some(Commands::Retry) => show_retry(&config),
        Some(Commands::Validate) | None => validate(&config),
    });

    match result {
        Ok(()) => {
            info!("Configuration check completed successfully");
            process::exit(0);
        }
        Err(e) => {
            error!("Configuration check failed: {}", e);
            println!("❌ {e}");
            process::exit(1);
        }
    }
}

fn load(cli: &Cli) -> anyhow::Result<ProviderConfig> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };
    Ok(config)
}

fn validate(config: &ProviderConfig) -> anyhow::Result<()> {
    println!("🔧 Validating FastSSM Configuration");
    config.validate()?;

    println!(
        "   ✅ Region: {}",
        config.region.as_deref().unwrap_or("<sdk default>")
    );
    println!("   ✅ Credentials: {:?}", config.credential_source());
    if let Some(endpoint) = &config.endpoints.ssm {
        println!("   ✅ SSM endpoint: {endpoint}");
    }
    if let Some(endpoint) = &config.endpoints.sts {
        println!("   ✅ STS endpoint: {endpoint}");
    }
    if config.skip_credentials_validation {
        println!("   ⚠️  Credential validation will be skipped");
    }
    if let Some(capacity) = config.token_bucket_rate_limiter_capacity {
        println!("   ✅ Local rate limiter capacity: {capacity}");
    }

    println!("\n🎉 Configuration is valid!");
    Ok(())
}

fn show(config: &ProviderConfig) -> anyhow::Result<()> {
    config.validate()?;
    println!("{}", serde_json::to_string_pretty(&config.sanitized())?);
    Ok(())
}

fn show_retry(config: &ProviderConfig) -> anyhow::Result<()> {
    config.validate()?;
    let backoff = config.retry.to_backoff();
    let timeouts = config.operation_timeouts();

    println!("⏱️  Retry Settings");
    match config.effective_max_attempts() {
        Some(attempts) => println!("   SDK max attempts: {attempts}"),
        None => println!("   SDK max attempts: <sdk default>"),
    }
    if let Some(mode) = config.retry_mode {
        println!("   SDK retry mode: {mode}");
    }
    println!("   Backoff: {:?} doubling to {:?}", backoff.base, backoff.max);
    println!(
        "   Throttle cooldown: {}s",
        config.retry.throttle_cooldown_seconds
    );
    println!(
        "   Deadlines: read {:?}, write {:?}, describe {:?}",
        timeouts.read, timeouts.write, timeouts.describe
    );
    Ok(())
}
