//! Wallet demo CLI.
//!
//! Drives a [`WalletProvider`] over scripted wallets described in a TOML file
//! and prints how the session state evolves.

#![allow(clippy::print_stdout)] // CLI program intentionally uses stdout

mod config;

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use futures::StreamExt;
use tracing::Level;
use tracing_subscriber::EnvFilter;
use wallet_adapter::prelude::*;

use crate::config::{DemoConfig, IssueLevel, config_path, load_config_from, save_config_to};

/// Wallet demo - run a scripted wallet session
#[derive(Parser)]
#[command(name = "wallet-demo")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file path
    #[arg(short, long, env = "WALLET_DEMO_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration
    Init(InitArgs),

    /// List configured wallets and their readiness
    Wallets,

    /// Connect, sign and disconnect
    Session(SessionArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for the init command
#[derive(Args)]
struct InitArgs {
    /// Force overwrite existing configuration
    #[arg(short, long)]
    force: bool,
}

/// Arguments for the session command
#[derive(Args)]
struct SessionArgs {
    /// Wallet to connect (defaults to the first ready one)
    #[arg(short, long)]
    wallet: Option<String>,

    /// Message to sign
    #[arg(short, long, default_value = "hello from wallet-demo")]
    message: String,

    /// Give up connecting after this many milliseconds
    #[arg(short, long, default_value_t = 2_000)]
    timeout_ms: u64,

    /// Reconnect to the persisted wallet instead of picking one
    #[arg(long)]
    auto_connect: bool,

    /// Stay connected (keeps the persisted selection for the next run)
    #[arg(long)]
    keep: bool,
}

/// Arguments for the config command
#[derive(Args)]
struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommands,
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Show configuration file path
    Path,
    /// Validate configuration
    Validate,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("failed to create tokio runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match rt.block_on(run(cli)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Initialize logging with the given verbosity level.
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "wallet_demo={level},wallet_adapter={level},{}",
            if verbosity >= 2 { "debug" } else { "warn" }
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let path = cli.config.unwrap_or_else(config_path);
    match cli.command {
        Commands::Init(args) => cmd_init(args, &path).await,
        Commands::Wallets => cmd_wallets(&path).await,
        Commands::Session(args) => cmd_session(args, &path).await,
        Commands::Config(args) => cmd_config(args, &path).await,
    }
}

async fn cmd_init(args: InitArgs, path: &Path) -> anyhow::Result<()> {
    if path.exists() && !args.force {
        println!("Configuration already exists at: {}", path.display());
        println!("Use --force to overwrite.");
        return Ok(());
    }

    save_config_to(&DemoConfig::default(), path)
        .await
        .context("failed to write config")?;
    println!("Configuration created: {}", path.display());
    Ok(())
}

async fn cmd_wallets(path: &Path) -> anyhow::Result<()> {
    let config = load(path).await?;
    for spec in &config.wallets {
        let later = spec
            .becomes
            .map(|to| format!(" -> {to} after {} ms", spec.detect_after_ms))
            .unwrap_or_default();
        println!("  {:<12} {}{later}", spec.name, spec.ready_state);
    }
    Ok(())
}

async fn cmd_session(args: SessionArgs, path: &Path) -> anyhow::Result<()> {
    let mut config = load(path).await?;
    if args.auto_connect {
        config.provider.auto_connect = true;
    }

    let adapters: Vec<_> = config.wallets.iter().map(|spec| (spec, spec.build())).collect();
    let store = WalletStore::new(
        WalletProvider::builder()
            .config(config.provider.clone())
            .wallets(adapters.iter().map(|(_, a)| -> SharedWalletAdapter { a.clone() }))
            .build(),
    );

    let mut updates = Box::pin(store.updates());
    let printer = tokio::spawn(async move {
        while let Some(state) = updates.next().await {
            print_state(&state);
        }
    });

    for (spec, adapter) in &adapters {
        if let Some(to) = spec.becomes {
            let adapter = Arc::clone(adapter);
            let after = Duration::from_millis(spec.detect_after_ms);
            tokio::spawn(async move {
                tokio::time::sleep(after).await;
                adapter.set_ready_state(to);
            });
        }
    }

    let timeout = Duration::from_millis(args.timeout_ms);
    if config.provider.auto_connect && store.wallet_name().is_some() {
        let mut rx = store.subscribe();
        tokio::time::timeout(timeout, rx.wait_for(|s| s.connected))
            .await
            .context("auto-connect did not finish in time")??;
    } else {
        let name = match args.wallet {
            Some(name) => name,
            None => match store.ready_wallets().first() {
                Some(wallet) => wallet.name().to_string(),
                None => bail!("no ready wallet configured"),
            },
        };
        store.connect_with_timeout(name, timeout).await?;
    }

    let account = store.account().unwrap_or_default();
    println!("connected as {}", account.address.as_deref().unwrap_or("<unknown>"));

    let signed = store.sign_message(&args.message.as_str().into()).await?;
    println!("signature: {}", signed.signature);

    let payload = TransactionPayload::entry_function(
        "0x1::coin::transfer",
        vec!["0x1::aptos_coin::AptosCoin".to_owned()],
        vec![serde_json::json!(account.address), serde_json::json!("1")],
    );
    let submitted = store.sign_and_submit_transaction(&payload, None).await?;
    println!("submitted: {}", submitted.hash);

    if !args.keep {
        store.disconnect().await?;
    }
    store.provider().unload();

    // Let the printer drain the last updates before exiting.
    tokio::time::sleep(Duration::from_millis(20)).await;
    printer.abort();
    Ok(())
}

async fn cmd_config(args: ConfigArgs, path: &Path) -> anyhow::Result<()> {
    match args.command {
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Show => {
            let config = load(path).await?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigCommands::Validate => {
            let config = load(path).await?;
            let issues = config.validate();
            if issues.is_empty() {
                println!("Configuration is valid.");
            }
            for issue in &issues {
                println!("{issue}");
            }
            if issues.iter().any(|i| i.level == IssueLevel::Error) {
                bail!("configuration has errors");
            }
        }
    }
    Ok(())
}

async fn load(path: &Path) -> anyhow::Result<DemoConfig> {
    let config = load_config_from(path)
        .await
        .with_context(|| format!("failed to load {}", path.display()))?;
    if !config.is_valid() {
        bail!("invalid configuration, run `wallet-demo config validate`");
    }
    Ok(config)
}

fn print_state(state: &SessionState) {
    let wallet = state
        .selected_name()
        .map_or_else(|| "-".to_owned(), ToString::to_string);
    let flags = [
        (state.connecting, "connecting"),
        (state.connected, "connected"),
        (state.disconnecting, "disconnecting"),
    ]
    .iter()
    .filter(|(on, _)| *on)
    .map(|(_, name)| *name)
    .collect::<Vec<_>>()
    .join(",");
    let network = state
        .network
        .as_ref()
        .and_then(|n| n.name)
        .map_or_else(|| "-".to_owned(), |n| format!("{n:?}"));
    println!("  [state] wallet={wallet} flags=[{flags}] network={network}");
}
