use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result, bail};
use authorizer_core::{KeyScheme, secret_digest};
use basic_authorizer::{AuthorizerEvent, AuthorizerSettings, Outcome, StoreKind, telemetry};
use clap::{Args, Parser, Subcommand};
use tokio::io::AsyncReadExt;

#[derive(Parser)]
#[command(
    name = "basic-authorizer",
    version,
    about = "Verify HTTP Basic credentials against stored digests"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate an authorizer event and print the policy document
    Authorize(AuthorizeArgs),
    /// Print the digest stored for a secret
    Digest { secret: String },
    /// Print the store key for an identity
    StoreKey {
        identity: String,
        /// Override the key prefix
        #[arg(long)]
        key_prefix: Option<String>,
    },
    /// Print the identity a store key belongs to
    Identity {
        key: String,
        /// Override the key prefix
        #[arg(long)]
        key_prefix: Option<String>,
    },
}

#[derive(Args)]
struct AuthorizeArgs {
    /// Event file, or `-` for stdin
    #[arg(long, default_value = "-")]
    event: String,
    /// Credentials file (file store)
    #[arg(long)]
    store_file: Option<PathBuf>,
    /// Override the key prefix
    #[arg(long)]
    key_prefix: Option<String>,
    /// Override the digest cache capacity
    #[arg(long)]
    cache_capacity: Option<usize>,
    /// Override the per-call store timeout
    #[arg(long)]
    store_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = telemetry::init() {
        eprintln!("failed to initialise telemetry: {err:#}");
    }
    match real_main().await {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("basic-authorizer exited with error: {err:#}");
            process::exit(1);
        }
    }
}

async fn real_main() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Authorize(args) => authorize(args).await,
        Command::Digest { secret } => {
            println!("{}", secret_digest(&secret));
            Ok(0)
        }
        Command::StoreKey {
            identity,
            key_prefix,
        } => {
            let keys = key_prefix.map(KeyScheme::new).unwrap_or_default();
            println!("{}", keys.store_key(&identity));
            Ok(0)
        }
        Command::Identity { key, key_prefix } => {
            let keys = key_prefix.map(KeyScheme::new).unwrap_or_default();
            let Some(identity) = keys.identity(&key) else {
                bail!("`{key}` is not a store key under `{}`", keys.prefix());
            };
            println!("{identity}");
            Ok(0)
        }
    }
}

async fn authorize(args: AuthorizeArgs) -> Result<i32> {
    let settings = settings_with_overrides(&args)?;
    let engine = basic_authorizer::build_engine(&settings).await?;

    let raw = read_event(&args.event).await?;
    let event: AuthorizerEvent =
        serde_json::from_str(&raw).context("failed to parse authorizer event")?;

    match basic_authorizer::authorize_event(&engine, &event).await {
        Ok(policy) => {
            println!("{}", serde_json::to_string(&policy)?);
            Ok(0)
        }
        Err(err) => {
            println!("{}", serde_json::to_string(&err.body())?);
            Ok(match err.outcome() {
                Outcome::Challenge => 2,
                _ => 1,
            })
        }
    }
}

fn settings_with_overrides(args: &AuthorizeArgs) -> Result<AuthorizerSettings> {
    let mut settings = AuthorizerSettings::from_env()?;
    if let Some(path) = &args.store_file {
        settings.store = StoreKind::File(path.clone());
    }
    if let Some(prefix) = &args.key_prefix {
        settings.resolver = settings.resolver.key_prefix(prefix.clone());
    }
    if let Some(capacity) = args.cache_capacity {
        settings.resolver = settings.resolver.cache_capacity(capacity);
    }
    if let Some(millis) = args.store_timeout_ms {
        settings.resolver = settings
            .resolver
            .store_timeout(std::time::Duration::from_millis(millis));
    }
    Ok(settings)
}

async fn read_event(source: &str) -> Result<String> {
    if source == "-" {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("failed to read event from stdin")?;
        return Ok(raw);
    }
    tokio::fs::read_to_string(source)
        .await
        .with_context(|| format!("failed to read event file {source}"))
}
