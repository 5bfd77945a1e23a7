//! MarketPlus CLI - the storefront from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # List a product as a seller
//! mp-cli products add -n "Seramik Kupa" -c Ev -s "Atölye" -p 90 --stock 5
//!
//! # Put it in the cart and review the cart
//! mp-cli cart add 1 --quantity 2
//! mp-cli cart list
//!
//! # Log in (password may also come from MARKETPLUS_PASSWORD)
//! mp-cli auth login -e ayse@example.com -p ...
//! mp-cli auth whoami
//! ```
//!
//! # Commands
//!
//! - `products` - Seller catalog management
//! - `cart` - Shopping cart
//! - `favorites` - Favorites list
//! - `auth` - Login, registration and profile

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::io::Write;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use marketplus_storefront::Storefront;
use marketplus_storefront::collection::CorruptDataPolicy;
use marketplus_storefront::config::StorefrontConfig;

mod commands;
mod error;

use commands::{auth::AuthAction, cart::CartAction, favorites::FavoritesAction, products::ProductsAction};
use error::CliError;

#[derive(Parser)]
#[command(name = "mp-cli")]
#[command(author, version, about = "MarketPlus storefront CLI")]
struct Cli {
    /// Data directory (overrides MARKETPLUS_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Malformed data handling, `reset` or `fail` (overrides MARKETPLUS_CORRUPT_DATA)
    #[arg(long, global = true)]
    corrupt_data: Option<CorruptDataPolicy>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the product catalog
    Products {
        #[command(subcommand)]
        action: ProductsAction,
    },
    /// Manage the shopping cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage favorites
    Favorites {
        #[command(subcommand)]
        action: FavoritesAction,
    },
    /// Account and session
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
}

fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match StorefrontConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            // Tracing is not initialized yet
            let _ = writeln!(std::io::stderr(), "Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr; stdout is command output
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketplus_storefront=info,marketplus_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if let Err(e) = run(cli, config).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut config: StorefrontConfig) -> Result<(), CliError> {
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(policy) = cli.corrupt_data {
        config.corrupt_data = policy;
    }

    let storefront = Storefront::open(config)?;
    let mut changes = storefront.subscribe();
    let mut out = std::io::stdout().lock();

    match cli.command {
        Commands::Products { action } => commands::products::run(&storefront, action, &mut out)?,
        Commands::Cart { action } => commands::cart::run(&storefront, action, &mut out)?,
        Commands::Favorites { action } => {
            commands::favorites::run(&storefront, action, &mut out)?;
        }
        Commands::Auth { action } => commands::auth::run(&storefront, action, &mut out).await?,
    }

    while let Ok(change) = changes.try_recv() {
        tracing::debug!(?change, "State changed");
    }
    Ok(())
}
