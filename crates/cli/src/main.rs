//! French Fromage CLI - the cart and customer account from a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Put two wheels of Comte in the cart
//! fromage cart add gid://shopify/ProductVariant/4401 --title "Comte 18 mois" --price 24.90 -q 2
//!
//! # Show the cart with totals
//! fromage cart show
//!
//! # Log in (password read from stdin)
//! echo "$PASSWORD" | fromage account login marie@camembert.fr
//!
//! # Check whether the stored session is still valid
//! fromage account status
//! ```
//!
//! Cart and session are stored as JSON under `STOREFRONT_DATA_DIR`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use fromage_storefront::config::StorefrontConfig;
use fromage_storefront::state::AppState;
use rust_decimal::Decimal;
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "fromage")]
#[command(author, version, about = "French Fromage storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and change the cart
    Cart {
        #[command(subcommand)]
        action: CartCommand,
    },
    /// Customer account and session
    Account {
        #[command(subcommand)]
        action: AccountCommand,
    },
}

#[derive(Subcommand)]
enum CartCommand {
    /// Show line items and totals
    Show,
    /// Add a variant, merging with an existing line
    Add {
        /// Shopify `ProductVariant` GID
        variant_id: String,

        /// Product title
        #[arg(short, long)]
        title: String,

        /// Unit price as a decimal (e.g. 24.90)
        #[arg(short, long)]
        price: Decimal,

        /// Currency code (defaults to the storefront currency)
        #[arg(short, long)]
        currency: Option<String>,

        /// Units to add
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,

        /// Product handle
        #[arg(long)]
        handle: Option<String>,

        /// Product image URL
        #[arg(long)]
        image_url: Option<String>,

        /// Image alt text
        #[arg(long)]
        alt_text: Option<String>,
    },
    /// One more unit of a variant
    Inc { variant_id: String },
    /// One fewer unit of a variant
    Dec { variant_id: String },
    /// Remove a variant
    Remove { variant_id: String },
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Re-check the stored session against Shopify
    Status,
    /// Log in (password read from stdin)
    Login { email: String },
    /// Create an account (password read from stdin)
    Signup {
        email: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        /// Opt into marketing emails
        #[arg(long)]
        accepts_marketing: bool,
    },
    /// Log out and revoke the access token
    Logout,
    /// Email a password reset link
    Reset { email: String },
    /// Keep re-checking the session and print every change (Ctrl-C to stop)
    Watch,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
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

    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Logs go to stderr so command output stays clean
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fromage_storefront=info,fromage_cli=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let state = AppState::new(&config).expect("Failed to build Storefront API client");

    if let Err(e) = run(cli, &state).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, state: &AppState) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Cart { action } => match action {
            CartCommand::Show => commands::cart::show(state.cart())?,
            CartCommand::Add {
                variant_id,
                title,
                price,
                currency,
                quantity,
                handle,
                image_url,
                alt_text,
            } => {
                let item = commands::cart::NewItem {
                    variant_id,
                    title,
                    price,
                    currency,
                    quantity,
                    handle,
                    image_url,
                    alt_text,
                };
                commands::cart::add(state.cart(), item)?;
            }
            CartCommand::Inc { variant_id } => commands::cart::increment(state.cart(), &variant_id)?,
            CartCommand::Dec { variant_id } => commands::cart::decrement(state.cart(), &variant_id)?,
            CartCommand::Remove { variant_id } => commands::cart::remove(state.cart(), &variant_id)?,
        },
        Commands::Account { action } => match action {
            AccountCommand::Status => commands::account::status(state.session()).await,
            AccountCommand::Login { email } => {
                let password = commands::account::read_password()?;
                commands::account::login(state.session(), &email, &password).await?;
            }
            AccountCommand::Signup {
                email,
                first_name,
                last_name,
                accepts_marketing,
            } => {
                let password = commands::account::read_password()?;
                let input = commands::account::signup_input(
                    email,
                    password,
                    first_name,
                    last_name,
                    accepts_marketing,
                );
                commands::account::signup(state.session(), &input).await?;
            }
            AccountCommand::Logout => commands::account::logout(state.session()).await,
            AccountCommand::Reset { email } => {
                commands::account::reset(state.session(), &email).await?;
            }
            AccountCommand::Watch => commands::account::watch(state).await?,
        },
    }
    Ok(())
}
