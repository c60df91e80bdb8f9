//! Merch Cart CLI - the cart widget in a terminal.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart (creates one on first use)
//! merch-cart show
//!
//! # Add two of a variant
//! merch-cart add gid://shopify/ProductVariant/1 -q 2
//!
//! # Change or remove a line
//! merch-cart update gid://shopify/CartLine/1 3
//! merch-cart remove gid://shopify/CartLine/1
//!
//! # Inspect or forget the stored cart ID
//! merch-cart id
//! merch-cart reset
//! ```
//!
//! The cart ID is kept in `<profile-dir>/cart_id`, so a cart survives between
//! invocations until `reset` is run or the file is deleted.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod commands;

use commands::cart::CartAction;

#[derive(Parser)]
#[command(name = "merch-cart")]
#[command(author, version, about = "Merch Cart command-line cart")]
struct Cli {
    /// Directory holding the stored cart ID
    #[arg(
        long,
        global = true,
        env = "MERCH_CART_PROFILE_DIR",
        default_value = ".merch-cart"
    )]
    profile_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the cart, creating one if none is stored
    Show,
    /// Add a product variant to the cart
    Add {
        /// Product variant ID (`gid://shopify/ProductVariant/...`)
        variant_id: String,

        /// Quantity to add
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(1..))]
        quantity: i64,
    },
    /// Change the quantity of a cart line (0 removes it)
    Update {
        /// Cart line ID
        line_id: String,

        /// New quantity
        #[arg(value_parser = clap::value_parser!(i64).range(0..))]
        quantity: i64,
    },
    /// Remove a line from the cart
    Remove {
        /// Cart line ID
        line_id: String,
    },
    /// Print the stored cart ID
    Id,
    /// Forget the stored cart ID; the next command starts a new cart
    Reset,
}

impl From<Commands> for CartAction {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Show => Self::Show,
            Commands::Add {
                variant_id,
                quantity,
            } => Self::Add {
                variant_id,
                quantity,
            },
            Commands::Update { line_id, quantity } => Self::Update { line_id, quantity },
            Commands::Remove { line_id } => Self::Remove { line_id },
            Commands::Id => Self::Id,
            Commands::Reset => Self::Reset,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match commands::cart::run(&cli.profile_dir, cli.command.into()).await {
        Ok(output) => {
            commands::emit(&output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Command failed: {e}");
            if let Some(hint) = e.hint() {
                tracing::error!("{hint}");
            }
            ExitCode::FAILURE
        }
    }
}
