//! GoMarketplace CLI - Inspect and edit the persisted cart.
//!
//! # Usage
//!
//! ```bash
//! # Show the cart
//! gm-cli list
//!
//! # Add a product (increments it if already in the cart)
//! gm-cli add --id p1 --title "Ceramic Mug" --image-url https://cdn.example.com/p1.png --price 9.99
//!
//! # Change quantities
//! gm-cli increment p1
//! gm-cli decrement p1
//!
//! # Create the cart table (postgres builds only)
//! gm-cli migrate
//! ```
//!
//! # Commands
//!
//! - `list` - Print the cart
//! - `add`, `increment`, `decrement` - Change the cart and print the result
//! - `migrate` - Run storage migrations (requires the `postgres` feature)
//!
//! Storage is selected through the `CART_*` environment variables described
//! in `go_marketplace_cart::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use go_marketplace_core::{NewLineItem, Price, ProductId};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::cart::CartCommand;

#[derive(Parser)]
#[command(name = "gm-cli")]
#[command(author, version, about = "GoMarketplace cart tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cart
    List,
    /// Add a product, or increment it if already in the cart
    Add {
        /// Catalog product id
        #[arg(long)]
        id: ProductId,

        /// Display title
        #[arg(long)]
        title: String,

        /// Product image URL
        #[arg(long)]
        image_url: String,

        /// Unit price (e.g. 9.99)
        #[arg(long)]
        price: Price,
    },
    /// Increase a product's quantity by one
    Increment {
        /// Catalog product id
        id: ProductId,
    },
    /// Decrease a product's quantity by one, removing it at zero
    Decrement {
        /// Catalog product id
        id: ProductId,
    },
    /// Run cart storage migrations
    #[cfg(feature = "postgres")]
    Migrate,
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries the cart listing
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "gm_cli=info,go_marketplace_cart=info".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let command = match cli.command {
        Commands::List => CartCommand::List,
        Commands::Add {
            id,
            title,
            image_url,
            price,
        } => CartCommand::Add(NewLineItem {
            id,
            title,
            image_url,
            price,
        }),
        Commands::Increment { id } => CartCommand::Increment(id),
        Commands::Decrement { id } => CartCommand::Decrement(id),
        #[cfg(feature = "postgres")]
        Commands::Migrate => {
            commands::migrate::run().await?;
            return Ok(());
        }
    };
    commands::cart::run(command).await?;
    Ok(())
}
