//! Storekeep CLI
//!
//! Command-line interface for Storekeep - local product inventory.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;

use storekeep_core::{Config, Lifecycle, ProductStore, StoreError};

mod commands;
mod logging;
mod output;
mod prompt;

use commands::product::EditFields;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "storekeep")]
#[command(about = "Storekeep - Local product inventory")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new product
    #[command(alias = "create")]
    Add {
        /// Product name
        name: String,
        /// Units in stock
        #[arg(short = 'n', long, default_value_t = 0, allow_negative_numbers = true)]
        quantity: i64,
        /// Unit price
        #[arg(short, long, default_value_t = 0.0, allow_negative_numbers = true)]
        price: f64,
        /// Image file path or URI
        #[arg(short, long)]
        image: Option<String>,
    },
    /// List all products (most recently updated first)
    #[command(alias = "ls")]
    List,
    /// Show product details
    Show {
        /// Product ID
        id: i64,
    },
    /// Edit a product (prompts for each field when no flags are given)
    Edit {
        /// Product ID
        id: i64,
        /// New name
        #[arg(long)]
        name: Option<String>,
        /// New quantity
        #[arg(short = 'n', long, allow_negative_numbers = true)]
        quantity: Option<i64>,
        /// New price
        #[arg(short, long, allow_negative_numbers = true)]
        price: Option<f64>,
        /// New image file path or URI
        #[arg(short, long, conflicts_with = "clear_image")]
        image: Option<String>,
        /// Remove the image reference
        #[arg(long)]
        clear_image: bool,
    },
    /// Delete a product
    #[command(alias = "rm")]
    Delete {
        /// Product ID
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Search products by name (case-insensitive)
    Search {
        /// Text to look for in product names
        query: String,
    },
    /// Show status (database location, readiness, product count)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, database_name, log_level)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), cli.config.as_ref(), &output);
    }

    let config = Config::load_with_cli_override(cli.config.as_ref())
        .context("Failed to load configuration")?;
    logging::init(&config);
    debug!(database = %config.database_path().display(), "Configuration loaded");

    let lifecycle = Lifecycle::new(Arc::new(ProductStore::from_config(&config)));
    let readiness = lifecycle.start().await;

    if matches!(cli.command, Commands::Status) {
        return commands::status::show(&lifecycle, &config, &output);
    }

    let store = match lifecycle.store() {
        Ok(store) => store,
        Err(e) => {
            output.error_banner(
                readiness
                    .error()
                    .unwrap_or("Product storage is not available"),
                e.recovery_suggestion(),
            );
            return Err(e).context("Product operations are disabled for this session");
        }
    };

    let result = match cli.command {
        Commands::Add {
            name,
            quantity,
            price,
            image,
        } => commands::product::add(store, name, quantity, price, image, &output),
        Commands::List => commands::product::list(store, &output),
        Commands::Show { id } => commands::product::show(store, id, &output),
        Commands::Edit {
            id,
            name,
            quantity,
            price,
            image,
            clear_image,
        } => {
            let fields = EditFields {
                name,
                quantity,
                price,
                image,
                clear_image,
            };
            commands::product::edit(store, id, fields, &output)
        }
        Commands::Delete { id, yes } => commands::product::delete(store, id, yes, &output),
        Commands::Search { query } => commands::product::search(store, query, &output),
        Commands::Status | Commands::Config { .. } => unreachable!(), // Handled above
    };

    if let Some(hint) = result.as_ref().err().and_then(retry_hint) {
        output.hint(hint);
    }
    result
}

/// Suggestion for a store failure that may succeed on a second attempt
fn retry_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<StoreError>())
        .filter(|store_err| store_err.is_recoverable())
        .and_then(StoreError::recovery_suggestion)
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_retry_hint_only_for_recoverable_store_errors() {
        let store = ProductStore::in_memory();
        store.initialize().unwrap();
        let failed = store
            .create(&storekeep_core::NewProduct::new("Broken", 1, f64::NAN))
            .unwrap_err();
        let err = anyhow::Error::new(failed).context("Failed to create product");
        assert_eq!(retry_hint(&err), Some("Try the operation again."));

        let gated = ProductStore::in_memory().count().unwrap_err();
        assert!(retry_hint(&anyhow::Error::new(gated)).is_none());

        assert!(retry_hint(&anyhow::anyhow!("Product not found: 7")).is_none());
    }

    #[test]
    fn test_parse_add() {
        let cli = Cli::try_parse_from([
            "storekeep", "add", "Widget", "-n", "10", "--price", "2.50",
        ])
        .unwrap();
        match cli.command {
            Commands::Add {
                name,
                quantity,
                price,
                image,
            } => {
                assert_eq!(name, "Widget");
                assert_eq!(quantity, 10);
                assert_eq!(price, 2.50);
                assert!(image.is_none());
            }
            _ => panic!("expected add"),
        }
    }

    #[test]
    fn test_parse_edit_conflicting_image_flags() {
        let result = Cli::try_parse_from([
            "storekeep",
            "edit",
            "1",
            "--image",
            "a.png",
            "--clear-image",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_global_flags() {
        let cli = Cli::try_parse_from(["storekeep", "ls", "--json"]).unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::List));
    }
}
