//! Status command handler

use anyhow::Result;

use storekeep_core::{Config, InitState, Lifecycle};

use crate::output::{Output, OutputFormat};

/// Show store location, readiness and contents
///
/// Runs even when initialization failed, so the failure can be inspected.
pub fn show(lifecycle: &Lifecycle, config: &Config, output: &Output) -> Result<()> {
    let readiness = lifecycle.readiness();
    let count = lifecycle
        .store()
        .ok()
        .and_then(|store| store.count().ok());
    let state = state_label(&readiness.state);

    match output.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "database": config.database_path(),
                    "ready": readiness.is_ready(),
                    "error": readiness.error(),
                    "products": count
                })
            );
        }
        OutputFormat::Quiet => {
            println!("{}", state);
        }
        OutputFormat::Human => {
            println!("Storekeep Status");
            println!("================");
            println!();
            println!("Storage:");
            println!("  Database: {}", config.database_path().display());
            println!("  State:    {}", state);
            if let Some(error) = readiness.error() {
                println!("  Error:    {}", error);
            }
            println!();
            println!("Contents:");
            match count {
                Some(count) => println!("  Products: {}", count),
                None => println!("  Products: (unavailable)"),
            }
        }
    }

    Ok(())
}

fn state_label(state: &InitState) -> &'static str {
    match state {
        InitState::Uninitialized => "uninitialized",
        InitState::Initializing => "initializing",
        InitState::Ready => "ready",
        InitState::Failed(_) => "failed",
    }
}
