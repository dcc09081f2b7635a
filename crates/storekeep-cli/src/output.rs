//! Output formatting for CLI
//!
//! Provides consistent output formatting across all commands:
//! - Human-readable default output
//! - JSON output (--json flag)
//! - Quiet mode for scripting (--quiet flag)

use storekeep_core::Product;

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    Human,
    /// JSON output
    Json,
    /// Quiet mode - minimal output
    Quiet,
}

impl OutputFormat {
    /// Create format from CLI flags
    pub fn from_flags(json: bool, quiet: bool) -> Self {
        if quiet {
            OutputFormat::Quiet
        } else if json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        }
    }
}

/// Output helper for consistent formatting
pub struct Output {
    /// The output format
    pub format: OutputFormat,
}

impl Output {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Print a single product
    pub fn print_product(&self, product: &Product) {
        match self.format {
            OutputFormat::Human => {
                println!("ID:       {}", product.id);
                println!("Name:     {}", product.name);
                println!("Quantity: {}", product.quantity);
                println!("Price:    {}", format_price(product.price));
                if let Some(ref uri) = product.image_uri {
                    println!("Image:    {}", uri);
                }
                println!("Created:  {}", product.created_at.format("%Y-%m-%d %H:%M"));
                println!("Updated:  {}", product.updated_at.format("%Y-%m-%d %H:%M"));
            }
            OutputFormat::Json => print_json(product),
            OutputFormat::Quiet => {
                println!("{}", product.id);
            }
        }
    }

    /// Print a list of products
    pub fn print_products(&self, products: &[Product]) {
        match self.format {
            OutputFormat::Human => {
                if products.is_empty() {
                    println!("No products found.");
                    return;
                }
                for product in products {
                    let image_indicator = if product.image_uri.is_some() { " [img]" } else { "" };
                    println!(
                        "{:>5} | {:<35} | {:>6} | {:>10}{}",
                        product.id,
                        truncate(&product.name, 35),
                        product.quantity,
                        format_price(product.price),
                        image_indicator
                    );
                }
                println!("\n{} product(s)", products.len());
            }
            OutputFormat::Json => print_json(products),
            OutputFormat::Quiet => {
                for product in products {
                    println!("{}", product.id);
                }
            }
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.format {
            OutputFormat::Human => println!("✓ {}", message),
            OutputFormat::Json => {
                println!(
                    "{}",
                    serde_json::json!({"status": "success", "message": message})
                );
            }
            OutputFormat::Quiet => {}
        }
    }

    /// Print a persistent error banner to stderr
    ///
    /// Shown in every format, including quiet mode.
    pub fn error_banner(&self, message: &str, hint: Option<&str>) {
        match self.format {
            OutputFormat::Json => {
                eprintln!(
                    "{}",
                    serde_json::json!({"status": "error", "message": message, "hint": hint})
                );
            }
            OutputFormat::Human | OutputFormat::Quiet => {
                eprintln!("✗ {}", message);
                if let Some(hint) = hint {
                    eprintln!("  {}", hint);
                }
            }
        }
    }

    /// Print a follow-up suggestion after a failed command
    pub fn hint(&self, hint: &str) {
        if self.format == OutputFormat::Human {
            eprintln!("hint: {}", hint);
        }
    }

    /// Check if we should prompt for confirmation
    pub fn should_prompt(&self) -> bool {
        self.format == OutputFormat::Human
    }

    /// Print an informational message
    pub fn message(&self, msg: &str) {
        match self.format {
            OutputFormat::Human => println!("{}", msg),
            OutputFormat::Json => {
                println!("{}", serde_json::json!({"message": msg}));
            }
            OutputFormat::Quiet => {}
        }
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("Failed to serialize output: {}", e),
    }
}

/// Format a price with two decimals
pub fn format_price(price: f64) -> String {
    format!("{:.2}", price)
}

/// Truncate a string to max characters, adding "..." if truncated
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
