//! Product command handlers

use anyhow::{bail, Context, Result};

use storekeep_core::{NewProduct, Product, ProductPatch, ProductStore, WriteOutcome};

use crate::output::{format_price, Output};
use crate::prompt::{confirm, is_interactive, prompt_with_default};

/// Field changes requested on the command line
#[derive(Debug, Default)]
pub struct EditFields {
    pub name: Option<String>,
    pub quantity: Option<i64>,
    pub price: Option<f64>,
    pub image: Option<String>,
    pub clear_image: bool,
}

/// Create a new product
pub fn add(
    store: &ProductStore,
    name: String,
    quantity: i64,
    price: f64,
    image: Option<String>,
    output: &Output,
) -> Result<()> {
    let mut data = NewProduct::new(
        validate_name(&name)?,
        validate_quantity(quantity)?,
        validate_price(price)?,
    );
    if let Some(uri) = image {
        data = data.with_image_uri(uri);
    }

    let id = store.create(&data).context("Failed to create product")?;
    let product = find(store, id)?;

    output.success(&format!("Created product: {}", id));
    output.print_product(&product);
    Ok(())
}

/// List all products
pub fn list(store: &ProductStore, output: &Output) -> Result<()> {
    let products = store.get_all()?;
    output.print_products(&products);
    Ok(())
}

/// Show a single product
pub fn show(store: &ProductStore, id: i64, output: &Output) -> Result<()> {
    let product = find(store, id)?;
    output.print_product(&product);
    Ok(())
}

/// Edit a product
///
/// With no field flags on an interactive terminal, prompts for each field.
pub fn edit(store: &ProductStore, id: i64, fields: EditFields, output: &Output) -> Result<()> {
    let mut patch = build_patch(fields)?;

    if patch.is_empty() && output.should_prompt() && is_interactive() {
        let current = find(store, id)?;
        patch = prompt_patch(&current)?;
    }

    match store.update(id, &patch).context("Failed to update product")? {
        WriteOutcome::Applied => {
            output.success("Product updated");
            output.print_product(&find(store, id)?);
        }
        WriteOutcome::Skipped => output.message("No changes."),
        WriteOutcome::NoMatchingRow => bail!("Product not found: {}", id),
    }

    Ok(())
}

/// Delete a product
pub fn delete(store: &ProductStore, id: i64, assume_yes: bool, output: &Output) -> Result<()> {
    let product = find(store, id)?;

    if !assume_yes && output.should_prompt() {
        println!(
            "Delete product: {} - {} (qty {})",
            product.id, product.name, product.quantity
        );
        if !confirm("Are you sure?")? {
            output.message("Cancelled.");
            return Ok(());
        }
    }

    if !store
        .delete(id)
        .context("Failed to delete product")?
        .is_applied()
    {
        bail!("Product not found: {}", id);
    }

    output.success(&format!("Deleted product: {}", id));
    Ok(())
}

/// Search products by name
pub fn search(store: &ProductStore, query: String, output: &Output) -> Result<()> {
    let products = matching(store, &query)?;
    output.print_products(&products);
    Ok(())
}

/// A blank query lists everything. Any other query is matched as typed,
/// surrounding spaces included.
fn matching(store: &ProductStore, query: &str) -> Result<Vec<Product>> {
    let products = if query.trim().is_empty() {
        store.get_all()?
    } else {
        store.search(query)?
    };
    Ok(products)
}

fn find(store: &ProductStore, id: i64) -> Result<Product> {
    store
        .get_by_id(id)?
        .ok_or_else(|| anyhow::anyhow!("Product not found: {}", id))
}

/// Turn command-line flags into a validated patch
fn build_patch(fields: EditFields) -> Result<ProductPatch> {
    let mut patch = ProductPatch::new();

    if let Some(name) = fields.name {
        patch = patch.with_name(validate_name(&name)?);
    }
    if let Some(quantity) = fields.quantity {
        patch = patch.with_quantity(validate_quantity(quantity)?);
    }
    if let Some(price) = fields.price {
        patch = patch.with_price(validate_price(price)?);
    }
    if fields.clear_image {
        patch = patch.clear_image_uri();
    } else if let Some(image) = fields.image {
        patch = if image.is_empty() {
            patch.clear_image_uri()
        } else {
            patch.with_image_uri(image)
        };
    }

    Ok(patch)
}

/// Ask for each field, keeping the current value on empty input
fn prompt_patch(current: &Product) -> Result<ProductPatch> {
    println!("Editing product: {}", current.id);
    println!("Press Enter to keep current value, or type new value.\n");

    let mut patch = ProductPatch::new();

    if let Some(name) = prompt_with_default("Name", &current.name)? {
        if name != current.name {
            patch = patch.with_name(validate_name(&name)?);
        }
    }

    if let Some(input) = prompt_with_default("Quantity", &current.quantity.to_string())? {
        let quantity = parse_quantity(&input)?;
        if quantity != current.quantity {
            patch = patch.with_quantity(quantity);
        }
    }

    if let Some(input) = prompt_with_default("Price", &format_price(current.price))? {
        let price = parse_price(&input)?;
        if price != current.price {
            patch = patch.with_price(price);
        }
    }

    let current_image = current.image_uri.as_deref().unwrap_or("");
    if let Some(image) = prompt_with_default("Image (\"-\" to remove)", current_image)? {
        if image == "-" {
            if current.image_uri.is_some() {
                patch = patch.clear_image_uri();
            }
        } else if image != current_image {
            patch = patch.with_image_uri(image);
        }
    }

    Ok(patch)
}

fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Product name cannot be empty");
    }
    Ok(name.to_string())
}

fn validate_quantity(quantity: i64) -> Result<i64> {
    if quantity < 0 {
        bail!("Quantity cannot be negative: {}", quantity);
    }
    Ok(quantity)
}

fn validate_price(price: f64) -> Result<f64> {
    if !price.is_finite() || price < 0.0 {
        bail!("Price must be a non-negative number: {}", price);
    }
    Ok(price)
}

fn parse_quantity(input: &str) -> Result<i64> {
    let quantity = input
        .trim()
        .parse::<i64>()
        .with_context(|| format!("Invalid quantity: '{}'", input))?;
    validate_quantity(quantity)
}

fn parse_price(input: &str) -> Result<f64> {
    let price = input
        .trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid price: '{}'", input))?;
    validate_price(price)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::OutputFormat;

    fn ready_store() -> ProductStore {
        let store = ProductStore::in_memory();
        store.initialize().unwrap();
        store
    }

    fn quiet() -> Output {
        Output::new(OutputFormat::Quiet)
    }

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  Widget ").unwrap(), "Widget");
        assert!(validate_name("   ").is_err());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn test_validate_numbers() {
        assert_eq!(validate_quantity(0).unwrap(), 0);
        assert!(validate_quantity(-1).is_err());
        assert_eq!(validate_price(2.5).unwrap(), 2.5);
        assert!(validate_price(-0.01).is_err());
        assert!(validate_price(f64::NAN).is_err());
        assert!(validate_price(f64::INFINITY).is_err());
    }

    #[test]
    fn test_parse_inputs() {
        assert_eq!(parse_quantity(" 12 ").unwrap(), 12);
        assert!(parse_quantity("twelve").is_err());
        assert!(parse_quantity("-3").is_err());
        assert_eq!(parse_price("9.99").unwrap(), 9.99);
        assert!(parse_price("abc").is_err());
    }

    #[test]
    fn test_build_patch_empty() {
        assert!(build_patch(EditFields::default()).unwrap().is_empty());
    }

    #[test]
    fn test_build_patch_fields() {
        let patch = build_patch(EditFields {
            name: Some(" Gadget ".to_string()),
            quantity: Some(3),
            image: Some("file:///g.png".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(patch.name.as_deref(), Some("Gadget"));
        assert_eq!(patch.quantity, Some(3));
        assert!(patch.price.is_none());
        assert_eq!(patch.image_uri, Some(Some("file:///g.png".to_string())));
    }

    #[test]
    fn test_build_patch_clear_image() {
        let patch = build_patch(EditFields {
            clear_image: true,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(patch.image_uri, Some(None));

        let patch = build_patch(EditFields {
            image: Some(String::new()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(patch.image_uri, Some(None));
    }

    #[test]
    fn test_build_patch_rejects_invalid() {
        assert!(build_patch(EditFields {
            price: Some(-1.0),
            ..Default::default()
        })
        .is_err());
    }

    #[test]
    fn test_add_rejects_invalid_before_store() {
        let store = ready_store();
        let result = add(&store, " ".to_string(), 1, 1.0, None, &quiet());
        assert!(result.is_err());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_add_edit_delete_flow() {
        let store = ready_store();
        let output = quiet();

        add(&store, "Widget".to_string(), 10, 2.5, None, &output).unwrap();
        let id = store.get_all().unwrap()[0].id;

        edit(
            &store,
            id,
            EditFields {
                quantity: Some(4),
                ..Default::default()
            },
            &output,
        )
        .unwrap();
        assert_eq!(store.get_by_id(id).unwrap().unwrap().quantity, 4);

        delete(&store, id, true, &output).unwrap();
        assert!(store.get_by_id(id).unwrap().is_none());
    }

    #[test]
    fn test_search_query_is_not_trimmed() {
        let store = ready_store();
        store.create(&NewProduct::new("Laptop", 1, 999.0)).unwrap();
        store.create(&NewProduct::new("Desk", 2, 150.0)).unwrap();

        let found = matching(&store, "top").unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Laptop");
        assert!(matching(&store, "top ").unwrap().is_empty());
        assert!(matching(&store, " lap").unwrap().is_empty());
        search(&store, "top".to_string(), &quiet()).unwrap();
    }

    #[test]
    fn test_blank_search_lists_everything() {
        let store = ready_store();
        store.create(&NewProduct::new("Laptop", 1, 999.0)).unwrap();
        store.create(&NewProduct::new("Desk", 2, 150.0)).unwrap();

        assert_eq!(matching(&store, "   ").unwrap().len(), 2);
        assert_eq!(matching(&store, "").unwrap().len(), 2);
    }

    #[test]
    fn test_missing_product_errors() {
        let store = ready_store();
        let output = quiet();

        assert!(show(&store, 7, &output).is_err());
        assert!(delete(&store, 7, true, &output).is_err());
        assert!(edit(
            &store,
            7,
            EditFields {
                name: Some("X".to_string()),
                ..Default::default()
            },
            &output
        )
        .is_err());
    }
}
