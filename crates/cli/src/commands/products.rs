//! `mp-cli products` - seller catalog management.

use std::io::Write;

use clap::{Args, Subcommand};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use tracing::info;

use marketplus_core::{Price, ProductId};
use marketplus_storefront::Storefront;
use marketplus_storefront::models::{NewProduct, Product, ProductPatch};
use marketplus_storefront::services::AuthApi;

use crate::error::CliError;

#[derive(Subcommand)]
pub enum ProductsAction {
    /// List every product
    List,
    /// Show one product as JSON
    Show {
        id: ProductId,
    },
    /// Add a product
    Add(AddProduct),
    /// Change fields of a product
    Update {
        id: ProductId,
        #[command(flatten)]
        fields: ProductFields,
    },
    /// Delete a product
    Delete {
        id: ProductId,
    },
    /// List products in a category (case-insensitive)
    Category {
        name: String,
    },
    /// List products of one seller
    Seller {
        name: String,
    },
}

#[derive(Args)]
pub struct AddProduct {
    /// Product name
    #[arg(short, long)]
    name: String,

    /// Category
    #[arg(short, long, default_value = "")]
    category: String,

    /// Seller (store) name
    #[arg(short, long, default_value = "")]
    seller: String,

    /// Unit price in TL
    #[arg(short, long)]
    price: Decimal,

    /// Units in stock
    #[arg(long)]
    stock: Option<u32>,

    /// Image URL
    #[arg(long)]
    image: Option<String>,

    /// Description
    #[arg(long)]
    description: Option<String>,
}

#[derive(Args)]
pub struct ProductFields {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    seller: Option<String>,
    #[arg(long)]
    price: Option<Decimal>,
    #[arg(long)]
    stock: Option<u32>,
    #[arg(long)]
    image: Option<String>,
    #[arg(long)]
    description: Option<String>,
}

fn extra_fields(image: Option<String>, description: Option<String>) -> Map<String, Value> {
    let mut extra = Map::new();
    if let Some(image) = image {
        extra.insert("image".into(), Value::String(image));
    }
    if let Some(description) = description {
        extra.insert("description".into(), Value::String(description));
    }
    extra
}

/// Run a `products` subcommand.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read or written, or if a named
/// product does not exist.
pub fn run<A: AuthApi>(
    storefront: &Storefront<A>,
    action: ProductsAction,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let catalog = storefront.catalog();
    match action {
        ProductsAction::List => print_products(out, &catalog.products()?)?,
        ProductsAction::Show { id } => {
            let product = catalog.product(id)?.ok_or(CliError::ProductNotFound(id))?;
            let json = serde_json::to_string_pretty(&product).map_err(std::io::Error::other)?;
            writeln!(out, "{json}")?;
        }
        ProductsAction::Add(args) => {
            let product = catalog.add_product(NewProduct {
                name: args.name,
                category: args.category,
                seller: args.seller,
                price: Price::new(args.price),
                stock_quantity: args.stock,
                extra: extra_fields(args.image, args.description),
            })?;
            info!(product_id = %product.id, "Product listed");
            writeln!(out, "Ürün eklendi: #{} {}", product.id, product.name)?;
        }
        ProductsAction::Update { id, fields } => {
            let patch = ProductPatch {
                name: fields.name,
                category: fields.category,
                seller: fields.seller,
                price: fields.price.map(Price::new),
                stock_quantity: fields.stock,
                extra: extra_fields(fields.image, fields.description),
                ..ProductPatch::default()
            };
            let product = catalog
                .update_product(id, patch)?
                .ok_or(CliError::ProductNotFound(id))?;
            writeln!(out, "Ürün güncellendi: #{} {}", product.id, product.name)?;
        }
        ProductsAction::Delete { id } => {
            catalog.delete_product(id)?;
            writeln!(out, "Ürün silindi: #{id}")?;
        }
        ProductsAction::Category { name } => {
            print_products(out, &catalog.products_by_category(&name)?)?;
        }
        ProductsAction::Seller { name } => {
            print_products(out, &catalog.seller_products(&name)?)?;
        }
    }
    Ok(())
}

fn print_products(out: &mut impl Write, products: &[Product]) -> Result<(), CliError> {
    if products.is_empty() {
        writeln!(out, "Ürün bulunamadı.")?;
        return Ok(());
    }
    for product in products {
        let stock = product
            .stock_quantity
            .map_or_else(|| "-".to_string(), |n| n.to_string());
        writeln!(
            out,
            "#{} {} | {} | {} | {} | stok: {}",
            product.id, product.name, product.category, product.seller, product.price, stock
        )?;
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::commands::test_support::{output, storefront};

    fn add(name: &str, category: &str, price: i64) -> ProductsAction {
        ProductsAction::Add(AddProduct {
            name: name.to_string(),
            category: category.to_string(),
            seller: "Atölye".to_string(),
            price: Decimal::from(price),
            stock: Some(4),
            image: None,
            description: Some("El yapımı".to_string()),
        })
    }

    #[test]
    fn test_add_and_list() {
        let storefront = storefront();
        let added = output(|out| run(&storefront, add("Kupa", "Ev", 90), out));
        assert_eq!(added, "Ürün eklendi: #1 Kupa\n");

        let listed = output(|out| run(&storefront, ProductsAction::List, out));
        assert_eq!(listed, "#1 Kupa | Ev | Atölye | 90 TL | stok: 4\n");

        let product = storefront.catalog().product(ProductId::new(1)).unwrap().unwrap();
        assert_eq!(product.extra.get("description"), Some(&Value::from("El yapımı")));
    }

    #[test]
    fn test_update_missing_product() {
        let storefront = storefront();
        let mut buf = Vec::new();
        let err = run(
            &storefront,
            ProductsAction::Update {
                id: ProductId::new(7),
                fields: ProductFields {
                    name: Some("Yeni".to_string()),
                    category: None,
                    seller: None,
                    price: None,
                    stock: None,
                    image: None,
                    description: None,
                },
            },
            &mut buf,
        )
        .unwrap_err();
        assert!(matches!(err, CliError::ProductNotFound(id) if id == ProductId::new(7)));
    }

    #[test]
    fn test_category_filter() {
        let storefront = storefront();
        output(|out| run(&storefront, add("Kupa", "Ev", 90), out));
        output(|out| run(&storefront, add("Kalem", "Kırtasiye", 10), out));

        let listed = output(|out| {
            run(
                &storefront,
                ProductsAction::Category {
                    name: "ev".to_string(),
                },
                out,
            )
        });
        assert!(listed.contains("Kupa"));
        assert!(!listed.contains("Kalem"));

        let none = output(|out| {
            run(
                &storefront,
                ProductsAction::Seller {
                    name: "Başka".to_string(),
                },
                out,
            )
        });
        assert_eq!(none, "Ürün bulunamadı.\n");
    }
}
