//! `mp-cli cart` - the shopping cart.

use std::io::Write;

use clap::Subcommand;

use marketplus_core::{ProductId, VariantId};
use marketplus_storefront::Storefront;
use marketplus_storefront::models::CartProductInput;
use marketplus_storefront::services::{AuthApi, CartAddOutcome, QuantityUpdate};

use crate::error::CliError;

#[derive(Subcommand)]
pub enum CartAction {
    /// Show the cart grouped by seller
    List,
    /// Add a catalog product to the cart
    Add {
        product: ProductId,
        /// Quantity as typed (non-numeric or non-positive means 1)
        #[arg(short, long)]
        quantity: Option<String>,
        /// Variant id (0 means none)
        #[arg(long, default_value_t = VariantId::NONE)]
        variant: VariantId,
        /// Variant label shown in the cart
        #[arg(long)]
        variant_name: Option<String>,
    },
    /// Set the quantity of a line (zero or less removes it)
    Update {
        product: ProductId,
        quantity: String,
        #[arg(long, default_value_t = VariantId::NONE)]
        variant: VariantId,
    },
    /// Remove a line
    Remove {
        product: ProductId,
        #[arg(long, default_value_t = VariantId::NONE)]
        variant: VariantId,
    },
    /// Empty the cart
    Clear,
}

/// Run a `cart` subcommand.
///
/// Stock warnings are printed, not returned as errors.
///
/// # Errors
///
/// Returns an error if the cart or catalog cannot be read or written, or if
/// the product to add does not exist.
pub fn run<A: AuthApi>(
    storefront: &Storefront<A>,
    action: CartAction,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let cart = storefront.cart();
    match action {
        CartAction::List => print_cart(storefront, out)?,
        CartAction::Add {
            product,
            quantity,
            variant,
            variant_name,
        } => {
            let product = storefront
                .catalog()
                .product(product)?
                .ok_or(CliError::ProductNotFound(product))?;
            let mut input = CartProductInput::from(&product).with_variant(variant);
            input.variant_name = variant_name;
            if let Some(quantity) = quantity {
                input = input.with_quantity(quantity);
            }
            let outcome = cart.add_item(input)?;
            writeln!(out, "{}", outcome.message())?;
            if let CartAddOutcome::Added(line) | CartAddOutcome::Merged(line) = &outcome {
                writeln!(out, "Sepette: {} adet", line.quantity)?;
            }
        }
        CartAction::Update {
            product,
            quantity,
            variant,
        } => match cart.update_quantity(product, variant, &quantity)? {
            QuantityUpdate::Updated(line) => {
                writeln!(out, "{}: {} adet", line.name, line.quantity)?;
            }
            QuantityUpdate::Removed => writeln!(out, "Ürün sepetten çıkarıldı.")?,
            QuantityUpdate::NotFound => writeln!(out, "Bu ürün sepette değil.")?,
            QuantityUpdate::Rejected(warning) => writeln!(out, "{warning}")?,
        },
        CartAction::Remove { product, variant } => {
            cart.remove_item(product, variant)?;
            writeln!(out, "Ürün sepetten çıkarıldı.")?;
        }
        CartAction::Clear => {
            cart.clear()?;
            writeln!(out, "Sepet boşaltıldı.")?;
        }
    }
    Ok(())
}

fn print_cart<A: AuthApi>(storefront: &Storefront<A>, out: &mut impl Write) -> Result<(), CliError> {
    let cart = storefront.cart();
    let groups = cart.items_by_seller()?;
    if groups.is_empty() {
        writeln!(out, "Sepetiniz boş.")?;
        return Ok(());
    }

    for (seller, lines) in groups {
        writeln!(out, "{seller}")?;
        for line in lines {
            let variant = line
                .variant_name
                .as_deref()
                .map(|name| format!(" ({name})"))
                .unwrap_or_default();
            writeln!(
                out,
                "  #{}{} {} x {} = {}",
                line.id,
                variant,
                line.name,
                line.quantity,
                line.line_total()
            )?;
        }
    }
    writeln!(out, "Toplam ({} ürün): {}", cart.count()?, cart.total()?)?;
    Ok(())
}
