//! `mp-cli favorites` - the favorites list.

use std::io::Write;

use clap::Subcommand;

use marketplus_core::ProductId;
use marketplus_storefront::Storefront;
use marketplus_storefront::models::FavoriteInput;
use marketplus_storefront::services::{AuthApi, FavoriteAdd};

use crate::error::CliError;

#[derive(Subcommand)]
pub enum FavoritesAction {
    /// List favorites, oldest first
    List,
    /// Mark a catalog product as favorite
    Add { product: ProductId },
    /// Unmark a product
    Remove { product: ProductId },
    /// Add the product if it is not a favorite, remove it otherwise
    Toggle { product: ProductId },
}

/// Run a `favorites` subcommand.
///
/// # Errors
///
/// Returns an error if favorites or the catalog cannot be read or written,
/// or if the product to add does not exist.
pub fn run<A: AuthApi>(
    storefront: &Storefront<A>,
    action: FavoritesAction,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let favorites = storefront.favorites();
    match action {
        FavoritesAction::List => {
            let items = favorites.items()?;
            if items.is_empty() {
                writeln!(out, "Favori ürününüz yok.")?;
            }
            for item in items {
                writeln!(
                    out,
                    "#{} {} | {} | {}",
                    item.id,
                    item.name,
                    item.price,
                    item.added_at.format("%Y-%m-%d %H:%M")
                )?;
            }
        }
        FavoritesAction::Add { product } => {
            let input = favorite_input(storefront, product)?;
            match favorites.add_item(input)? {
                FavoriteAdd::Added(_) => writeln!(out, "Favorilere eklendi")?,
                FavoriteAdd::AlreadyPresent => writeln!(out, "Zaten favorilerde")?,
            }
        }
        FavoritesAction::Remove { product } => {
            favorites.remove_item(product)?;
            writeln!(out, "Favorilerden çıkarıldı")?;
        }
        FavoritesAction::Toggle { product } => {
            let input = favorite_input(storefront, product)?;
            let outcome = favorites.toggle(input)?;
            writeln!(out, "{}", outcome.message)?;
        }
    }
    Ok(())
}

fn favorite_input<A: AuthApi>(
    storefront: &Storefront<A>,
    id: ProductId,
) -> Result<FavoriteInput, CliError> {
    let product = storefront
        .catalog()
        .product(id)?
        .ok_or(CliError::ProductNotFound(id))?;
    Ok(FavoriteInput::from(&product))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use marketplus_core::Price;
    use marketplus_storefront::models::NewProduct;

    use super::*;
    use crate::commands::test_support::{output, storefront};

    #[test]
    fn test_toggle_and_add() {
        let storefront = storefront();
        storefront
            .catalog()
            .add_product(NewProduct {
                name: "Defter".to_string(),
                price: Price::from(25),
                ..NewProduct::default()
            })
            .unwrap();
        let id = ProductId::new(1);

        let toggled = output(|out| run(&storefront, FavoritesAction::Toggle { product: id }, out));
        assert_eq!(toggled, "Favorilere eklendi\n");

        let again = output(|out| run(&storefront, FavoritesAction::Add { product: id }, out));
        assert_eq!(again, "Zaten favorilerde\n");

        let listed = output(|out| run(&storefront, FavoritesAction::List, out));
        assert!(listed.starts_with("#1 Defter | 25 TL | "));

        let toggled = output(|out| run(&storefront, FavoritesAction::Toggle { product: id }, out));
        assert_eq!(toggled, "Favorilerden çıkarıldı\n");
        assert_eq!(storefront.favorites().count().unwrap(), 0);
    }
}
