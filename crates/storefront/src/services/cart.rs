//! Shopping cart.
//!
//! Lines are keyed by `(product, variant)`. A line's quantity is always at
//! least 1 and never above the last stock level seen for it; an addition or
//! update that would break that is rejected with a [`StockWarning`] and the
//! cart is left as it was.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use marketplus_core::{Price, ProductId, VariantId};

use crate::collection::{Collection, CorruptDataPolicy, Edit};
use crate::events::{Notifier, StateChange};
use crate::models::{
    CartItem, CartProductInput, clamp_quantity, parse_add_quantity, parse_update_quantity,
};
use crate::store::{KeyValueStore, StoreError, keys};

/// Seller group name for lines without a seller.
pub const UNKNOWN_SELLER: &str = "Bilinmeyen Satıcı";

/// Why a cart change was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockWarning {
    /// The product has no stock at all.
    OutOfStock,
    /// The cart already holds every unit in stock.
    LimitReached,
    /// Only this many more units can be added.
    OnlyRemaining(u32),
}

impl fmt::Display for StockWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfStock => f.write_str("Bu ürün şu anda stokta bulunmamaktadır."),
            Self::LimitReached => f.write_str("Bu ürün için maksimum stok miktarına ulaştınız."),
            Self::OnlyRemaining(n) => write!(f, "Stokta sadece {n} adet bulunmaktadır."),
        }
    }
}

/// Result of [`CartService::add_item`].
#[derive(Debug, Clone, PartialEq)]
pub enum CartAddOutcome {
    /// A new line was appended.
    Added(CartItem),
    /// An existing line's quantity was increased.
    Merged(CartItem),
    /// Nothing changed.
    Rejected(StockWarning),
}

impl CartAddOutcome {
    /// The affected line, unless the addition was rejected.
    #[must_use]
    pub const fn line(&self) -> Option<&CartItem> {
        match self {
            Self::Added(line) | Self::Merged(line) => Some(line),
            Self::Rejected(_) => None,
        }
    }

    /// Confirmation or warning text for the shopper.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Added(line) | Self::Merged(line) => format!("{} sepete eklendi!", line.name),
            Self::Rejected(warning) => warning.to_string(),
        }
    }
}

/// Result of [`CartService::update_quantity`].
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityUpdate {
    /// The line now has the requested quantity.
    Updated(CartItem),
    /// The requested quantity was zero or less; the line is gone.
    Removed,
    /// There is no such line.
    NotFound,
    /// The requested quantity is above the known stock; nothing changed.
    Rejected(StockWarning),
}

/// Shopping cart service.
#[derive(Debug)]
pub struct CartService {
    lines: Collection<CartItem>,
}

impl CartService {
    /// Create the cart over `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        notifier: Notifier,
        policy: CorruptDataPolicy,
    ) -> Self {
        Self {
            lines: Collection::new(store, keys::CART, StateChange::Cart, notifier, policy),
        }
    }

    /// All cart lines.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be read.
    pub fn items(&self) -> Result<Vec<CartItem>, StoreError> {
        self.lines.load()
    }

    /// Total number of units across all lines.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be read.
    pub fn count(&self) -> Result<u32, StoreError> {
        Ok(self.items()?.iter().map(|line| line.quantity).sum())
    }

    /// Sum of price × quantity over all lines.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be read.
    pub fn total(&self) -> Result<Price, StoreError> {
        Ok(self.items()?.iter().map(CartItem::line_total).sum())
    }

    /// Lines grouped by seller, groups in the order their first line appears.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be read.
    pub fn items_by_seller(&self) -> Result<Vec<(String, Vec<CartItem>)>, StoreError> {
        let mut groups: Vec<(String, Vec<CartItem>)> = Vec::new();
        for line in self.items()? {
            let seller = if line.seller.trim().is_empty() {
                UNKNOWN_SELLER.to_owned()
            } else {
                line.seller.clone()
            };
            match groups.iter_mut().find(|(name, _)| *name == seller) {
                Some((_, lines)) => lines.push(line),
                None => groups.push((seller, vec![line])),
            }
        }
        Ok(groups)
    }

    /// Add a product to the cart, merging with an existing line of the same
    /// product and variant.
    ///
    /// Stock is the incoming `stock_quantity`, falling back to the snapshot on
    /// the existing line. When it is known, the combined quantity may not
    /// exceed it.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be read or written. Stock
    /// problems are not errors; they come back as [`CartAddOutcome::Rejected`].
    #[instrument(skip(self, input), fields(product_id = %input.id, variant_id = %input.variant_id))]
    pub fn add_item(&self, input: CartProductInput) -> Result<CartAddOutcome, StoreError> {
        let to_add = parse_add_quantity(input.quantity.as_deref());
        let key = (input.id, input.variant_id);

        let outcome = self.lines.mutate(|lines| {
            let existing = lines.iter().position(|line| (line.id, line.variant_id) == key);
            let current = existing
                .and_then(|i| lines.get(i))
                .map_or(0, |line| line.quantity);
            let stock = input.stock_quantity.or_else(|| {
                existing
                    .and_then(|i| lines.get(i))
                    .and_then(|line| line.stock_quantity)
            });

            if let Some(stock) = stock
                && let Some(warning) = check_stock(stock, current, to_add)
            {
                return Edit::Discard(CartAddOutcome::Rejected(warning));
            }

            match existing.and_then(|i| lines.get_mut(i)) {
                Some(line) => {
                    line.quantity = line.quantity.saturating_add(to_add);
                    if let Some(image) = input.image.filter(|image| !image.is_empty()) {
                        line.image = image;
                    }
                    if input.stock_quantity.is_some() {
                        line.stock_quantity = input.stock_quantity;
                    }
                    Edit::Save(CartAddOutcome::Merged(line.clone()))
                }
                None => {
                    let line = input.into_line(to_add);
                    lines.push(line.clone());
                    Edit::Save(CartAddOutcome::Added(line))
                }
            }
        })?;

        match &outcome {
            CartAddOutcome::Rejected(warning) => {
                info!(%warning, requested = to_add, "Cart addition rejected");
            }
            CartAddOutcome::Added(line) | CartAddOutcome::Merged(line) => {
                info!(quantity = line.quantity, "Cart line saved");
            }
        }
        Ok(outcome)
    }

    /// Set a line's quantity from raw input.
    ///
    /// Zero or negative removes the line; unparsable input means 1. A
    /// quantity above the line's stock snapshot is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be read or written.
    #[instrument(skip(self))]
    pub fn update_quantity(
        &self,
        id: ProductId,
        variant_id: VariantId,
        raw_quantity: &str,
    ) -> Result<QuantityUpdate, StoreError> {
        let requested = parse_update_quantity(raw_quantity);
        let key = (id, variant_id);

        self.lines.mutate(|lines| {
            let Some(index) = lines.iter().position(|line| (line.id, line.variant_id) == key)
            else {
                return Edit::Discard(QuantityUpdate::NotFound);
            };

            if requested <= 0 {
                lines.remove(index);
                return Edit::Save(QuantityUpdate::Removed);
            }
            let quantity = clamp_quantity(requested);

            let Some(line) = lines.get_mut(index) else {
                return Edit::Discard(QuantityUpdate::NotFound);
            };
            if let Some(stock) = line.stock_quantity
                && let Some(warning) = check_stock(stock, 0, quantity)
            {
                return Edit::Discard(QuantityUpdate::Rejected(warning));
            }

            line.quantity = quantity;
            Edit::Save(QuantityUpdate::Updated(line.clone()))
        })
    }

    /// Remove a line. Removing a missing line is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the cart cannot be read or written.
    #[instrument(skip(self))]
    pub fn remove_item(&self, id: ProductId, variant_id: VariantId) -> Result<(), StoreError> {
        if self.lines.remove((id, variant_id))? {
            debug!("Cart line removed");
        }
        Ok(())
    }

    /// Empty the cart by deleting its storage key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the store write fails.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.lines.clear()?;
        info!("Cart cleared");
        Ok(())
    }
}

/// Check whether `current + to_add` fits in `stock`.
fn check_stock(stock: u32, current: u32, to_add: u32) -> Option<StockWarning> {
    if stock == 0 {
        return Some(StockWarning::OutOfStock);
    }
    if current.saturating_add(to_add) <= stock {
        return None;
    }
    match stock.saturating_sub(current) {
        0 => Some(StockWarning::LimitReached),
        available => Some(StockWarning::OnlyRemaining(available)),
    }
}
