//! `fromage cart ...`

use fromage_core::{CurrencyCode, Quantity, VariantId};
use fromage_storefront::cart::{CartError, CartStore, LineItem};
use rust_decimal::Decimal;

/// Arguments of `cart add`.
pub struct NewItem {
    pub variant_id: String,
    pub title: String,
    pub price: Decimal,
    pub currency: Option<String>,
    pub quantity: u32,
    pub handle: Option<String>,
    pub image_url: Option<String>,
    pub alt_text: Option<String>,
}

impl NewItem {
    fn into_line_item(self, default_currency: &CurrencyCode) -> Result<LineItem, Box<dyn std::error::Error>> {
        let currency_code = match self.currency {
            Some(code) => CurrencyCode::parse(&code)?,
            None => default_currency.clone(),
        };

        Ok(LineItem {
            variant_id: VariantId::new(self.variant_id),
            quantity: Quantity::new(self.quantity)?,
            unit_price: self.price,
            currency_code,
            title: self.title,
            product_handle: self.handle,
            image_url: self.image_url,
            alt_text: self.alt_text,
        })
    }
}

/// Print every line and the cart total.
///
/// # Errors
///
/// Returns an error if a total does not fit in a `Decimal`.
#[allow(clippy::print_stdout)]
pub fn show(cart: &CartStore) -> Result<(), CartError> {
    let state = cart.snapshot();

    if state.is_empty() {
        println!("Your cart is empty.");
    }

    for item in state.iter() {
        println!(
            "{:>4} x {}  ({})  {} each  {}",
            item.quantity,
            item.title,
            item.variant_id,
            item.unit_price(),
            item.line_total()?
        );
    }

    println!("Items: {}", cart.item_count());
    println!("Total: {}", cart.total()?);
    Ok(())
}

/// Add a line item and show the cart.
///
/// # Errors
///
/// Returns an error for an invalid quantity or currency, or when the cart
/// rejects the item.
pub fn add(cart: &CartStore, item: NewItem) -> Result<(), Box<dyn std::error::Error>> {
    let item = item.into_line_item(cart.default_currency())?;
    cart.add(item)?;
    show(cart)?;
    Ok(())
}

/// One more unit.
///
/// # Errors
///
/// Returns an error at the quantity limit.
pub fn increment(cart: &CartStore, variant_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    cart.increment(&VariantId::new(variant_id))?;
    show(cart)?;
    Ok(())
}

/// One fewer unit.
///
/// # Errors
///
/// See [`show`].
pub fn decrement(cart: &CartStore, variant_id: &str) -> Result<(), CartError> {
    cart.decrement(&VariantId::new(variant_id));
    show(cart)
}

/// Remove a line.
///
/// # Errors
///
/// See [`show`].
pub fn remove(cart: &CartStore, variant_id: &str) -> Result<(), CartError> {
    cart.remove(&VariantId::new(variant_id));
    show(cart)
}
