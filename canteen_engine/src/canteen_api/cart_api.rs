use std::fmt::Debug;

use chrono::NaiveTime;
use log::*;

use crate::{
    db_types::Cart,
    traits::{CartError, CartManagement},
};

/// Per-customer staging cart. A cart only ever holds items from one canteen.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    /// The customer's cart, or an empty one if they have none.
    pub async fn get_cart(&self, customer_id: i64) -> Result<Cart, CartError> {
        let cart = self.db.fetch_cart(customer_id).await?;
        Ok(cart.unwrap_or_else(|| Cart::empty(customer_id)))
    }

    /// The customer's cart, if it has something in it to pay for.
    pub async fn payable_cart(&self, customer_id: i64) -> Result<Cart, CartError> {
        match self.db.fetch_cart(customer_id).await? {
            Some(cart) if !cart.is_empty() => Ok(cart),
            _ => Err(CartError::EmptyCart),
        }
    }

    pub async fn add_item(&self, customer_id: i64, menu_item_id: i64) -> Result<Cart, CartError> {
        self.add_item_at(customer_id, menu_item_id, chrono::Local::now().time()).await
    }

    /// Adds one unit of the menu item, checking the canteen's opening hours against `now`.
    ///
    /// Adding an item from a different canteen empties the cart first.
    pub async fn add_item_at(&self, customer_id: i64, menu_item_id: i64, now: NaiveTime) -> Result<Cart, CartError> {
        let item = self
            .db
            .fetch_menu_item(menu_item_id)
            .await?
            .ok_or(CartError::MenuItemNotFound(menu_item_id))?;
        if !item.is_available {
            return Err(CartError::ItemUnavailable(item.name));
        }
        let canteen = self
            .db
            .fetch_canteen(item.canteen_id)
            .await?
            .ok_or(CartError::CanteenNotFound(item.canteen_id))?;
        if !canteen.is_open_at(now) {
            debug!("🛒️ {} is closed. Customer #{customer_id} cannot add {}", canteen.name, item.name);
            return Err(CartError::CanteenClosed(canteen.name));
        }
        let mut cart = self.get_cart(customer_id).await?;
        if cart.canteen_id.is_some() && cart.canteen_id != Some(canteen.id) {
            info!("🛒️ Customer #{customer_id} switched to {}. Their previous cart has been cleared.", canteen.name);
        }
        cart.add_item(&item);
        let cart = self.db.save_cart(&cart).await?;
        trace!("🛒️ Cart for customer #{customer_id} now holds {} line(s), {}", cart.items.len(), cart.total_amount);
        Ok(cart)
    }

    /// Removes one unit of the menu item. The cart is deleted once its last line is gone.
    pub async fn remove_item(&self, customer_id: i64, menu_item_id: i64) -> Result<Cart, CartError> {
        let mut cart = self.db.fetch_cart(customer_id).await?.ok_or(CartError::ItemNotInCart(menu_item_id))?;
        if !cart.remove_item(menu_item_id) {
            return Err(CartError::ItemNotInCart(menu_item_id));
        }
        if cart.is_empty() {
            self.db.delete_cart(customer_id).await?;
            return Ok(Cart::empty(customer_id));
        }
        self.db.save_cart(&cart).await
    }

    /// Deletes the cart. Returns `false` if there was nothing to delete.
    pub async fn clear_cart(&self, customer_id: i64) -> Result<bool, CartError> {
        let deleted = self.db.delete_cart(customer_id).await?;
        debug!("🛒️ Cart for customer #{customer_id} cleared (existed: {deleted})");
        Ok(deleted)
    }
}
