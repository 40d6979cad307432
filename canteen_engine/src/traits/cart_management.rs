use thiserror::Error;

use crate::{
    db_types::Cart,
    traits::{CatalogError, CatalogManagement},
};

#[derive(Debug, Clone, Error)]
pub enum CartError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Menu item #{0} does not exist")]
    MenuItemNotFound(i64),
    #[error("{0} is not available right now")]
    ItemUnavailable(String),
    #[error("{0} is not taking orders right now")]
    CanteenClosed(String),
    #[error("Canteen #{0} does not exist")]
    CanteenNotFound(i64),
    #[error("Menu item #{0} is not in the cart")]
    ItemNotInCart(i64),
    #[error("The cart is empty")]
    EmptyCart,
}

impl From<sqlx::Error> for CartError {
    fn from(e: sqlx::Error) -> Self {
        CartError::DatabaseError(e.to_string())
    }
}

impl From<CatalogError> for CartError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::CanteenNotFound(id) => CartError::CanteenNotFound(id),
            CatalogError::MenuItemNotFound(id) => CartError::MenuItemNotFound(id),
            e => CartError::DatabaseError(e.to_string()),
        }
    }
}

/// Cart storage. The cart rules themselves live on [`Cart`]; backends only load and store whole carts.
#[allow(async_fn_in_trait)]
pub trait CartManagement: CatalogManagement {
    async fn fetch_cart(&self, customer_id: i64) -> Result<Option<Cart>, CartError>;

    /// Replaces the stored cart for `cart.customer_id` with the given one, creating it if necessary.
    async fn save_cart(&self, cart: &Cart) -> Result<Cart, CartError>;

    /// Deletes the customer's cart. Returns `false` if there was no cart to delete.
    async fn delete_cart(&self, customer_id: i64) -> Result<bool, CartError>;
}
