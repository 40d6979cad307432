use thiserror::Error;

use crate::{
    db_types::{Canteen, MenuItem},
    traits::{CanteenQuery, CanteenUpdate, MenuItemUpdate, MenuQuery, NewCanteen, NewMenuItem},
};

#[derive(Debug, Clone, Error)]
pub enum CatalogError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Canteen #{0} does not exist")]
    CanteenNotFound(i64),
    #[error("Menu item #{0} does not exist")]
    MenuItemNotFound(i64),
    #[error("User #{0} does not exist")]
    UserNotFound(i64),
    #[error("Canteen request #{0} does not exist")]
    RequestNotFound(i64),
    #[error("Canteen request #{0} has already been approved")]
    RequestAlreadyApproved(i64),
    #[error("You are not an administrator of canteen #{0}")]
    NotCanteenAdmin(i64),
    #[error("Canteen #{0} has orders and cannot be deleted")]
    CanteenHasOrders(i64),
    #[error("Invalid catalog details: {0}")]
    ValidationError(String),
}

impl From<sqlx::Error> for CatalogError {
    fn from(e: sqlx::Error) -> Self {
        CatalogError::DatabaseError(e.to_string())
    }
}

/// Canteens, canteen administrators and menus.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    async fn insert_canteen(&self, canteen: NewCanteen) -> Result<Canteen, CatalogError>;

    /// Fetches a canteen along with its admin ids. Returns `None` if it does not exist.
    async fn fetch_canteen(&self, canteen_id: i64) -> Result<Option<Canteen>, CatalogError>;

    /// Returns one page of canteens matching the query, and the total number of matches.
    async fn search_canteens(&self, query: CanteenQuery) -> Result<(Vec<Canteen>, i64), CatalogError>;

    async fn fetch_all_canteens(&self) -> Result<Vec<Canteen>, CatalogError>;

    async fn fetch_canteens_for_admin(&self, user_id: i64) -> Result<Vec<Canteen>, CatalogError>;

    async fn update_canteen(&self, canteen_id: i64, update: CanteenUpdate) -> Result<Canteen, CatalogError>;

    /// Deletes the canteen with its menu and admin links. Canteens with orders cannot be deleted.
    async fn delete_canteen(&self, canteen_id: i64) -> Result<(), CatalogError>;

    /// Links the user to the canteen and promotes them to `CanteenAdmin` (platform admins keep their role).
    async fn add_canteen_admin(&self, canteen_id: i64, user_id: i64) -> Result<Canteen, CatalogError>;

    /// Unlinks the user. A `CanteenAdmin` left without canteens reverts to `User`.
    async fn remove_canteen_admin(&self, canteen_id: i64, user_id: i64) -> Result<Canteen, CatalogError>;

    async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, CatalogError>;

    async fn fetch_menu_item(&self, item_id: i64) -> Result<Option<MenuItem>, CatalogError>;

    async fn search_menu(&self, canteen_id: i64, query: MenuQuery) -> Result<(Vec<MenuItem>, i64), CatalogError>;

    async fn update_menu_item(&self, item_id: i64, update: MenuItemUpdate) -> Result<MenuItem, CatalogError>;

    async fn delete_menu_item(&self, item_id: i64) -> Result<(), CatalogError>;
}
