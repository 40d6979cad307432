//! `SqliteDatabase` is a concrete implementation of a canteen engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqliteConnection, SqlitePool};

use super::db::{canteen_requests, canteens, carts, db_url, menu, new_pool, orders, users};
use crate::{
    db_types::{
        Canteen,
        CanteenRequest,
        CanteenRequestStatus,
        Cart,
        MenuItem,
        NewCanteenRequest,
        NewOrder,
        NewUser,
        Order,
        OrderStatusType,
        Role,
        User,
    },
    traits::{
        ApprovedCanteenRequest,
        CanteenQuery,
        CanteenRequestManagement,
        CanteenUpdate,
        CartError,
        CartManagement,
        CatalogError,
        CatalogManagement,
        MenuItemUpdate,
        MenuQuery,
        NewCanteen,
        NewMenuItem,
        OrderFlowError,
        OrderManagement,
        UserApiError,
        UserManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SqliteDatabase ({})", self.url)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the URL in `CANTEEN_DATABASE_URL`.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Demotes a `CanteenAdmin` who no longer runs any canteen back to `User`. Platform admins are left alone.
async fn demote_if_idle(user_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let Some(user) = users::fetch_user(user_id, conn).await? else {
        return Ok(());
    };
    if user.role == Role::CanteenAdmin && user.canteens.is_empty() {
        users::set_role(user_id, Role::User, conn).await?;
    }
    Ok(())
}

impl UserManagement for SqliteDatabase {
    async fn insert_user(&self, user: NewUser) -> Result<User, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        users::insert_user(user, &mut conn).await
    }

    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user(user_id, &mut conn).await?)
    }

    async fn fetch_user_by_mobile(&self, mobile: &str) -> Result<Option<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_user_by_mobile(mobile, &mut conn).await?)
    }

    async fn fetch_users(&self, ids: &[i64]) -> Result<Vec<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::fetch_users(ids, &mut conn).await?)
    }

    async fn list_users(&self) -> Result<Vec<User>, UserApiError> {
        let mut conn = self.pool.acquire().await?;
        Ok(users::list_users(&mut conn).await?)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn insert_canteen(&self, canteen: NewCanteen) -> Result<Canteen, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        canteens::insert_canteen(canteen, &mut conn).await
    }

    async fn fetch_canteen(&self, canteen_id: i64) -> Result<Option<Canteen>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(canteens::fetch_canteen(canteen_id, &mut conn).await?)
    }

    async fn search_canteens(&self, query: CanteenQuery) -> Result<(Vec<Canteen>, i64), CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(canteens::search_canteens(query, &mut conn).await?)
    }

    async fn fetch_all_canteens(&self) -> Result<Vec<Canteen>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(canteens::fetch_all_canteens(&mut conn).await?)
    }

    async fn fetch_canteens_for_admin(&self, user_id: i64) -> Result<Vec<Canteen>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(canteens::fetch_canteens_for_admin(user_id, &mut conn).await?)
    }

    async fn update_canteen(&self, canteen_id: i64, update: CanteenUpdate) -> Result<Canteen, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        canteens::update_canteen(canteen_id, update, &mut conn).await?.ok_or(CatalogError::CanteenNotFound(canteen_id))
    }

    /// In a single atomic transaction:
    /// * refuses if the canteen has any orders,
    /// * deletes the canteen (menu, admin links and carts cascade),
    /// * demotes former admins who no longer run any canteen.
    async fn delete_canteen(&self, canteen_id: i64) -> Result<(), CatalogError> {
        let mut tx = self.pool.begin().await?;
        let canteen =
            canteens::fetch_canteen(canteen_id, &mut tx).await?.ok_or(CatalogError::CanteenNotFound(canteen_id))?;
        if canteens::count_orders(canteen_id, &mut tx).await? > 0 {
            return Err(CatalogError::CanteenHasOrders(canteen_id));
        }
        canteens::delete_canteen(canteen_id, &mut tx).await?;
        for admin in &canteen.admins {
            demote_if_idle(*admin, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Canteen #{canteen_id} deleted along with its menu");
        Ok(())
    }

    async fn add_canteen_admin(&self, canteen_id: i64, user_id: i64) -> Result<Canteen, CatalogError> {
        let mut tx = self.pool.begin().await?;
        canteens::fetch_canteen(canteen_id, &mut tx).await?.ok_or(CatalogError::CanteenNotFound(canteen_id))?;
        let user = users::fetch_user(user_id, &mut tx).await?.ok_or(CatalogError::UserNotFound(user_id))?;
        canteens::link_admin(canteen_id, user_id, &mut tx).await?;
        if user.role == Role::User {
            users::set_role(user_id, Role::CanteenAdmin, &mut tx).await?;
        }
        let canteen =
            canteens::fetch_canteen(canteen_id, &mut tx).await?.ok_or(CatalogError::CanteenNotFound(canteen_id))?;
        tx.commit().await?;
        Ok(canteen)
    }

    async fn remove_canteen_admin(&self, canteen_id: i64, user_id: i64) -> Result<Canteen, CatalogError> {
        let mut tx = self.pool.begin().await?;
        canteens::fetch_canteen(canteen_id, &mut tx).await?.ok_or(CatalogError::CanteenNotFound(canteen_id))?;
        users::fetch_user(user_id, &mut tx).await?.ok_or(CatalogError::UserNotFound(user_id))?;
        if !canteens::unlink_admin(canteen_id, user_id, &mut tx).await? {
            debug!("🗃️ User #{user_id} was not an administrator of canteen #{canteen_id}");
        }
        demote_if_idle(user_id, &mut tx).await?;
        let canteen =
            canteens::fetch_canteen(canteen_id, &mut tx).await?.ok_or(CatalogError::CanteenNotFound(canteen_id))?;
        tx.commit().await?;
        Ok(canteen)
    }

    async fn insert_menu_item(&self, item: NewMenuItem) -> Result<MenuItem, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu::insert_menu_item(item, &mut conn).await?)
    }

    async fn fetch_menu_item(&self, item_id: i64) -> Result<Option<MenuItem>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu::fetch_menu_item(item_id, &mut conn).await?)
    }

    async fn search_menu(&self, canteen_id: i64, query: MenuQuery) -> Result<(Vec<MenuItem>, i64), CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(menu::search_menu(canteen_id, query, &mut conn).await?)
    }

    async fn update_menu_item(&self, item_id: i64, update: MenuItemUpdate) -> Result<MenuItem, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        menu::update_menu_item(item_id, update, &mut conn).await?.ok_or(CatalogError::MenuItemNotFound(item_id))
    }

    async fn delete_menu_item(&self, item_id: i64) -> Result<(), CatalogError> {
        let mut conn = self.pool.acquire().await?;
        if menu::delete_menu_item(item_id, &mut conn).await? {
            Ok(())
        } else {
            Err(CatalogError::MenuItemNotFound(item_id))
        }
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart(&self, customer_id: i64) -> Result<Option<Cart>, CartError> {
        let mut conn = self.pool.acquire().await?;
        Ok(carts::fetch_cart(customer_id, &mut conn).await?)
    }

    async fn save_cart(&self, cart: &Cart) -> Result<Cart, CartError> {
        let mut tx = self.pool.begin().await?;
        carts::replace_cart(cart, &mut tx).await?;
        let saved = carts::fetch_cart(cart.customer_id, &mut tx).await?;
        tx.commit().await?;
        saved.ok_or_else(|| {
            error!("🗃️ The cart for customer #{} vanished straight after saving it", cart.customer_id);
            CartError::DatabaseError("Cart could not be saved".into())
        })
    }

    async fn delete_cart(&self, customer_id: i64) -> Result<bool, CartError> {
        let mut conn = self.pool.acquire().await?;
        Ok(carts::delete_cart(customer_id, &mut conn).await?)
    }
}

impl OrderManagement for SqliteDatabase {
    /// In a single atomic transaction:
    /// * stores the order and its line items,
    /// * deletes the customer's cart, if there is one.
    async fn insert_order_and_clear_cart(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        let mut tx = self.pool.begin().await?;
        let customer_id = order.customer_id;
        let order = orders::insert_order(order, &mut tx).await?;
        let had_cart = carts::delete_cart(customer_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order #{} saved. Cart for customer #{customer_id} cleared: {had_cart}", order.id);
        Ok(order)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_order(order_id, &mut conn).await?)
    }

    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatusType,
    ) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::update_status(order_id, status, &mut conn).await?)
    }

    async fn cancel_order(&self, order_id: i64, from: &[OrderStatusType]) -> Result<Option<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::cancel_order(order_id, from, &mut conn).await?)
    }

    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_customer(customer_id, &mut conn).await?)
    }

    async fn fetch_orders_for_canteen_admin(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        let mut conn = self.pool.acquire().await?;
        Ok(orders::fetch_orders_for_canteen_admin(user_id, &mut conn).await?)
    }
}

impl CanteenRequestManagement for SqliteDatabase {
    async fn insert_canteen_request(&self, request: NewCanteenRequest) -> Result<CanteenRequest, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(canteen_requests::insert_request(request, &mut conn).await?)
    }

    async fn fetch_canteen_requests(&self) -> Result<Vec<CanteenRequest>, CatalogError> {
        let mut conn = self.pool.acquire().await?;
        Ok(canteen_requests::fetch_requests(&mut conn).await?)
    }

    async fn approve_canteen_request(&self, request_id: i64) -> Result<ApprovedCanteenRequest, CatalogError> {
        let mut tx = self.pool.begin().await?;
        let pending = canteen_requests::fetch_request(request_id, &mut tx)
            .await?
            .ok_or(CatalogError::RequestNotFound(request_id))?;
        if pending.status == CanteenRequestStatus::Approved {
            return Err(CatalogError::RequestAlreadyApproved(request_id));
        }
        let request = canteen_requests::mark_approved(request_id, &mut tx)
            .await?
            .ok_or(CatalogError::RequestAlreadyApproved(request_id))?;
        let admin_id = match users::fetch_user_by_mobile(&request.admin_mobile, &mut tx).await? {
            Some(user) => {
                if user.role == Role::User {
                    users::set_role(user.id, Role::CanteenAdmin, &mut tx).await?;
                }
                debug!("🗃️ Reusing user #{} as the admin for canteen request #{request_id}", user.id);
                user.id
            },
            None => {
                let new_user = NewUser::new(
                    request.admin_name.as_str(),
                    request.admin_mobile.as_str(),
                    request.admin_password_hash.as_str(),
                )
                .with_role(Role::CanteenAdmin);
                users::insert_user(new_user, &mut tx).await.map_err(|e| CatalogError::DatabaseError(e.to_string()))?.id
            },
        };
        let new_canteen = NewCanteen::new(request.canteen_name.as_str(), request.working_hours.as_str());
        let canteen = canteens::insert_canteen(new_canteen, &mut tx).await?;
        canteens::link_admin(canteen.id, admin_id, &mut tx).await?;
        let canteen = canteens::fetch_canteen(canteen.id, &mut tx).await?.ok_or(CatalogError::CanteenNotFound(canteen.id))?;
        let admin = users::fetch_user(admin_id, &mut tx).await?.ok_or(CatalogError::UserNotFound(admin_id))?;
        tx.commit().await?;
        Ok(ApprovedCanteenRequest { request, canteen, admin })
    }
}
