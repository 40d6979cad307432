use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderStatusType},
    traits::{CartError, CartManagement, CatalogError, UserApiError, UserManagement},
};

#[derive(Debug, Clone, Error)]
pub enum OrderFlowError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Missing payment details")]
    MissingPaymentDetails,
    #[error("Invalid order: {0}")]
    InvalidOrder(String),
    #[error("Payment verification failed. The signature does not match.")]
    InvalidPaymentSignature,
    #[error("Order #{0} does not exist")]
    OrderNotFound(i64),
    #[error("Canteen #{0} does not exist")]
    CanteenNotFound(i64),
    #[error("Invalid order status: {0}")]
    InvalidStatus(String),
    #[error("Not your order")]
    NotYourOrder,
    #[error("Not your canteen order")]
    NotYourCanteenOrder,
    #[error("Order #{id} is {status} and can no longer be cancelled")]
    CannotCancel { id: i64, status: OrderStatusType },
    #[error("Order #{id} cannot move from {from} to {to}")]
    ForbiddenTransition { id: i64, from: OrderStatusType, to: OrderStatusType },
}

impl From<sqlx::Error> for OrderFlowError {
    fn from(e: sqlx::Error) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

impl From<CatalogError> for OrderFlowError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::CanteenNotFound(id) => OrderFlowError::CanteenNotFound(id),
            e => OrderFlowError::DatabaseError(e.to_string()),
        }
    }
}

impl From<CartError> for OrderFlowError {
    fn from(e: CartError) -> Self {
        match e {
            CartError::CanteenNotFound(id) => OrderFlowError::CanteenNotFound(id),
            CartError::EmptyCart => OrderFlowError::InvalidOrder(e.to_string()),
            e => OrderFlowError::DatabaseError(e.to_string()),
        }
    }
}

impl From<UserApiError> for OrderFlowError {
    fn from(e: UserApiError) -> Self {
        OrderFlowError::DatabaseError(e.to_string())
    }
}

/// Order storage.
///
/// Orders are never deleted; after creation only their status changes.
#[allow(async_fn_in_trait)]
pub trait OrderManagement: CartManagement + UserManagement {
    /// Stores the order and its line items, and deletes the customer's cart, in one atomic transaction.
    async fn insert_order_and_clear_cart(&self, order: NewOrder) -> Result<Order, OrderFlowError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderFlowError>;

    /// Unconditionally sets the order status. Returns `None` if the order does not exist.
    async fn update_order_status(
        &self,
        order_id: i64,
        status: OrderStatusType,
    ) -> Result<Option<Order>, OrderFlowError>;

    /// Sets the status to `Cancelled`, but only if the current status is one of `from`. Returns `None` if the order
    /// does not exist or is not in one of those states.
    async fn cancel_order(&self, order_id: i64, from: &[OrderStatusType]) -> Result<Option<Order>, OrderFlowError>;

    /// All orders for the customer, newest first.
    async fn fetch_orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderFlowError>;

    /// All orders placed at any canteen the user administers, newest first.
    async fn fetch_orders_for_canteen_admin(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError>;
}
