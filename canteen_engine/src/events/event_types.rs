use serde::{Deserialize, Serialize};

use crate::db_types::{Contact, Order, OrderStatusType};

/// A paid order has been stored and the customer's cart cleared.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlacedEvent {
    pub order: Order,
    pub canteen_name: String,
    pub customer: Contact,
    pub admins: Vec<Contact>,
}

/// Canteen staff changed the status of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub order: Order,
    pub old_status: OrderStatusType,
    pub canteen_name: String,
    pub customer: Contact,
}

/// The customer cancelled their own order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderCancelledEvent {
    pub order: Order,
    pub canteen_name: String,
    pub customer: Contact,
    pub admins: Vec<Contact>,
}
