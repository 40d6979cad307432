use canteen_common::Paise;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Cart, CartItem, Order},
    helpers::PaymentProof,
};

/// The cart as the client saw it when it started the hosted checkout.
///
/// The order is always built from the stored cart. A non-empty snapshot must match the stored cart exactly, so that
/// the customer pays for what they were shown and nothing else.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartSnapshot {
    pub canteen_id: Option<i64>,
    #[serde(default)]
    pub items: Vec<CartItem>,
    #[serde(default)]
    pub total_amount: Paise,
}

impl CartSnapshot {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// `None` if the total overflows.
    pub fn items_total(&self) -> Option<Paise> {
        CartItem::checked_total(&self.items)
    }
}

impl From<Cart> for CartSnapshot {
    fn from(cart: Cart) -> Self {
        Self { canteen_id: cart.canteen_id, items: cart.items, total_amount: cart.total_amount }
    }
}

/// Body of the payment verification call: the gateway's proof plus the cart snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutRequest {
    #[serde(flatten)]
    pub proof: PaymentProof,
    #[serde(default)]
    pub cart: CartSnapshot,
}

/// Orders along with a count, as returned by the order list calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderList {
    pub total: usize,
    pub orders: Vec<Order>,
}

impl From<Vec<Order>> for OrderList {
    fn from(orders: Vec<Order>) -> Self {
        Self { total: orders.len(), orders }
    }
}
