use std::fmt::Debug;

use canteen_common::Secret;
use log::*;

use crate::{
    canteen_api::order_objects::CartSnapshot,
    db_types::{Canteen, Contact, NewOrder, Order, OrderItem, OrderStatusType, Role},
    events::{EventProducers, OrderCancelledEvent, OrderPlacedEvent, OrderStatusChangedEvent},
    helpers::{PaymentProof, PaymentSignature},
    traits::{OrderFlowError, OrderManagement},
};

/// `OrderFlowApi` is the primary API for the order lifecycle: turning a paid cart into an order, moving orders through
/// the kitchen, and customer cancellations.
///
/// Every committed change is followed by an event on the matching producer. Event delivery never affects the result of
/// the call that triggered it.
pub struct OrderFlowApi<B> {
    db: B,
    producers: EventProducers,
    signature: PaymentSignature,
    strict_transitions: bool,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi (strict transitions: {})", self.strict_transitions)
    }
}

impl<B> OrderFlowApi<B> {
    /// `payment_secret` is the gateway key secret that payment signatures are checked against.
    pub fn new(db: B, producers: EventProducers, payment_secret: Secret<String>) -> Self {
        Self { db, producers, signature: PaymentSignature::new(payment_secret), strict_transitions: false }
    }

    /// Only allow the documented forward edges (and cancellation from `Pending` or `Paid`) in
    /// [`Self::advance_order_status`]. The default lets canteen staff set any status, for manual corrections.
    pub fn with_strict_transitions(mut self, strict: bool) -> Self {
        self.strict_transitions = strict;
        self
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement
{
    /// Creates an order from a completed hosted checkout.
    ///
    /// The proof is checked locally against the gateway key secret. Lines, prices and the amount all come from the
    /// customer's stored cart. `cart` is what the client showed the customer; if it is not empty it must match the
    /// stored cart exactly. On success the order is stored with status `Paid` and the customer's cart is deleted in the
    /// same transaction.
    ///
    /// Submitting the same proof twice creates two orders if the cart has been filled again in between. Gateway order
    /// ids are not unique in storage.
    pub async fn create_order_from_payment(
        &self,
        customer_id: i64,
        proof: PaymentProof,
        cart: CartSnapshot,
    ) -> Result<Order, OrderFlowError> {
        if !proof.is_complete() {
            debug!("🔄️📦️ Checkout for customer #{customer_id} is missing payment details");
            return Err(OrderFlowError::MissingPaymentDetails);
        }
        if !cart.is_empty() {
            check_snapshot(&cart)?;
        }
        if !self.signature.verify(&proof) {
            warn!(
                "🔄️📦️ Payment signature for gateway order {} (customer #{customer_id}) is invalid",
                proof.gateway_order_id
            );
            return Err(OrderFlowError::InvalidPaymentSignature);
        }
        let stored = match self.db.fetch_cart(customer_id).await? {
            Some(stored) if !stored.is_empty() => CartSnapshot::from(stored),
            _ => return Err(OrderFlowError::InvalidOrder("The cart is empty".into())),
        };
        if !cart.is_empty() && cart != stored {
            warn!(
                "🔄️📦️ Checkout for gateway order {} (customer #{customer_id}) does not match the stored cart. Client \
                 says {}, stored cart is {}",
                proof.gateway_order_id, cart.total_amount, stored.total_amount
            );
            return Err(OrderFlowError::InvalidOrder(
                "The cart changed during checkout. Please review it and pay again".into(),
            ));
        }
        let Some(canteen_id) = stored.canteen_id else {
            return Err(OrderFlowError::InvalidOrder("The cart is not linked to a canteen".into()));
        };
        let amount = stored.items_total().ok_or_else(too_large)?;
        let canteen = self.db.fetch_canteen(canteen_id).await?.ok_or(OrderFlowError::CanteenNotFound(canteen_id))?;
        let new_order = NewOrder {
            customer_id,
            canteen_id,
            items: stored.items.into_iter().map(OrderItem::from).collect(),
            amount,
            gateway_order_id: proof.gateway_order_id,
            payment_id: Some(proof.payment_id),
            signature: Some(proof.signature),
            status: OrderStatusType::Paid,
        };
        let order = self.db.insert_order_and_clear_cart(new_order).await?;
        info!(
            "🔄️📦️ Order #{} for {} placed by customer #{customer_id} at {}",
            order.id, order.amount, canteen.name
        );
        self.call_order_placed_hook(&order, &canteen).await;
        Ok(order)
    }

    /// Sets the status of an order on behalf of a canteen administrator.
    ///
    /// `new_status` must be one of the six status names, exactly. The acting user must administer the order's canteen.
    pub async fn advance_order_status(
        &self,
        order_id: i64,
        new_status: &str,
        acting_user_id: i64,
    ) -> Result<Order, OrderFlowError> {
        let status =
            new_status.parse::<OrderStatusType>().map_err(|_| OrderFlowError::InvalidStatus(new_status.to_string()))?;
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        let canteen = self
            .db
            .fetch_canteen(order.canteen_id)
            .await?
            .ok_or(OrderFlowError::CanteenNotFound(order.canteen_id))?;
        if !canteen.is_admin(acting_user_id) {
            warn!("🔄️📦️ User #{acting_user_id} tried to update order #{order_id}, which belongs to {}", canteen.name);
            return Err(OrderFlowError::NotYourCanteenOrder);
        }
        let old_status = order.status;
        if self.strict_transitions && !old_status.can_transition_to(status) {
            return Err(OrderFlowError::ForbiddenTransition { id: order_id, from: old_status, to: status });
        }
        let updated =
            self.db.update_order_status(order_id, status).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        info!("🔄️📦️ Order #{order_id} moved from {old_status} to {status} by user #{acting_user_id}");
        self.call_order_status_changed_hook(&updated, old_status, &canteen).await;
        Ok(updated)
    }

    /// Cancels an order on behalf of the customer who placed it. Only `Pending` and `Paid` orders can be cancelled.
    pub async fn cancel_order_by_customer(&self, order_id: i64, customer_id: i64) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if order.customer_id != customer_id {
            warn!("🔄️📦️ Customer #{customer_id} tried to cancel order #{order_id}, which is not theirs");
            return Err(OrderFlowError::NotYourOrder);
        }
        if !order.status.is_cancellable() {
            return Err(OrderFlowError::CannotCancel { id: order_id, status: order.status });
        }
        let cancelled = match self.db.cancel_order(order_id, &OrderStatusType::CANCELLABLE).await? {
            Some(o) => o,
            None => {
                // The status changed between the read and the conditional update
                let current = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
                debug!("🔄️📦️ Order #{order_id} moved to {} before it could be cancelled", current.status);
                return Err(OrderFlowError::CannotCancel { id: order_id, status: current.status });
            },
        };
        info!("🔄️📦️ Order #{order_id} cancelled by customer #{customer_id}");
        match self.db.fetch_canteen(cancelled.canteen_id).await {
            Ok(Some(canteen)) => self.call_order_cancelled_hook(&cancelled, &canteen).await,
            Ok(None) => warn!("🔄️📦️ Canteen #{} for cancelled order #{order_id} is gone", cancelled.canteen_id),
            Err(e) => error!("🔄️📦️ Could not load the canteen for cancelled order #{order_id}. {e}"),
        }
        Ok(cancelled)
    }

    /// Fetches a single order. Visible to its customer, to the administrators of its canteen, and to platform admins.
    pub async fn fetch_order(&self, order_id: i64, user_id: i64, role: Role) -> Result<Order, OrderFlowError> {
        let order = self.db.fetch_order(order_id).await?.ok_or(OrderFlowError::OrderNotFound(order_id))?;
        if role == Role::Admin || order.customer_id == user_id {
            return Ok(order);
        }
        let is_staff = self.db.fetch_canteen(order.canteen_id).await?.map(|c| c.is_admin(user_id)).unwrap_or(false);
        if is_staff {
            Ok(order)
        } else {
            Err(OrderFlowError::NotYourOrder)
        }
    }

    /// The customer's orders, newest first.
    pub async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        self.db.fetch_orders_for_customer(customer_id).await
    }

    /// Orders at every canteen the user administers, newest first.
    pub async fn orders_for_canteen_admin(&self, user_id: i64) -> Result<Vec<Order>, OrderFlowError> {
        let orders = self.db.fetch_orders_for_canteen_admin(user_id).await?;
        trace!("🔄️📦️ {} orders found for the canteens of user #{user_id}", orders.len());
        Ok(orders)
    }

    /// Looks up the customer and the given admins. Returns `None` (and logs) if the customer cannot be found, since
    /// an event without a customer is useless to subscribers.
    async fn contacts(&self, customer_id: i64, admins: &[i64]) -> Option<(Contact, Vec<Contact>)> {
        let mut ids = Vec::with_capacity(admins.len() + 1);
        ids.push(customer_id);
        ids.extend(admins.iter().copied().filter(|id| *id != customer_id));
        let users = match self.db.fetch_users(&ids).await {
            Ok(users) => users,
            Err(e) => {
                error!("🔄️📦️ Could not load contacts for an order event. The event is skipped. {e}");
                return None;
            },
        };
        let Some(customer) = users.iter().find(|u| u.id == customer_id).map(Contact::from) else {
            warn!("🔄️📦️ Customer #{customer_id} does not exist. The order event is skipped.");
            return None;
        };
        let admins = users.iter().filter(|u| admins.contains(&u.id)).map(Contact::from).collect();
        Some((customer, admins))
    }

    async fn call_order_placed_hook(&self, order: &Order, canteen: &Canteen) {
        if self.producers.order_placed_producer.is_empty() {
            return;
        }
        let Some((customer, admins)) = self.contacts(order.customer_id, &canteen.admins).await else {
            return;
        };
        for emitter in &self.producers.order_placed_producer {
            debug!("🔄️📦️ Notifying order placed hook subscribers");
            let event = OrderPlacedEvent {
                order: order.clone(),
                canteen_name: canteen.name.clone(),
                customer: customer.clone(),
                admins: admins.clone(),
            };
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_status_changed_hook(&self, order: &Order, old_status: OrderStatusType, canteen: &Canteen) {
        if self.producers.order_status_changed_producer.is_empty() {
            return;
        }
        let Some((customer, _)) = self.contacts(order.customer_id, &[]).await else {
            return;
        };
        for emitter in &self.producers.order_status_changed_producer {
            debug!("🔄️📦️ Notifying order status changed hook subscribers");
            let event = OrderStatusChangedEvent {
                order: order.clone(),
                old_status,
                canteen_name: canteen.name.clone(),
                customer: customer.clone(),
            };
            emitter.publish_event(event).await;
        }
    }

    async fn call_order_cancelled_hook(&self, order: &Order, canteen: &Canteen) {
        if self.producers.order_cancelled_producer.is_empty() {
            return;
        }
        let Some((customer, admins)) = self.contacts(order.customer_id, &canteen.admins).await else {
            return;
        };
        for emitter in &self.producers.order_cancelled_producer {
            debug!("🔄️📦️ Notifying order cancelled hook subscribers");
            let event = OrderCancelledEvent {
                order: order.clone(),
                canteen_name: canteen.name.clone(),
                customer: customer.clone(),
                admins: admins.clone(),
            };
            emitter.publish_event(event).await;
        }
    }
}

/// Shape checks on the client's snapshot, so that a malformed body fails before anything is looked up.
fn check_snapshot(cart: &CartSnapshot) -> Result<(), OrderFlowError> {
    if cart.canteen_id.is_none() {
        return Err(OrderFlowError::InvalidOrder("The cart is not linked to a canteen".into()));
    }
    if cart.items.iter().any(|i| i.quantity <= 0 || i.price.is_negative()) {
        return Err(OrderFlowError::InvalidOrder("Cart lines must have a positive quantity and price".into()));
    }
    let total = cart.items_total().ok_or_else(too_large)?;
    if total != cart.total_amount {
        return Err(OrderFlowError::InvalidOrder(format!(
            "The cart total ({}) does not match its items ({total})",
            cart.total_amount
        )));
    }
    Ok(())
}

fn too_large() -> OrderFlowError {
    OrderFlowError::InvalidOrder("The cart total is too large".into())
}
