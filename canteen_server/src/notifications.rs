//! Order notifications.
//!
//! The order flow publishes events; the hooks in this module turn them into WhatsApp messages. Sends are best-effort.
//! A failed send is logged and forgotten, and never reaches the request that caused it.
use std::sync::Arc;

use canteen_engine::{
    db_types::{Contact, OrderStatusType},
    events::{EventHandlers, EventHooks, OrderCancelledEvent, OrderPlacedEvent, OrderStatusChangedEvent},
};
use log::*;

use crate::integrations::{international_number, MessageSender};

/// A message ready to go out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub to: String,
    pub body: String,
}

impl Notification {
    fn new(contact: &Contact, body: String) -> Self {
        Self { to: contact.mobile.clone(), body }
    }
}

pub fn order_placed_messages(ev: &OrderPlacedEvent) -> Vec<Notification> {
    let order = &ev.order;
    let items = order.item_summary();
    let mut messages = Vec::with_capacity(ev.admins.len() + 1);
    messages.push(Notification::new(
        &ev.customer,
        format!(
            "Hi {}, your order #{} at {} is confirmed.\n{items}\nTotal: {}",
            ev.customer.name, order.id, ev.canteen_name, order.amount
        ),
    ));
    for admin in &ev.admins {
        messages.push(Notification::new(
            admin,
            format!(
                "New order #{} at {} from {} ({}).\n{items}\nTotal: {}",
                order.id, ev.canteen_name, ev.customer.name, ev.customer.mobile, order.amount
            ),
        ));
    }
    messages
}

/// Customers only hear about the statuses they need to act on.
pub fn status_changed_message(ev: &OrderStatusChangedEvent) -> Option<Notification> {
    let order = &ev.order;
    let body = match order.status {
        OrderStatusType::Ready => {
            format!("Hi {}, your order #{} is ready for pickup at {}.", ev.customer.name, order.id, ev.canteen_name)
        },
        OrderStatusType::Cancelled => format!(
            "Hi {}, your order #{} at {} has been cancelled by the canteen.",
            ev.customer.name, order.id, ev.canteen_name
        ),
        _ => return None,
    };
    Some(Notification::new(&ev.customer, body))
}

pub fn order_cancelled_messages(ev: &OrderCancelledEvent) -> Vec<Notification> {
    let order = &ev.order;
    ev.admins
        .iter()
        .map(|admin| {
            Notification::new(
                admin,
                format!(
                    "Order #{} at {} was cancelled by {} ({}).\n{}\nTotal: {}",
                    order.id,
                    ev.canteen_name,
                    ev.customer.name,
                    ev.customer.mobile,
                    order.item_summary(),
                    order.amount
                ),
            )
        })
        .collect()
}

async fn deliver(sender: Arc<dyn MessageSender>, country_code: &str, messages: Vec<Notification>) {
    for msg in messages {
        let to = international_number(&msg.to, country_code);
        match sender.send_message(&to, &msg.body).await {
            Ok(()) => debug!("📨️ Notification sent to {to}"),
            Err(e) => warn!("📨️ Could not notify {to}. {e}"),
        }
    }
}

/// Builds the event handlers that send order notifications through `sender`.
///
/// Pass `producers()` of the result to the order flow API, then call `start_handlers()`.
pub fn create_notification_handlers(
    sender: Arc<dyn MessageSender>,
    country_code: &str,
    buffer_size: usize,
) -> EventHandlers {
    let mut hooks = EventHooks::default();
    let (placed_sender, placed_cc) = (Arc::clone(&sender), country_code.to_string());
    let (changed_sender, changed_cc) = (Arc::clone(&sender), country_code.to_string());
    let (cancelled_sender, cancelled_cc) = (sender, country_code.to_string());
    hooks
        .on_order_placed(move |ev| {
            let sender = Arc::clone(&placed_sender);
            let cc = placed_cc.clone();
            Box::pin(async move {
                debug!("📨️ Order #{} placed. Notifying the customer and {} admin(s)", ev.order.id, ev.admins.len());
                deliver(sender, &cc, order_placed_messages(&ev)).await;
            })
        })
        .on_order_status_changed(move |ev| {
            let sender = Arc::clone(&changed_sender);
            let cc = changed_cc.clone();
            Box::pin(async move {
                match status_changed_message(&ev) {
                    Some(msg) => deliver(sender, &cc, vec![msg]).await,
                    None => trace!("📨️ No notification for order #{} moving to {}", ev.order.id, ev.order.status),
                }
            })
        })
        .on_order_cancelled(move |ev| {
            let sender = Arc::clone(&cancelled_sender);
            let cc = cancelled_cc.clone();
            Box::pin(async move {
                debug!("📨️ Order #{} cancelled by the customer. Notifying {} admin(s)", ev.order.id, ev.admins.len());
                deliver(sender, &cc, order_cancelled_messages(&ev)).await;
            })
        });
    EventHandlers::new(buffer_size, hooks)
}
