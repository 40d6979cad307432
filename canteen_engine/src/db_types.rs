//! Domain types shared by the backends and the public APIs.
use std::{fmt::Display, str::FromStr};

use canteen_common::Paise;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid value: {0}")]
pub struct ConversionError(String);

//--------------------------------------         Role         ---------------------------------------------------------
/// Closed set of user roles. The string forms are the persisted values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum Role {
    /// A regular customer.
    User,
    /// Staff member administering one or more canteens.
    CanteenAdmin,
    /// Platform administrator.
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::CanteenAdmin => write!(f, "CanteenAdmin"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "User" => Ok(Self::User),
            "CanteenAdmin" => Ok(Self::CanteenAdmin),
            "Admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------         User         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub mobile: String,
    #[serde(default, skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub is_verified: bool,
    /// Ids of the canteens this user administers
    #[sqlx(skip)]
    #[serde(default)]
    pub canteens: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub mobile: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn new<S: Into<String>>(name: S, mobile: S, password_hash: S) -> Self {
        Self { name: name.into(), mobile: mobile.into(), password_hash: password_hash.into(), role: Role::User }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// The bits of a user that the notification system needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub user_id: i64,
    pub name: String,
    pub mobile: String,
}

impl From<&User> for Contact {
    fn from(user: &User) -> Self {
        Self { user_id: user.id, name: user.name.clone(), mobile: user.mobile.clone() }
    }
}

//--------------------------------------        Canteen       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canteen {
    pub id: i64,
    pub name: String,
    pub location: String,
    /// Manual override. A closed canteen never takes orders, whatever the time.
    pub is_open: bool,
    #[serde(default, with = "time_of_day")]
    pub opening_time: Option<NaiveTime>,
    #[serde(default, with = "time_of_day")]
    pub closing_time: Option<NaiveTime>,
    pub photos: Vec<String>,
    /// User ids of the canteen's administrators
    pub admins: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Canteen {
    /// Whether the canteen takes orders at the given local time.
    ///
    /// Without a configured window only the `is_open` override counts. A window that closes before it opens runs past
    /// midnight.
    pub fn is_open_at(&self, now: NaiveTime) -> bool {
        if !self.is_open {
            return false;
        }
        match (self.opening_time, self.closing_time) {
            (Some(open), Some(close)) if open <= close => open <= now && now < close,
            (Some(open), Some(close)) => now >= open || now < close,
            (Some(open), None) => now >= open,
            (None, Some(close)) => now < close,
            (None, None) => true,
        }
    }

    pub fn is_open_now(&self) -> bool {
        self.is_open_at(chrono::Local::now().time())
    }

    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admins.contains(&user_id)
    }
}

/// Serializes optional times of day as `"HH:MM"` strings.
pub mod time_of_day {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn parse(s: &str) -> Result<NaiveTime, chrono::ParseError> {
        NaiveTime::parse_from_str(s.trim(), FORMAT)
    }

    pub fn format(t: &NaiveTime) -> String {
        t.format(FORMAT).to_string()
    }

    pub fn serialize<S: Serializer>(value: &Option<NaiveTime>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(t) => serializer.serialize_some(&format(t)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<NaiveTime>, D::Error> {
        let value = Option::<String>::deserialize(deserializer)?;
        match value.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => parse(s).map(Some).map_err(serde::de::Error::custom),
        }
    }
}

//--------------------------------------       MenuItem       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: i64,
    pub canteen_id: i64,
    pub name: String,
    pub price: Paise,
    pub photo: Option<String>,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------         Cart         ---------------------------------------------------------
/// A line in a cart. Name and price are copied from the menu item when the line is first added.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub menu_item_id: i64,
    pub name: String,
    pub price: Paise,
    pub quantity: i64,
}

impl CartItem {
    /// `None` if price times quantity overflows.
    pub fn line_total(&self) -> Option<Paise> {
        self.price.checked_mul(self.quantity)
    }

    /// Sum of the line totals, or `None` on overflow.
    pub fn checked_total(items: &[CartItem]) -> Option<Paise> {
        items.iter().try_fold(Paise::default(), |acc, line| acc.checked_add(line.line_total()?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    pub customer_id: i64,
    pub canteen_id: Option<i64>,
    pub items: Vec<CartItem>,
    pub total_amount: Paise,
}

impl Cart {
    pub fn new(customer_id: i64, canteen_id: Option<i64>, items: Vec<CartItem>) -> Self {
        let mut cart = Self { customer_id, canteen_id, items, total_amount: Paise::default() };
        cart.recalculate_total();
        cart
    }

    pub fn empty(customer_id: i64) -> Self {
        Self::new(customer_id, None, vec![])
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Adds one unit of `item`. If the cart holds items from another canteen, they are discarded first.
    pub fn add_item(&mut self, item: &MenuItem) {
        if self.canteen_id != Some(item.canteen_id) {
            self.items.clear();
            self.canteen_id = Some(item.canteen_id);
        }
        match self.items.iter_mut().find(|line| line.menu_item_id == item.id) {
            Some(line) => line.quantity += 1,
            None => self.items.push(CartItem {
                menu_item_id: item.id,
                name: item.name.clone(),
                price: item.price,
                quantity: 1,
            }),
        }
        self.recalculate_total();
    }

    /// Removes one unit of the given menu item. Returns false if the item is not in the cart.
    pub fn remove_item(&mut self, menu_item_id: i64) -> bool {
        let Some(pos) = self.items.iter().position(|line| line.menu_item_id == menu_item_id) else {
            return false;
        };
        if self.items[pos].quantity > 1 {
            self.items[pos].quantity -= 1;
        } else {
            self.items.remove(pos);
        }
        if self.items.is_empty() {
            self.canteen_id = None;
        }
        self.recalculate_total();
        true
    }

    // Saturates rather than wraps. Checkout recomputes the total with `CartItem::checked_total`.
    fn recalculate_total(&mut self) {
        self.total_amount = self
            .items
            .iter()
            .map(|i| i.price.saturating_mul(i.quantity))
            .fold(Paise::default(), Paise::saturating_add);
    }
}

//--------------------------------------   OrderStatusType    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// Created, payment not yet confirmed.
    Pending,
    /// Payment proof has been verified.
    Paid,
    /// The kitchen is working on it.
    Preparing,
    /// Waiting for pick-up.
    Ready,
    /// Handed over to the customer.
    Completed,
    /// Cancelled by the customer or canteen staff.
    Cancelled,
}

impl OrderStatusType {
    pub const ALL: [OrderStatusType; 6] = [
        OrderStatusType::Pending,
        OrderStatusType::Paid,
        OrderStatusType::Preparing,
        OrderStatusType::Ready,
        OrderStatusType::Completed,
        OrderStatusType::Cancelled,
    ];
    /// Statuses from which a customer may still cancel.
    pub const CANCELLABLE: [OrderStatusType; 2] = [OrderStatusType::Pending, OrderStatusType::Paid];

    pub fn is_cancellable(&self) -> bool {
        Self::CANCELLABLE.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// The forward edges of the order lifecycle, plus cancellation from `Pending` or `Paid`.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (Pending, Paid) |
                (Paid, Preparing) |
                (Preparing, Ready) |
                (Ready, Completed) |
                (Pending, Cancelled) |
                (Paid, Cancelled)
        )
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::Preparing => write!(f, "Preparing"),
            OrderStatusType::Ready => write!(f, "Ready"),
            OrderStatusType::Completed => write!(f, "Completed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Preparing" => Ok(Self::Preparing),
            "Ready" => Ok(Self::Ready),
            "Completed" => Ok(Self::Completed),
            "Cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------         Order        ---------------------------------------------------------
/// A line item on an order. This is a snapshot of the cart line at checkout and is never refreshed from the menu.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub menu_item_id: i64,
    pub name: String,
    pub price: Paise,
    pub quantity: i64,
}

impl From<CartItem> for OrderItem {
    fn from(item: CartItem) -> Self {
        Self { menu_item_id: item.menu_item_id, name: item.name, price: item.price, quantity: item.quantity }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub customer_id: i64,
    pub canteen_id: i64,
    #[sqlx(skip)]
    #[serde(default)]
    pub items: Vec<OrderItem>,
    pub amount: Paise,
    pub gateway_order_id: String,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// One line per item, e.g. `2 x Masala Dosa (₹50.00)`.
    pub fn item_summary(&self) -> String {
        self.items
            .iter()
            .map(|i| format!("{} x {} ({})", i.quantity, i.name, i.price.saturating_mul(i.quantity)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer_id: i64,
    pub canteen_id: i64,
    pub items: Vec<OrderItem>,
    pub amount: Paise,
    pub gateway_order_id: String,
    pub payment_id: Option<String>,
    pub signature: Option<String>,
    pub status: OrderStatusType,
}

//--------------------------------------    CanteenRequest    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CanteenRequestStatus {
    Pending,
    Approved,
}

impl Display for CanteenRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CanteenRequestStatus::Pending => write!(f, "pending"),
            CanteenRequestStatus::Approved => write!(f, "approved"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CanteenRequest {
    pub id: i64,
    pub admin_name: String,
    pub canteen_name: String,
    pub working_hours: String,
    pub admin_mobile: String,
    #[serde(default, skip_serializing)]
    pub admin_password_hash: String,
    pub status: CanteenRequestStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCanteenRequest {
    pub admin_name: String,
    pub canteen_name: String,
    pub working_hours: String,
    pub admin_mobile: String,
    pub admin_password_hash: String,
}
