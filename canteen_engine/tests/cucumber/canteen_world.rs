use std::collections::HashMap;

use canteen_common::Secret;
use canteen_engine::{
    db_types::{Canteen, MenuItem, Order, User},
    events::EventProducers,
    order_objects::CartSnapshot,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    CartApi,
    OrderFlowApi,
    SqliteDatabase,
};
use cucumber::World;
use log::*;

pub const GATEWAY_SECRET: &str = "rzp_test_secret";

#[derive(Default, Debug, World)]
pub struct CanteenWorld {
    pub system: Option<CanteenSystem>,
    pub users: HashMap<String, User>,
    pub canteens: HashMap<String, Canteen>,
    pub items: HashMap<String, MenuItem>,
    /// The cart as it was handed to the last checkout.
    pub checked_out: Option<CartSnapshot>,
    pub last_order: Option<Order>,
    pub last_error: Option<String>,
}

#[derive(Debug)]
pub struct CanteenSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub cart: CartApi<SqliteDatabase>,
}

impl CanteenSystem {
    pub async fn new() -> Self {
        let url = random_db_path();
        prepare_test_env(&url).await;
        let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating connection to database");
        debug!("Created database: {url}");
        let orders =
            OrderFlowApi::new(db.clone(), EventProducers::default(), Secret::new(GATEWAY_SECRET.to_string()));
        let cart = CartApi::new(db.clone());
        Self { db_path: url, db, orders, cart }
    }
}

impl CanteenWorld {
    pub fn system(&self) -> &CanteenSystem {
        self.system.as_ref().expect("System not initialised. Start the scenario with 'Given a fresh install'")
    }

    pub fn user(&self, name: &str) -> &User {
        self.users.get(name).unwrap_or_else(|| panic!("No user called {name}"))
    }

    pub fn canteen(&self, name: &str) -> &Canteen {
        self.canteens.get(name).unwrap_or_else(|| panic!("No canteen called {name}"))
    }

    pub fn item(&self, name: &str) -> &MenuItem {
        self.items.get(name).unwrap_or_else(|| panic!("No menu item called {name}"))
    }

    pub fn last_order(&self) -> &Order {
        self.last_order.as_ref().expect("No order has been placed")
    }
}
