//! # Canteen engine public API
//!
//! The `canteen_api` module exposes the programmatic API for the canteen engine. Each API covers one area and is
//! generic over the backend traits it needs, so clients pick only what they use.
//!
//! * [`order_flow_api`] is the core: it turns paid carts into orders and moves orders through their lifecycle.
//! * [`cart_api`] manages the per-customer cart.
//! * [`catalog_api`] covers canteens and menus, for customers, canteen staff and platform admins.
//! * [`auth_api`] registers accounts and checks credentials.
//! * [`canteen_request_api`] handles canteen onboarding requests.
//!
//! # API usage
//!
//! Every API is created by supplying a backend that implements the traits it needs:
//!
//! ```rust,ignore
//! use canteen_engine::{CartApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/canteen.db", 5).await?;
//! // SqliteDatabase implements CartManagement
//! let api = CartApi::new(db);
//! let cart = api.add_item(customer_id, menu_item_id).await?;
//! ```
pub mod auth_api;
pub mod canteen_request_api;
pub mod cart_api;
pub mod catalog_api;
pub mod catalog_objects;
pub mod order_flow_api;
pub mod order_objects;
