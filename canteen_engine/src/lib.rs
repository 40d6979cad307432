//! Canteen Engine
//!
//! The canteen engine holds the business logic of a multi-tenant canteen ordering service: customers browse canteens,
//! fill a cart and pay online; canteen staff run their menus and move orders through the kitchen; platform admins
//! onboard canteens. It knows nothing about HTTP.
//!
//! The library is divided into two main sections:
//! 1. Storage ([`traits`] and the SQLite backend). The traits define what a backend must provide. [`SqliteDatabase`]
//!    implements all of them. The data types used by the backends are defined in [`db_types`] and are public.
//! 2. The public API ([`mod@canteen_api`]). [`OrderFlowApi`] is the core and owns the order lifecycle. The other APIs
//!    cover carts, the catalog, accounts and canteen onboarding.
//!
//! The order flow emits events after every committed change (an order is placed, its status changes, it is
//! cancelled). A small actor framework in [`events`] lets callers hook into these, for example to send notifications.
pub mod canteen_api;
pub mod db_types;
pub mod events;
pub mod helpers;
#[cfg(feature = "sqlite")]
mod sqlite;
pub mod traits;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

pub use canteen_api::{
    auth_api::AuthApi,
    canteen_request_api::CanteenRequestApi,
    cart_api::CartApi,
    catalog_api::CatalogApi,
    catalog_objects,
    order_flow_api::OrderFlowApi,
    order_objects,
};
#[cfg(feature = "sqlite")]
pub use sqlite::{db as sqlite_db, SqliteDatabase};
