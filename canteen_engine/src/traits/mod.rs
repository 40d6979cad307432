//! # Backend contracts
//!
//! The traits in this module define what a storage backend must provide for the canteen engine. The public APIs
//! (see [`crate::OrderFlowApi`] and friends) are generic over these traits, so the business rules never touch SQL.
//!
//! * [`UserManagement`] stores accounts and looks up contacts.
//! * [`CatalogManagement`] covers canteens, their administrators and their menus.
//! * [`CartManagement`] persists the per-customer staging cart.
//! * [`OrderManagement`] persists orders. It builds on the catalog and user traits because the order flow needs to
//!   check canteen membership and to notify people.
//! * [`CanteenRequestManagement`] stores onboarding requests and turns approved ones into canteens.
mod canteen_requests;
mod cart_management;
mod catalog_management;
mod data_objects;
mod order_management;
mod user_management;

pub use canteen_requests::CanteenRequestManagement;
pub use cart_management::{CartError, CartManagement};
pub use catalog_management::{CatalogError, CatalogManagement};
pub use data_objects::{
    ApprovedCanteenRequest,
    CanteenQuery,
    CanteenUpdate,
    MenuItemUpdate,
    MenuQuery,
    NewCanteen,
    NewMenuItem,
};
pub use order_management::{OrderFlowError, OrderManagement};
pub use user_management::{UserApiError, UserManagement};
