use crate::{
    db_types::{CanteenRequest, NewCanteenRequest},
    traits::{ApprovedCanteenRequest, CatalogError},
};

/// Onboarding requests from prospective canteen owners.
#[allow(async_fn_in_trait)]
pub trait CanteenRequestManagement {
    async fn insert_canteen_request(&self, request: NewCanteenRequest) -> Result<CanteenRequest, CatalogError>;

    /// All requests, newest first.
    async fn fetch_canteen_requests(&self) -> Result<Vec<CanteenRequest>, CatalogError>;

    /// In a single atomic step:
    /// * marks the pending request as approved,
    /// * creates the admin account from the request (or reuses the account with the same mobile number),
    /// * creates the canteen and links the admin to it.
    async fn approve_canteen_request(&self, request_id: i64) -> Result<ApprovedCanteenRequest, CatalogError>;
}
