use std::fmt::Debug;

use log::*;

use crate::{
    canteen_api::auth_api::validate_new_account,
    db_types::{CanteenRequest, NewCanteenRequest},
    helpers::hash_password,
    traits::{ApprovedCanteenRequest, CanteenRequestManagement, CatalogError, UserApiError},
};

/// Onboarding for new canteens. Anyone may apply; a platform admin approves.
pub struct CanteenRequestApi<B> {
    db: B,
}

impl<B> Debug for CanteenRequestApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CanteenRequestApi")
    }
}

impl<B> CanteenRequestApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CanteenRequestApi<B>
where B: CanteenRequestManagement
{
    pub async fn submit_request(
        &self,
        admin_name: &str,
        canteen_name: &str,
        working_hours: &str,
        admin_mobile: &str,
        admin_password: &str,
    ) -> Result<CanteenRequest, CatalogError> {
        if canteen_name.trim().is_empty() || working_hours.trim().is_empty() {
            return Err(CatalogError::ValidationError("All fields are required".into()));
        }
        let admin_mobile = admin_mobile.trim();
        validate_new_account(admin_name, admin_mobile, admin_password).map_err(|e| match e {
            UserApiError::ValidationError(msg) => CatalogError::ValidationError(msg),
            e => CatalogError::DatabaseError(e.to_string()),
        })?;
        let admin_password_hash =
            hash_password(admin_password).map_err(|e| CatalogError::DatabaseError(e.to_string()))?;
        let request = NewCanteenRequest {
            admin_name: admin_name.trim().to_string(),
            canteen_name: canteen_name.trim().to_string(),
            working_hours: working_hours.trim().to_string(),
            admin_mobile: admin_mobile.to_string(),
            admin_password_hash,
        };
        let request = self.db.insert_canteen_request(request).await?;
        info!("🏪️ Canteen request #{} for '{}' submitted", request.id, request.canteen_name);
        Ok(request)
    }

    pub async fn list_requests(&self) -> Result<Vec<CanteenRequest>, CatalogError> {
        self.db.fetch_canteen_requests().await
    }

    pub async fn approve_request(&self, request_id: i64) -> Result<ApprovedCanteenRequest, CatalogError> {
        let approved = self.db.approve_canteen_request(request_id).await?;
        info!(
            "🏪️ Canteen request #{request_id} approved. Canteen #{} is run by user #{}",
            approved.canteen.id, approved.admin.id
        );
        Ok(approved)
    }
}
