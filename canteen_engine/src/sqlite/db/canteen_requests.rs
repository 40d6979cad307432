use log::debug;
use sqlx::SqliteConnection;

use crate::db_types::{CanteenRequest, CanteenRequestStatus, NewCanteenRequest};

pub async fn insert_request(
    request: NewCanteenRequest,
    conn: &mut SqliteConnection,
) -> Result<CanteenRequest, sqlx::Error> {
    let request: CanteenRequest = sqlx::query_as(
        r#"
            INSERT INTO canteen_requests (admin_name, canteen_name, working_hours, admin_mobile, admin_password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(request.admin_name)
    .bind(request.canteen_name)
    .bind(request.working_hours)
    .bind(request.admin_mobile)
    .bind(request.admin_password_hash)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Canteen request #{} inserted", request.id);
    Ok(request)
}

pub async fn fetch_request(request_id: i64, conn: &mut SqliteConnection) -> Result<Option<CanteenRequest>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM canteen_requests WHERE id = $1").bind(request_id).fetch_optional(conn).await
}

pub async fn fetch_requests(conn: &mut SqliteConnection) -> Result<Vec<CanteenRequest>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM canteen_requests ORDER BY created_at DESC, id DESC").fetch_all(conn).await
}

/// Marks a pending request as approved. Returns `None` if the request is not pending (or does not exist).
pub async fn mark_approved(request_id: i64, conn: &mut SqliteConnection) -> Result<Option<CanteenRequest>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE canteen_requests SET status = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND status = $3
            RETURNING *
        "#,
    )
    .bind(CanteenRequestStatus::Approved)
    .bind(request_id)
    .bind(CanteenRequestStatus::Pending)
    .fetch_optional(conn)
    .await
}
