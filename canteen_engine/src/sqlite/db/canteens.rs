use std::collections::HashMap;

use chrono::{DateTime, NaiveTime, Utc};
use log::{debug, warn};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{time_of_day, Canteen},
    traits::{CanteenQuery, CanteenUpdate, CatalogError, NewCanteen},
};

/// Photos are stored as a JSON array and times as `HH:MM` text.
#[derive(FromRow)]
struct CanteenRow {
    id: i64,
    name: String,
    location: String,
    is_open: bool,
    opening_time: Option<String>,
    closing_time: Option<String>,
    photos: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn stored_time(id: i64, value: Option<&str>) -> Option<NaiveTime> {
    let s = value?;
    match time_of_day::parse(s) {
        Ok(t) => Some(t),
        Err(e) => {
            warn!("🗃️ Canteen #{id} has an unreadable time '{s}'. Ignoring it. {e}");
            None
        },
    }
}

impl CanteenRow {
    fn into_canteen(self, admins: Vec<i64>) -> Canteen {
        let photos = serde_json::from_str(&self.photos).unwrap_or_else(|e| {
            warn!("🗃️ Canteen #{} has an unreadable photo list. {e}", self.id);
            Vec::new()
        });
        Canteen {
            opening_time: stored_time(self.id, self.opening_time.as_deref()),
            closing_time: stored_time(self.id, self.closing_time.as_deref()),
            id: self.id,
            name: self.name,
            location: self.location,
            is_open: self.is_open,
            photos,
            admins,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

fn photos_json(photos: &[String]) -> Result<String, CatalogError> {
    serde_json::to_string(photos).map_err(|e| CatalogError::ValidationError(format!("Invalid photo list: {e}")))
}

pub async fn insert_canteen(canteen: NewCanteen, conn: &mut SqliteConnection) -> Result<Canteen, CatalogError> {
    let photos = photos_json(&canteen.photos)?;
    let row: CanteenRow = sqlx::query_as(
        r#"
            INSERT INTO canteens (name, location, opening_time, closing_time, photos)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(canteen.name.trim())
    .bind(canteen.location.trim())
    .bind(canteen.opening_time.as_ref().map(time_of_day::format))
    .bind(canteen.closing_time.as_ref().map(time_of_day::format))
    .bind(photos)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Canteen #{} inserted", row.id);
    Ok(row.into_canteen(Vec::new()))
}

pub async fn fetch_canteen(canteen_id: i64, conn: &mut SqliteConnection) -> Result<Option<Canteen>, sqlx::Error> {
    let row: Option<CanteenRow> =
        sqlx::query_as("SELECT * FROM canteens WHERE id = $1").bind(canteen_id).fetch_optional(&mut *conn).await?;
    match row {
        Some(row) => {
            let admins = admin_ids(row.id, conn).await?;
            Ok(Some(row.into_canteen(admins)))
        },
        None => Ok(None),
    }
}

fn push_canteen_filters(builder: &mut QueryBuilder<'_, Sqlite>, query: &CanteenQuery) {
    builder.push(" WHERE 1 = 1");
    if let Some(search) = &query.search {
        let pattern = format!("%{search}%");
        builder.push(" AND (name LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR location LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(is_open) = query.is_open {
        builder.push(" AND is_open = ");
        builder.push_bind(is_open);
    }
}

/// One page of matching canteens, ordered by name, and the total number of matches.
pub async fn search_canteens(
    query: CanteenQuery,
    conn: &mut SqliteConnection,
) -> Result<(Vec<Canteen>, i64), sqlx::Error> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM canteens");
    push_canteen_filters(&mut count, &query);
    let (total,): (i64,) = count.build_query_as().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM canteens");
    push_canteen_filters(&mut builder, &query);
    builder.push(" ORDER BY name, id LIMIT ");
    builder.push_bind(query.limit);
    builder.push(" OFFSET ");
    builder.push_bind(query.offset);
    let rows = builder.build_query_as::<CanteenRow>().fetch_all(&mut *conn).await?;
    let canteens = attach_admins(rows, conn).await?;
    Ok((canteens, total))
}

pub async fn fetch_all_canteens(conn: &mut SqliteConnection) -> Result<Vec<Canteen>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CanteenRow>("SELECT * FROM canteens ORDER BY id").fetch_all(&mut *conn).await?;
    attach_admins(rows, conn).await
}

pub async fn fetch_canteens_for_admin(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Canteen>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CanteenRow>(
        r#"
            SELECT canteens.* FROM canteens
            JOIN canteen_admins ON canteen_admins.canteen_id = canteens.id
            WHERE canteen_admins.user_id = $1
            ORDER BY canteens.id
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    attach_admins(rows, conn).await
}

/// Applies the non-empty fields of `update`. Returns `None` if the canteen does not exist.
pub async fn update_canteen(
    canteen_id: i64,
    update: CanteenUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Canteen>, CatalogError> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE canteens SET updated_at = CURRENT_TIMESTAMP");
    if let Some(name) = update.name {
        builder.push(", name = ");
        builder.push_bind(name.trim().to_string());
    }
    if let Some(location) = update.location {
        builder.push(", location = ");
        builder.push_bind(location.trim().to_string());
    }
    if let Some(is_open) = update.is_open {
        builder.push(", is_open = ");
        builder.push_bind(is_open);
    }
    if let Some(photos) = update.photos {
        builder.push(", photos = ");
        builder.push_bind(photos_json(&photos)?);
    }
    if let Some((opening, closing)) = update.opening_hours {
        builder.push(", opening_time = ");
        builder.push_bind(opening.as_ref().map(time_of_day::format));
        builder.push(", closing_time = ");
        builder.push_bind(closing.as_ref().map(time_of_day::format));
    }
    builder.push(" WHERE id = ");
    builder.push_bind(canteen_id);
    let result = builder.build().execute(&mut *conn).await?;
    if result.rows_affected() == 0 {
        return Ok(None);
    }
    Ok(fetch_canteen(canteen_id, conn).await?)
}

pub async fn count_orders(canteen_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let (count,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE canteen_id = $1").bind(canteen_id).fetch_one(conn).await?;
    Ok(count)
}

/// Deletes the canteen. Menu items, admin links and carts go with it. Returns `false` if it did not exist.
pub async fn delete_canteen(canteen_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM canteens WHERE id = $1").bind(canteen_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}

pub async fn admin_ids(canteen_id: i64, conn: &mut SqliteConnection) -> Result<Vec<i64>, sqlx::Error> {
    let ids: Vec<(i64,)> = sqlx::query_as("SELECT user_id FROM canteen_admins WHERE canteen_id = $1 ORDER BY user_id")
        .bind(canteen_id)
        .fetch_all(conn)
        .await?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}

/// Links the user to the canteen. Linking twice is a no-op.
pub async fn link_admin(canteen_id: i64, user_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO canteen_admins (canteen_id, user_id) VALUES ($1, $2)")
        .bind(canteen_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn unlink_admin(canteen_id: i64, user_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM canteen_admins WHERE canteen_id = $1 AND user_id = $2")
        .bind(canteen_id)
        .bind(user_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

async fn attach_admins(rows: Vec<CanteenRow>, conn: &mut SqliteConnection) -> Result<Vec<Canteen>, sqlx::Error> {
    let links: Vec<(i64, i64)> =
        sqlx::query_as("SELECT canteen_id, user_id FROM canteen_admins ORDER BY user_id").fetch_all(conn).await?;
    let mut by_canteen: HashMap<i64, Vec<i64>> = HashMap::new();
    for (canteen_id, user_id) in links {
        by_canteen.entry(canteen_id).or_default().push(user_id);
    }
    Ok(rows
        .into_iter()
        .map(|row| {
            let admins = by_canteen.remove(&row.id).unwrap_or_default();
            row.into_canteen(admins)
        })
        .collect())
}
