use log::debug;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::MenuItem,
    traits::{MenuItemUpdate, MenuQuery, NewMenuItem},
};

pub async fn insert_menu_item(item: NewMenuItem, conn: &mut SqliteConnection) -> Result<MenuItem, sqlx::Error> {
    let item: MenuItem = sqlx::query_as(
        r#"
            INSERT INTO menu_items (canteen_id, name, price, photo)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(item.canteen_id)
    .bind(item.name)
    .bind(item.price)
    .bind(item.photo)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Menu item #{} inserted for canteen #{}", item.id, item.canteen_id);
    Ok(item)
}

pub async fn fetch_menu_item(item_id: i64, conn: &mut SqliteConnection) -> Result<Option<MenuItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM menu_items WHERE id = $1").bind(item_id).fetch_optional(conn).await
}

fn push_menu_filters(builder: &mut QueryBuilder<'_, Sqlite>, canteen_id: i64, query: &MenuQuery) {
    builder.push(" WHERE canteen_id = ");
    builder.push_bind(canteen_id);
    if let Some(search) = &query.search {
        builder.push(" AND name LIKE ");
        builder.push_bind(format!("%{search}%"));
    }
    if let Some(is_available) = query.is_available {
        builder.push(" AND is_available = ");
        builder.push_bind(is_available);
    }
}

/// One page of the canteen's menu, ordered by name, and the total number of matching items.
pub async fn search_menu(
    canteen_id: i64,
    query: MenuQuery,
    conn: &mut SqliteConnection,
) -> Result<(Vec<MenuItem>, i64), sqlx::Error> {
    let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM menu_items");
    push_menu_filters(&mut count, canteen_id, &query);
    let (total,): (i64,) = count.build_query_as().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM menu_items");
    push_menu_filters(&mut builder, canteen_id, &query);
    builder.push(" ORDER BY name, id LIMIT ");
    builder.push_bind(query.limit);
    builder.push(" OFFSET ");
    builder.push_bind(query.offset);
    let items = builder.build_query_as::<MenuItem>().fetch_all(&mut *conn).await?;
    Ok((items, total))
}

/// Applies the non-empty fields of `update`. Returns `None` if the item does not exist.
pub async fn update_menu_item(
    item_id: i64,
    update: MenuItemUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<MenuItem>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE menu_items SET updated_at = CURRENT_TIMESTAMP");
    if let Some(name) = update.name {
        builder.push(", name = ");
        builder.push_bind(name.trim().to_string());
    }
    if let Some(price) = update.price {
        builder.push(", price = ");
        builder.push_bind(price);
    }
    if let Some(photo) = update.photo {
        builder.push(", photo = ");
        builder.push_bind(photo);
    }
    if let Some(is_available) = update.is_available {
        builder.push(", is_available = ");
        builder.push_bind(is_available);
    }
    builder.push(" WHERE id = ");
    builder.push_bind(item_id);
    builder.push(" RETURNING *");
    builder.build_query_as::<MenuItem>().fetch_optional(conn).await
}

pub async fn delete_menu_item(item_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM menu_items WHERE id = $1").bind(item_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
