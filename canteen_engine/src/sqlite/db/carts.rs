use log::trace;
use sqlx::SqliteConnection;

use crate::db_types::{Cart, CartItem};

/// Loads the cart and derives its total from the stored lines.
pub async fn fetch_cart(customer_id: i64, conn: &mut SqliteConnection) -> Result<Option<Cart>, sqlx::Error> {
    let cart: Option<(Option<i64>,)> = sqlx::query_as("SELECT canteen_id FROM carts WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some((canteen_id,)) = cart else {
        return Ok(None);
    };
    let items: Vec<CartItem> = sqlx::query_as(
        r#"
            SELECT menu_item_id, name, price, quantity FROM cart_items
            WHERE customer_id = $1
            ORDER BY position
        "#,
    )
    .bind(customer_id)
    .fetch_all(conn)
    .await?;
    Ok(Some(Cart::new(customer_id, canteen_id, items)))
}

/// Replaces the stored cart with `cart`. This is several statements, so call it inside a transaction.
pub async fn replace_cart(cart: &Cart, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
            INSERT INTO carts (customer_id, canteen_id) VALUES ($1, $2)
            ON CONFLICT (customer_id) DO UPDATE SET canteen_id = excluded.canteen_id, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(cart.customer_id)
    .bind(cart.canteen_id)
    .execute(&mut *conn)
    .await?;
    sqlx::query("DELETE FROM cart_items WHERE customer_id = $1").bind(cart.customer_id).execute(&mut *conn).await?;
    for (position, item) in cart.items.iter().enumerate() {
        sqlx::query(
            r#"
                INSERT INTO cart_items (customer_id, menu_item_id, position, name, price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(cart.customer_id)
        .bind(item.menu_item_id)
        .bind(position as i64)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;
    }
    trace!("🗃️ Cart for customer #{customer} saved with {n} line(s)", customer = cart.customer_id, n = cart.items.len());
    Ok(())
}

/// Deletes the cart and its lines. Returns `false` if there was no cart.
pub async fn delete_cart(customer_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM carts WHERE customer_id = $1").bind(customer_id).execute(conn).await?;
    Ok(result.rows_affected() > 0)
}
