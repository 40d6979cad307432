use std::collections::HashMap;

use log::{debug, trace};
use sqlx::{FromRow, QueryBuilder, Sqlite, SqliteConnection};

use crate::db_types::{NewOrder, Order, OrderItem, OrderStatusType};

#[derive(FromRow)]
struct OrderItemRow {
    order_id: i64,
    #[sqlx(flatten)]
    item: OrderItem,
}

/// Inserts the order and its line items. This is not atomic on its own. Embed the call in a transaction and pass
/// `&mut *tx` as the connection when atomicity matters.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let mut inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (customer_id, canteen_id, amount, gateway_order_id, payment_id, signature, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *;
        "#,
    )
    .bind(order.customer_id)
    .bind(order.canteen_id)
    .bind(order.amount)
    .bind(order.gateway_order_id)
    .bind(order.payment_id)
    .bind(order.signature)
    .bind(order.status)
    .fetch_one(&mut *conn)
    .await?;
    for (position, item) in order.items.iter().enumerate() {
        sqlx::query(
            r#"
                INSERT INTO order_items (order_id, position, menu_item_id, name, price, quantity)
                VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(inserted.id)
        .bind(position as i64)
        .bind(item.menu_item_id)
        .bind(&item.name)
        .bind(item.price)
        .bind(item.quantity)
        .execute(&mut *conn)
        .await?;
    }
    inserted.items = order.items;
    debug!("🗃️ Order #{} inserted with {} line item(s)", inserted.id, inserted.items.len());
    Ok(inserted)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> =
        sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(&mut *conn).await?;
    match order {
        Some(order) => Ok(attach_items(vec![order], conn).await?.pop()),
        None => Ok(None),
    }
}

pub async fn update_status(
    order_id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(order_id)
            .fetch_optional(&mut *conn)
            .await?;
    match order {
        Some(order) => {
            trace!("🗃️ Order #{order_id} status set to {status}");
            Ok(attach_items(vec![order], conn).await?.pop())
        },
        None => Ok(None),
    }
}

/// Cancels the order only if its current status is one of `from`, in a single conditional update.
pub async fn cancel_order(
    order_id: i64,
    from: &[OrderStatusType],
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    if from.is_empty() {
        return Ok(None);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET status = ");
    builder.push_bind(OrderStatusType::Cancelled);
    builder.push(", updated_at = CURRENT_TIMESTAMP WHERE id = ");
    builder.push_bind(order_id);
    builder.push(" AND status IN (");
    let mut list = builder.separated(", ");
    for status in from {
        list.push_bind(*status);
    }
    builder.push(") RETURNING *");
    let order = builder.build_query_as::<Order>().fetch_optional(&mut *conn).await?;
    match order {
        Some(order) => Ok(attach_items(vec![order], conn).await?.pop()),
        None => Ok(None),
    }
}

pub async fn fetch_orders_for_customer(customer_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC, id DESC",
    )
    .bind(customer_id)
    .fetch_all(&mut *conn)
    .await?;
    attach_items(orders, conn).await
}

pub async fn fetch_orders_for_canteen_admin(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as::<_, Order>(
        r#"
            SELECT orders.* FROM orders
            JOIN canteen_admins ON canteen_admins.canteen_id = orders.canteen_id
            WHERE canteen_admins.user_id = $1
            ORDER BY orders.created_at DESC, orders.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(&mut *conn)
    .await?;
    attach_items(orders, conn).await
}

async fn attach_items(mut orders: Vec<Order>, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    if orders.is_empty() {
        return Ok(orders);
    }
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT order_id, menu_item_id, name, price, quantity FROM order_items WHERE order_id IN (",
    );
    let mut list = builder.separated(", ");
    for order in &orders {
        list.push_bind(order.id);
    }
    builder.push(") ORDER BY order_id, position");
    let rows = builder.build_query_as::<OrderItemRow>().fetch_all(conn).await?;
    let mut by_order: HashMap<i64, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        by_order.entry(row.order_id).or_default().push(row.item);
    }
    for order in &mut orders {
        order.items = by_order.remove(&order.id).unwrap_or_default();
    }
    Ok(orders)
}
