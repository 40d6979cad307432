use actix_web::{http::StatusCode, web, web::ServiceConfig};
use canteen_common::{Paise, Secret};
use canteen_engine::{
    db_types::{Cart, CartItem, Order, OrderStatusType, Role},
    events::EventProducers,
    helpers::PaymentSignature,
    OrderFlowApi,
};
use chrono::Utc;
use serde_json::{json, Value};

use super::helpers::{fixtures, get_request, issue_token, json, post_request, put_request};
use crate::{
    endpoint_tests::mocks::MockBackend,
    routes::{
        CancelOrderRoute,
        CanteenOrdersRoute,
        MyOrdersRoute,
        OrderByIdRoute,
        UpdateOrderStatusRoute,
        VerifyPaymentRoute,
    },
};

const PAYMENT_SECRET: &str = "rzp_test_endpoint_secret";

// Customer 1 owns orders 10 (Paid) and 11 (Completed), both at canteen 3, which is run by user 2.
fn stored_order(id: i64) -> Option<Order> {
    match id {
        10 => Some(fixtures::order(10, 1, 3, OrderStatusType::Paid)),
        11 => Some(fixtures::order(11, 1, 3, OrderStatusType::Completed)),
        _ => None,
    }
}

// Customer 1 has a Masala Dosa and two teas at canteen 3 waiting to be paid for.
fn stored_cart(customer_id: i64) -> Option<Cart> {
    let line = |menu_item_id: i64, name: &str, price: i64, quantity: i64| CartItem {
        menu_item_id,
        name: name.into(),
        price: Paise::from(price),
        quantity,
    };
    let items = vec![line(7, "Masala Dosa", 5000, 1), line(8, "Tea", 1500, 2)];
    (customer_id == 1).then(|| Cart::new(1, Some(3), items))
}

fn valid_signature() -> String {
    PaymentSignature::new(Secret::new(PAYMENT_SECRET.to_string())).sign("order_Pq1", "pay_Zx9").unwrap()
}

fn checkout_body(signature: &str) -> Value {
    json!({
        "gateway_order_id": "order_Pq1",
        "payment_id": "pay_Zx9",
        "signature": signature,
        "cart": {
            "canteen_id": 3,
            "items": [
                {"menu_item_id": 7, "name": "Masala Dosa", "price": 5000, "quantity": 1},
                {"menu_item_id": 8, "name": "Tea", "price": 1500, "quantity": 2}
            ],
            "total_amount": 8000
        }
    })
}

#[actix_web::test]
async fn verified_payments_become_paid_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(&issue_token(1, Role::User), "/order/verify", checkout_body(&valid_signature()), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let order = json(&body);
    assert_eq!(order["id"], 20);
    assert_eq!(order["status"], "Paid");
    assert_eq!(order["amount"], 8000);
    assert_eq!(order["customer_id"], 1);
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(order["gateway_order_id"], "order_Pq1");
}

#[actix_web::test]
async fn checkout_charges_stored_prices() {
    let _ = env_logger::try_init().ok();
    let mut body = checkout_body(&valid_signature());
    body["cart"] = json!({
        "canteen_id": 3,
        "items": [{"menu_item_id": 7, "name": "Masala Dosa", "price": 1, "quantity": 10}],
        "total_amount": 10
    });
    let (status, body) = post_request(&issue_token(1, Role::User), "/order/verify", body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert_eq!(json(&body)["error"], "Invalid order: The cart changed during checkout. Please review it and pay again");

    let mut body = checkout_body(&valid_signature());
    body.as_object_mut().unwrap().remove("cart");
    let (status, body) = post_request(&issue_token(1, Role::User), "/order/verify", body, configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["amount"], 8000);
    assert_eq!(json(&body)["items"][1]["price"], 1500);
}

#[actix_web::test]
async fn checkout_without_a_stored_cart_fails() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(&issue_token(5, Role::User), "/order/verify", checkout_body(&valid_signature()), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Invalid order: The cart is empty");
}

#[actix_web::test]
async fn oversized_carts_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut body = checkout_body(&valid_signature());
    let huge = i64::MAX / 2 + 1;
    body["cart"]["items"] = json!([{"menu_item_id": 7, "name": "Masala Dosa", "price": huge, "quantity": 2}]);
    let (status, body) = post_request(&issue_token(1, Role::User), "/order/verify", body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Invalid order: The cart total is too large");
}

#[actix_web::test]
async fn signatures_must_be_lowercase_hex() {
    let _ = env_logger::try_init().ok();
    let shouted = valid_signature().to_uppercase();
    let (status, body) =
        post_request(&issue_token(1, Role::User), "/order/verify", checkout_body(&shouted), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Payment verification failed. Invalid signature");
}

#[actix_web::test]
async fn forged_signatures_are_rejected() {
    let _ = env_logger::try_init().ok();
    let other_key = PaymentSignature::new(Secret::new("someone-elses-secret".to_string()));
    let forged = other_key.sign("order_Pq1", "pay_Zx9").unwrap();
    let (status, body) =
        post_request(&issue_token(1, Role::User), "/order/verify", checkout_body(&forged), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Payment verification failed. Invalid signature");
}

#[actix_web::test]
async fn incomplete_payment_details_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut body = checkout_body("abcd");
    body["payment_id"] = json!("");
    let (status, body) = post_request(&issue_token(1, Role::User), "/order/verify", body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Missing payment details");
}

#[actix_web::test]
async fn staff_move_orders_through_the_kitchen() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(2, Role::CanteenAdmin);
    let (status, body) = put_request(&token, "/order/10/status", Some(json!({"status": "Preparing"})), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["status"], "Preparing");
}

#[actix_web::test]
async fn staff_of_other_canteens_cannot_touch_an_order() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(4, Role::CanteenAdmin);
    let (status, body) = put_request(&token, "/order/10/status", Some(json!({"status": "Ready"})), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["error"], "Insufficient Permissions. Not your canteen order");
}

#[actix_web::test]
async fn status_names_must_be_exact() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(2, Role::CanteenAdmin);
    let (status, body) = put_request(&token, "/order/10/status", Some(json!({"status": "Done"})), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Invalid order status: Done");

    for padded in [" Ready", "ready", "Ready "] {
        let (status, _) = put_request(&token, "/order/10/status", Some(json!({"status": padded})), configure).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{padded:?} was accepted");
    }

    let (status, _) = put_request(&token, "/order/99/status", Some(json!({"status": "Ready"})), configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn customers_cannot_set_statuses() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(1, Role::User);
    let (status, _) = put_request(&token, "/order/10/status", Some(json!({"status": "Completed"})), configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn customers_cancel_paid_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = put_request(&issue_token(1, Role::User), "/order/10/cancel", None, configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["status"], "Cancelled");
}

#[actix_web::test]
async fn completed_orders_cannot_be_cancelled() {
    let _ = env_logger::try_init().ok();
    let (status, body) = put_request(&issue_token(1, Role::User), "/order/11/cancel", None, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Order #11 is Completed and can no longer be cancelled");
}

#[actix_web::test]
async fn only_the_customer_can_cancel() {
    let _ = env_logger::try_init().ok();
    let (status, body) = put_request(&issue_token(5, Role::User), "/order/10/cancel", None, configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["error"], "Insufficient Permissions. Not your order");
}

#[actix_web::test]
async fn order_lists() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&issue_token(1, Role::User), "/order/my", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let list = json(&body);
    assert_eq!(list["total"], 2);
    assert_eq!(list["orders"][0]["id"], 11);

    let (status, body) = get_request(&issue_token(2, Role::CanteenAdmin), "/order/canteen", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["total"], 2);

    let (status, body) = get_request(&issue_token(4, Role::CanteenAdmin), "/order/canteen", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["total"], 0);

    let (status, _) = get_request(&issue_token(1, Role::User), "/order/canteen", configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn who_can_see_an_order() {
    let _ = env_logger::try_init().ok();
    let cases = [
        (issue_token(1, Role::User), StatusCode::OK),
        (issue_token(2, Role::CanteenAdmin), StatusCode::OK),
        (issue_token(9, Role::Admin), StatusCode::OK),
        (issue_token(5, Role::User), StatusCode::FORBIDDEN),
        (issue_token(4, Role::CanteenAdmin), StatusCode::FORBIDDEN),
    ];
    for (token, expected) in cases {
        let (status, body) = get_request(&token, "/order/10", configure).await;
        assert_eq!(status, expected, "{body}");
    }
    let (status, body) = get_request(&issue_token(1, Role::User), "/order/99", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "Order #99 does not exist");

    let (status, _) = get_request(&issue_token(1, Role::User), "/order/ten", configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_order().returning(|id| Ok(stored_order(id)));
    backend.expect_fetch_cart().returning(|customer_id| Ok(stored_cart(customer_id)));
    backend.expect_fetch_canteen().returning(|id| Ok((id == 3).then(|| fixtures::canteen(3, "North Block", vec![2]))));
    backend.expect_insert_order_and_clear_cart().returning(|new_order| {
        Ok(Order {
            id: 20,
            customer_id: new_order.customer_id,
            canteen_id: new_order.canteen_id,
            items: new_order.items,
            amount: new_order.amount,
            gateway_order_id: new_order.gateway_order_id,
            payment_id: new_order.payment_id,
            signature: new_order.signature,
            status: new_order.status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    });
    backend.expect_update_order_status().returning(|id, status| {
        Ok(stored_order(id).map(|mut order| {
            order.status = status;
            order
        }))
    });
    backend.expect_cancel_order().returning(|id, from| {
        Ok(stored_order(id).filter(|o| from.contains(&o.status)).map(|mut order| {
            order.status = OrderStatusType::Cancelled;
            order
        }))
    });
    backend.expect_fetch_orders_for_customer().returning(|customer_id| {
        let orders = [11, 10].into_iter().filter_map(stored_order).filter(|o| o.customer_id == customer_id).collect();
        Ok(orders)
    });
    backend.expect_fetch_orders_for_canteen_admin().returning(|user_id| {
        let orders = if user_id == 2 { [11, 10].into_iter().filter_map(stored_order).collect() } else { vec![] };
        Ok(orders)
    });
    let api = OrderFlowApi::new(backend, EventProducers::default(), Secret::new(PAYMENT_SECRET.to_string()));
    cfg.service(VerifyPaymentRoute::<MockBackend>::new())
        .service(CanteenOrdersRoute::<MockBackend>::new())
        .service(MyOrdersRoute::<MockBackend>::new())
        .service(OrderByIdRoute::<MockBackend>::new())
        .service(UpdateOrderStatusRoute::<MockBackend>::new())
        .service(CancelOrderRoute::<MockBackend>::new())
        .app_data(web::Data::new(api));
}
