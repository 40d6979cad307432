use actix_web::{http::StatusCode, web, web::ServiceConfig};
use canteen_common::Paise;
use canteen_engine::{
    db_types::{Cart, CartItem, Role},
    CartApi,
};
use serde_json::json;

use super::helpers::{delete_request, fixtures, get_request, issue_token, json, post_request};
use crate::{
    config::RazorpayConfig,
    endpoint_tests::mocks::MockBackend,
    integrations::RazorpayClient,
    routes::{AddToCartRoute, ClearCartRoute, CreatePaymentOrderRoute, GetCartRoute, RemoveFromCartRoute},
};

fn tea_cart(customer_id: i64, quantity: i64) -> Cart {
    let line = CartItem { menu_item_id: 2, name: "Tea".into(), price: Paise::from_rupees(15), quantity };
    Cart::new(customer_id, Some(1), vec![line])
}

#[actix_web::test]
async fn a_new_customer_has_an_empty_cart() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&issue_token(5, Role::User), "/cart", configure_empty).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let cart = json(&body);
    assert_eq!(cart["customer_id"], 5);
    assert!(cart["canteen_id"].is_null());
    assert_eq!(cart["items"].as_array().unwrap().len(), 0);
    assert_eq!(cart["total_amount"], 0);
}

#[actix_web::test]
async fn adding_an_item_starts_a_cart() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&issue_token(5, Role::User), "/cart/add", json!({"item_id": 2}), configure_empty).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let cart = json(&body);
    assert_eq!(cart["canteen_id"], 1);
    assert_eq!(cart["items"][0]["name"], "Tea");
    assert_eq!(cart["items"][0]["quantity"], 1);
    assert_eq!(cart["total_amount"], 1500);
}

#[actix_web::test]
async fn unknown_items_cannot_be_added() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(&issue_token(5, Role::User), "/cart/add", json!({"item_id": 99}), configure_empty).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "Menu item #99 does not exist");
}

#[actix_web::test]
async fn removing_an_item_that_is_not_there() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(&issue_token(5, Role::User), "/cart/remove", json!({"item_id": 2}), configure_empty).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "Menu item #2 is not in the cart");
}

#[actix_web::test]
async fn removing_one_unit() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(&issue_token(5, Role::User), "/cart/remove", json!({"item_id": 2}), configure_with_cart).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let cart = json(&body);
    assert_eq!(cart["items"][0]["quantity"], 1);
    assert_eq!(cart["total_amount"], 1500);
}

#[actix_web::test]
async fn clearing_the_cart() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(5, Role::User);
    let (status, body) = delete_request(&token, "/cart", configure_with_cart).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], "Cart cleared");

    let (status, body) = delete_request(&token, "/cart", configure_empty).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["message"], "Cart was already empty");
}

#[actix_web::test]
async fn an_empty_cart_cannot_be_paid_for() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request(&issue_token(5, Role::User), "/payment/order", json!({}), configure_empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "The cart is empty");
}

#[actix_web::test]
async fn payment_orders_need_gateway_credentials() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request(&issue_token(5, Role::User), "/payment/order", json!({}), configure_with_cart).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json(&body)["error"],
        "A third-party service failed. The payment gateway credentials are not configured"
    );
}

#[actix_web::test]
async fn carts_are_for_customers_and_staff_only() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&issue_token(9, Role::Admin), "/cart", configure_empty).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["error"], "Insufficient Permissions. Admin may not use this endpoint");

    let (status, _) = get_request(&issue_token(2, Role::CanteenAdmin), "/cart", configure_empty).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = get_request("", "/cart", configure_empty).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

fn register_routes(cfg: &mut ServiceConfig, backend: MockBackend) {
    let gateway = RazorpayClient::new(RazorpayConfig::default()).expect("Could not create gateway client");
    cfg.service(GetCartRoute::<MockBackend>::new())
        .service(AddToCartRoute::<MockBackend>::new())
        .service(RemoveFromCartRoute::<MockBackend>::new())
        .service(ClearCartRoute::<MockBackend>::new())
        .service(CreatePaymentOrderRoute::<MockBackend>::new())
        .app_data(web::Data::new(CartApi::new(backend)))
        .app_data(web::Data::new(gateway));
}

fn configure_empty(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_cart().returning(|_| Ok(None));
    backend.expect_delete_cart().returning(|_| Ok(false));
    backend
        .expect_fetch_menu_item()
        .returning(|id| Ok((id == 2).then(|| fixtures::menu_item(2, 1, "Tea", 15))));
    backend.expect_fetch_canteen().returning(|id| Ok(Some(fixtures::canteen(id, "North Block", vec![2]))));
    backend.expect_save_cart().returning(|cart| Ok(cart.clone()));
    register_routes(cfg, backend);
}

fn configure_with_cart(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_fetch_cart().returning(|customer_id| Ok(Some(tea_cart(customer_id, 2))));
    backend.expect_delete_cart().returning(|_| Ok(true));
    backend.expect_save_cart().returning(|cart| Ok(cart.clone()));
    register_routes(cfg, backend);
}
