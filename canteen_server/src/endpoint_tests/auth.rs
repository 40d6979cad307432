use actix_web::{http::StatusCode, web, web::ServiceConfig};
use canteen_engine::{db_types::Role, helpers::hash_password, AuthApi};
use serde_json::json;

use super::helpers::{expired_token, fixtures, get_request, issue_token, json, post_request, token_issuer};
use crate::{
    endpoint_tests::mocks::MockBackend,
    routes::{health, ListUsersRoute, LoginRoute, MeRoute, RegisterRoute},
};

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/health", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "👍️\n");
}

#[actix_web::test]
async fn login_issues_a_token() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("", "/auth/login", json!({"mobile": "9000000001", "password": "secret123"}), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let body = json(&body);
    assert_eq!(body["user"]["name"], "Alice");
    assert_eq!(body["user"]["role"], "User");
    assert!(body["user"].get("password_hash").is_none());
    let claims = token_issuer().validate(body["token"].as_str().unwrap()).unwrap();
    assert_eq!(claims.user_id(), 1);
    assert_eq!(claims.role, Role::User);
}

#[actix_web::test]
async fn login_with_the_wrong_password() {
    let _ = env_logger::try_init().ok();
    let (status, body) =
        post_request("", "/auth/login", json!({"mobile": "9000000001", "password": "wrong-one"}), configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["error"], "Authentication Error. Invalid mobile number or password.");
}

#[actix_web::test]
async fn login_for_an_unknown_number() {
    let _ = env_logger::try_init().ok();
    let (status, _) =
        post_request("", "/auth/login", json!({"mobile": "9999999999", "password": "secret123"}), configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn malformed_bodies_are_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, body) = post_request("", "/auth/login", json!({"mobile": "9000000001"}), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Could not read request body"));
}

#[actix_web::test]
async fn register_logs_the_new_user_in() {
    let _ = env_logger::try_init().ok();
    let body = json!({"name": "Dave", "mobile": "9000000004", "password": "secret123"});
    let (status, body) = post_request("", "/auth/register", body, configure).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let body = json(&body);
    assert_eq!(body["user"]["id"], 4);
    assert!(token_issuer().validate(body["token"].as_str().unwrap()).is_ok());
}

#[actix_web::test]
async fn register_rejects_duplicates_and_bad_input() {
    let _ = env_logger::try_init().ok();
    let body = json!({"name": "Alice", "mobile": "9000000001", "password": "secret123"});
    let (status, body) = post_request("", "/auth/register", body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "User already exists");

    let body = json!({"name": "Eve", "mobile": "12345", "password": "secret123"});
    let (status, body) = post_request("", "/auth/register", body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Invalid user details: Mobile number must be 10 digits");
}

#[actix_web::test]
async fn me_requires_a_session() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/auth/me", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(json(&body)["error"], "Authentication Error. No access token was provided.");

    let (status, body) = get_request(&issue_token(1, Role::User), "/auth/me", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body)["mobile"], "9000000001");
}

#[actix_web::test]
async fn bad_tokens_are_rejected() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&expired_token(1, Role::User), "/auth/me", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Authentication Error. Access token is invalid."));

    let mut token = issue_token(1, Role::User);
    token.replace_range(token.len() - 10..token.len() - 5, "00000");
    let (status, _) = get_request(&token, "/auth/me", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get_request("garbage", "/health", configure).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn only_admins_list_users() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request(&issue_token(2, Role::CanteenAdmin), "/admin/users", configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["error"], "Insufficient Permissions. CanteenAdmin may not use this endpoint");

    let (status, body) = get_request(&issue_token(9, Role::Admin), "/admin/users", configure).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json(&body).as_array().unwrap().len(), 2);
}

fn configure(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    let password_hash = hash_password("secret123").unwrap();
    backend.expect_fetch_user_by_mobile().returning(move |mobile| match mobile {
        "9000000001" => {
            let mut alice = fixtures::user(1, "Alice", Role::User);
            alice.password_hash = password_hash.clone();
            Ok(Some(alice))
        },
        _ => Ok(None),
    });
    backend.expect_insert_user().returning(|user| {
        let mut new_user = fixtures::user(4, &user.name, user.role);
        new_user.mobile = user.mobile;
        Ok(new_user)
    });
    backend.expect_fetch_user().returning(|id| Ok((id == 1).then(|| fixtures::user(1, "Alice", Role::User))));
    backend
        .expect_list_users()
        .returning(|| Ok(vec![fixtures::user(1, "Alice", Role::User), fixtures::user(2, "Bob", Role::CanteenAdmin)]));
    cfg.service(health)
        .service(RegisterRoute::<MockBackend>::new())
        .service(LoginRoute::<MockBackend>::new())
        .service(MeRoute::<MockBackend>::new())
        .service(ListUsersRoute::<MockBackend>::new())
        .app_data(web::Data::new(AuthApi::new(backend)))
        .app_data(web::Data::new(token_issuer()));
}
