use actix_web::{http::StatusCode, web, web::ServiceConfig};
use canteen_engine::{
    db_types::{CanteenRequest, CanteenRequestStatus, MenuItem, Role},
    traits::{ApprovedCanteenRequest, CatalogError},
    CanteenRequestApi,
    CatalogApi,
};
use serde_json::json;

use super::helpers::{delete_request, fixtures, get_request, issue_token, json, post_request, put_request};
use crate::{
    endpoint_tests::mocks::MockBackend,
    routes::{
        AddMenuItemRoute,
        ApproveCanteenRequestRoute,
        CanteenMenuRoute,
        CreateCanteenRoute,
        DeleteCanteenRoute,
        DeleteMenuItemRoute,
        ListCanteenRequestsRoute,
        ListCanteensRoute,
        SetOpeningHoursRoute,
        SubmitCanteenRequestRoute,
        ToggleCanteenRoute,
        UpdateCanteenRoute,
    },
};

fn canteen_request(id: i64, status: CanteenRequestStatus) -> CanteenRequest {
    CanteenRequest {
        id,
        admin_name: "Meera".into(),
        canteen_name: "South Block".into(),
        working_hours: "08:00-20:00".into(),
        admin_mobile: "9000000007".into(),
        admin_password_hash: String::default(),
        status,
        created_at: fixtures::timestamp(),
        updated_at: fixtures::timestamp(),
    }
}

#[actix_web::test]
async fn browsing_canteens_needs_no_login() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/canteens?q=%20north%20&open=true&page=2&limit=10", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page = json(&body);
    // The mock echoes the query it was given back in the canteen's name and location
    assert_eq!(page["canteens"][0]["name"], "north");
    assert_eq!(page["canteens"][0]["location"], "open: Some(true), offset: 10");
    assert_eq!(page["meta"], json!({"total": 25, "page": 2, "limit": 10, "total_pages": 3}));
}

#[actix_web::test]
async fn sloppy_listing_parameters_fall_back_to_defaults() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/canteens?open=perhaps&page=first&limit=-", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page = json(&body);
    assert_eq!(page["canteens"][0]["location"], "open: None, offset: 0");
    assert_eq!(page["meta"]["limit"], 50);
}

#[actix_web::test]
async fn menus() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("", "/canteens/3/menu?only_available=true", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let page = json(&body);
    assert_eq!(page["canteen"]["name"], "North Block");
    assert_eq!(page["menu"].as_array().unwrap().len(), 1);
    assert_eq!(page["menu"][0]["price"], 5000);
    assert_eq!(page["meta"]["limit"], 200);

    let (status, body) = get_request("", "/canteens/8/menu", configure).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json(&body)["error"], "Canteen #8 does not exist");
}

#[actix_web::test]
async fn admins_create_canteens() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(9, Role::Admin);
    let body =
        json!({"name": "South Block", "location": "Hostel road", "opening_time": "07:30", "closing_time": "21:00"});
    let (status, body) = post_request(&token, "/admin/canteens", body, configure).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let canteen = json(&body);
    assert_eq!(canteen["id"], 12);
    assert_eq!(canteen["opening_time"], "07:30");
    assert_eq!(canteen["closing_time"], "21:00");
}

#[actix_web::test]
async fn canteen_details_are_validated() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(9, Role::Admin);
    let (status, body) =
        post_request(&token, "/admin/canteens", json!({"name": "  ", "location": "Hostel road"}), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Invalid catalog details: Canteen name is required");

    let body = json!({"name": "South Block", "location": "Hostel road", "opening_time": "half seven"});
    let (status, body) = post_request(&token, "/admin/canteens", body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Opening time must be HH:MM, not 'half seven'");

    let (status, body) = put_request(&token, "/admin/canteens/3", Some(json!({})), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Invalid catalog details: Nothing to update");

    let (status, body) = post_request(&token, "/admin/canteens", json!({"name": 42}), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().starts_with("Could not read request body"));
}

#[actix_web::test]
async fn canteens_with_orders_are_kept() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(9, Role::Admin);
    let (status, body) = delete_request(&token, "/admin/canteens/3", configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Canteen #3 has orders and cannot be deleted");

    let (status, body) = delete_request(&token, "/admin/canteens/5", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["message"], "Canteen 5 deleted");

    let (status, _) = delete_request(&issue_token(2, Role::CanteenAdmin), "/admin/canteens/5", configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn staff_open_and_close_their_own_canteens() {
    let _ = env_logger::try_init().ok();
    let (status, body) = put_request(&issue_token(2, Role::CanteenAdmin), "/canteen/3/toggle", None, configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["is_open"], false);

    let (status, body) = put_request(&issue_token(4, Role::CanteenAdmin), "/canteen/3/toggle", None, configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json(&body)["error"], "Insufficient Permissions. You are not an administrator of canteen #3");
}

#[actix_web::test]
async fn staff_set_opening_hours() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(2, Role::CanteenAdmin);
    let body = json!({"opening_time": "09:00", "closing_time": "17:30"});
    let (status, body) = put_request(&token, "/canteen/3/hours", Some(body), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let canteen = json(&body);
    assert_eq!(canteen["opening_time"], "09:00");
    assert_eq!(canteen["closing_time"], "17:30");

    let (status, _) = put_request(&token, "/canteen/3/hours", Some(json!({"opening_time": "25:00"})), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn staff_manage_the_menu() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(2, Role::CanteenAdmin);
    let body = json!({"name": "Vada Pav", "price": 2500});
    let (status, body) = post_request(&token, "/canteen/3/menu", body, configure).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let item = json(&body);
    assert_eq!(item["name"], "Vada Pav");
    assert_eq!(item["canteen_id"], 3);
    assert_eq!(item["is_available"], true);

    let body = json!({"name": "Free lunch", "price": -100});
    let (status, body) = post_request(&token, "/canteen/3/menu", body, configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Invalid catalog details: Price cannot be negative");

    let (status, body) = delete_request(&token, "/menu/7", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["message"], "Menu item 7 deleted");

    let (status, _) = delete_request(&issue_token(4, Role::CanteenAdmin), "/menu/7", configure).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn anyone_can_ask_for_a_canteen() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "admin_name": "Meera",
        "canteen_name": "South Block",
        "working_hours": "08:00-20:00",
        "admin_mobile": "9000000007",
        "admin_password": "kitchen-keys"
    });
    let (status, body) = post_request("", "/canteen-requests", body, configure).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let request = json(&body);
    assert_eq!(request["status"], "Pending");
    assert!(request.get("admin_password_hash").is_none());
}

#[actix_web::test]
async fn admins_approve_canteen_requests() {
    let _ = env_logger::try_init().ok();
    let token = issue_token(9, Role::Admin);
    let (status, body) = get_request(&token, "/admin/canteen-requests", configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body).as_array().unwrap().len(), 1);

    let (status, body) = post_request(&token, "/admin/canteen-requests/1/approve", json!({}), configure).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let approved = json(&body);
    assert_eq!(approved["request"]["status"], "Approved");
    assert_eq!(approved["canteen"]["admins"], json!([7]));
    assert_eq!(approved["admin"]["role"], "CanteenAdmin");

    let (status, body) = post_request(&token, "/admin/canteen-requests/2/approve", json!({}), configure).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "Canteen request #2 has already been approved");
}

fn configure(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_search_canteens().returning(|query| {
        let mut canteen = fixtures::canteen(3, query.search.as_deref().unwrap_or("any"), vec![2]);
        canteen.location = format!("open: {:?}, offset: {}", query.is_open, query.offset);
        Ok((vec![canteen], 25))
    });
    backend.expect_fetch_canteen().returning(|id| Ok((id == 3).then(|| fixtures::canteen(3, "North Block", vec![2]))));
    backend.expect_search_menu().returning(|canteen_id, query| {
        let mut menu = vec![fixtures::menu_item(7, canteen_id, "Masala Dosa", 50)];
        let mut sold_out = fixtures::menu_item(8, canteen_id, "Idli", 30);
        sold_out.is_available = false;
        menu.push(sold_out);
        if let Some(available) = query.is_available {
            menu.retain(|item| item.is_available == available);
        }
        let total = menu.len() as i64;
        Ok((menu, total))
    });
    backend.expect_insert_canteen().returning(|new_canteen| {
        let mut canteen = fixtures::canteen(12, &new_canteen.name, vec![]);
        canteen.location = new_canteen.location;
        canteen.opening_time = new_canteen.opening_time;
        canteen.closing_time = new_canteen.closing_time;
        Ok(canteen)
    });
    backend.expect_update_canteen().returning(|id, update| {
        let mut canteen = fixtures::canteen(id, "North Block", vec![2]);
        if let Some(is_open) = update.is_open {
            canteen.is_open = is_open;
        }
        if let Some((opening, closing)) = update.opening_hours {
            canteen.opening_time = opening;
            canteen.closing_time = closing;
        }
        Ok(canteen)
    });
    backend.expect_delete_canteen().returning(|id| match id {
        3 => Err(CatalogError::CanteenHasOrders(3)),
        _ => Ok(()),
    });
    backend.expect_insert_menu_item().returning(|item| {
        let stored = fixtures::menu_item(30, item.canteen_id, &item.name, 0);
        Ok(MenuItem { price: item.price, photo: item.photo, ..stored })
    });
    backend.expect_fetch_menu_item().returning(|id| Ok((id == 7).then(|| fixtures::menu_item(7, 3, "Masala Dosa", 50))));
    backend.expect_delete_menu_item().returning(|_| Ok(()));
    let mut requests = MockBackend::new();
    requests.expect_insert_canteen_request().returning(|_| Ok(canteen_request(1, CanteenRequestStatus::Pending)));
    requests.expect_fetch_canteen_requests().returning(|| Ok(vec![canteen_request(1, CanteenRequestStatus::Pending)]));
    requests.expect_approve_canteen_request().returning(|id| match id {
        1 => {
            let mut admin = fixtures::user(7, "Meera", Role::CanteenAdmin);
            admin.canteens = vec![13];
            Ok(ApprovedCanteenRequest {
                request: canteen_request(1, CanteenRequestStatus::Approved),
                canteen: fixtures::canteen(13, "South Block", vec![7]),
                admin,
            })
        },
        _ => Err(CatalogError::RequestAlreadyApproved(id)),
    });
    cfg.service(ListCanteensRoute::<MockBackend>::new())
        .service(CanteenMenuRoute::<MockBackend>::new())
        .service(SubmitCanteenRequestRoute::<MockBackend>::new())
        .service(ToggleCanteenRoute::<MockBackend>::new())
        .service(SetOpeningHoursRoute::<MockBackend>::new())
        .service(AddMenuItemRoute::<MockBackend>::new())
        .service(DeleteMenuItemRoute::<MockBackend>::new())
        .service(CreateCanteenRoute::<MockBackend>::new())
        .service(UpdateCanteenRoute::<MockBackend>::new())
        .service(DeleteCanteenRoute::<MockBackend>::new())
        .service(ListCanteenRequestsRoute::<MockBackend>::new())
        .service(ApproveCanteenRequestRoute::<MockBackend>::new())
        .app_data(web::Data::new(CatalogApi::new(backend)))
        .app_data(web::Data::new(CanteenRequestApi::new(requests)));
}
