//! Request handler definitions
//!
//! Define each route and its handler here. Handlers translate HTTP into calls on the engine APIs and should stay
//! short; business rules belong in `canteen_engine`.
//!
//! A note about performance:
//! Each worker thread processes its requests sequentially, so a handler that blocks the thread stalls every request
//! queued on that worker. Database and network calls are async for this reason. Never call blocking code here.
use actix_web::{get, web, HttpResponse, Responder};
use canteen_common::CURRENCY_CODE;
use canteen_engine::{
    db_types::Role,
    order_objects::{CheckoutRequest, OrderList},
    traits::{
        CanteenRequestManagement,
        CanteenUpdate,
        CartManagement,
        CatalogManagement,
        NewCanteen,
        OrderManagement,
        UserManagement,
    },
    AuthApi,
    CanteenRequestApi,
    CartApi,
    CatalogApi,
    OrderFlowApi,
};
use log::*;

use crate::{
    auth::{JwtClaims, TokenIssuer},
    data_objects::{
        AdminCanteenUpdate,
        CanteenAdminRequest,
        CanteenListParams,
        CanteenRequestSubmission,
        HoursRequest,
        ItemRequest,
        JsonResponse,
        LoginRequest,
        LoginResponse,
        MenuItemUpdateRequest,
        MenuParams,
        NewCanteenRequest,
        NewMenuItemRequest,
        PaymentOrderResponse,
        RegisterRequest,
        StatusUpdateRequest,
    },
    errors::ServerError,
    integrations::RazorpayClient,
};

// Actix cannot register generic handlers directly, so each one gets a small service factory from the `route!` macro.
// The handler must take exactly one type parameter: the storage backend.
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $bound:path) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $bound + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $bound:path where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]<B>(core::marker::PhantomData<fn() -> B>);}
        paste::paste! { impl<B> [<$name:camel Route>]<B> {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self(core::marker::PhantomData::<fn() -> B>)
            }
        }}
        paste::paste! { impl<B> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<B>
        where
            B: $bound + 'static,
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::<B>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

#[get("/health")]
pub async fn health() -> impl Responder {
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Auth  ----------------------------------------------------
route!(register => Post "/auth/register" impl UserManagement);
/// Creates a customer account and logs it in. The response carries an access token, as for `/auth/login`.
pub async fn register<B: UserManagement>(
    body: web::Json<RegisterRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let RegisterRequest { name, mobile, password } = body.into_inner();
    debug!("💻️ POST register for {mobile}");
    let user = api.register(&name, &mobile, &password).await?;
    let token = signer.issue_token(&user)?;
    Ok(HttpResponse::Created().json(LoginResponse { token, user }))
}

route!(login => Post "/auth/login" impl UserManagement);
pub async fn login<B: UserManagement>(
    body: web::Json<LoginRequest>,
    api: web::Data<AuthApi<B>>,
    signer: web::Data<TokenIssuer>,
) -> Result<HttpResponse, ServerError> {
    let LoginRequest { mobile, password } = body.into_inner();
    debug!("💻️ POST login for {mobile}");
    let user = api.login(&mobile, &password).await?;
    let token = signer.issue_token(&user)?;
    trace!("💻️ Issued access token for user #{}", user.id);
    Ok(HttpResponse::Ok().json(LoginResponse { token, user }))
}

route!(me => Get "/auth/me" impl UserManagement where requires [Role::User, Role::CanteenAdmin, Role::Admin]);
pub async fn me<B: UserManagement>(
    claims: JwtClaims,
    api: web::Data<AuthApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET me for user #{}", claims.sub);
    let user = api.me(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(user))
}

//----------------------------------------------   Catalog (public)  ----------------------------------------
route!(list_canteens => Get "/canteens" impl CatalogManagement);
pub async fn list_canteens<B: CatalogManagement>(
    query: web::Query<CanteenListParams>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = query.into_inner();
    trace!("💻️ GET canteens {params:?}");
    let page = api.list_canteens(params.q.clone(), params.is_open(), params.pagination()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(canteen_menu => Get "/canteens/{id}/menu" impl CatalogManagement);
pub async fn canteen_menu<B: CatalogManagement>(
    path: web::Path<i64>,
    query: web::Query<MenuParams>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let canteen_id = path.into_inner();
    let params = query.into_inner();
    trace!("💻️ GET menu for canteen #{canteen_id} {params:?}");
    let page = api.canteen_menu(canteen_id, params.q.clone(), params.is_available(), params.pagination()).await?;
    Ok(HttpResponse::Ok().json(page))
}

route!(submit_canteen_request => Post "/canteen-requests" impl CanteenRequestManagement);
pub async fn submit_canteen_request<B: CanteenRequestManagement>(
    body: web::Json<CanteenRequestSubmission>,
    api: web::Data<CanteenRequestApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST canteen request for '{}'", req.canteen_name);
    let request = api
        .submit_request(&req.admin_name, &req.canteen_name, &req.working_hours, &req.admin_mobile, &req.admin_password)
        .await?;
    Ok(HttpResponse::Created().json(request))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(get_cart => Get "/cart" impl CartManagement where requires [Role::User, Role::CanteenAdmin]);
pub async fn get_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET cart for user #{}", claims.sub);
    let cart = api.get_cart(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(add_to_cart => Post "/cart/add" impl CartManagement where requires [Role::User, Role::CanteenAdmin]);
pub async fn add_to_cart<B: CartManagement>(
    claims: JwtClaims,
    body: web::Json<ItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = body.item_id;
    debug!("💻️ POST add item #{item_id} to the cart of user #{}", claims.sub);
    let cart = api.add_item(claims.user_id(), item_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(remove_from_cart => Post "/cart/remove" impl CartManagement where requires [Role::User, Role::CanteenAdmin]);
pub async fn remove_from_cart<B: CartManagement>(
    claims: JwtClaims,
    body: web::Json<ItemRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = body.item_id;
    debug!("💻️ POST remove item #{item_id} from the cart of user #{}", claims.sub);
    let cart = api.remove_item(claims.user_id(), item_id).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(clear_cart => Delete "/cart" impl CartManagement where requires [Role::User, Role::CanteenAdmin]);
pub async fn clear_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ DELETE cart for user #{}", claims.sub);
    let removed = api.clear_cart(claims.user_id()).await?;
    let message = if removed { "Cart cleared" } else { "Cart was already empty" };
    Ok(HttpResponse::Ok().json(JsonResponse::success(message)))
}

//----------------------------------------------   Payment  -------------------------------------------------
route!(create_payment_order => Post "/payment/order" impl CartManagement where requires [Role::User, Role::CanteenAdmin]);
/// Opens a gateway order for the customer's current cart total. Nothing is stored; the order row is created when the
/// payment is verified.
pub async fn create_payment_order<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
    gateway: web::Data<RazorpayClient>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST payment order for user #{}", claims.sub);
    let cart = api.payable_cart(claims.user_id()).await?;
    let order = gateway.create_order(cart.total_amount).await?;
    let response = PaymentOrderResponse {
        gateway_order_id: order.id,
        amount: order.amount,
        currency: if order.currency.is_empty() { CURRENCY_CODE.to_string() } else { order.currency },
        key_id: gateway.key_id().to_string(),
    };
    Ok(HttpResponse::Ok().json(response))
}

//----------------------------------------------   Orders  --------------------------------------------------
route!(verify_payment => Post "/order/verify" impl OrderManagement where requires [Role::User, Role::CanteenAdmin]);
/// Verifies the gateway's payment signature and, if it checks out, turns the customer's stored cart into a paid order.
pub async fn verify_payment<B: OrderManagement>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let CheckoutRequest { proof, cart } = body.into_inner();
    debug!("💻️ POST verify payment {} for user #{}", proof.gateway_order_id, claims.sub);
    let order = api.create_order_from_payment(claims.user_id(), proof, cart).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(canteen_orders => Get "/order/canteen" impl OrderManagement where requires [Role::CanteenAdmin]);
pub async fn canteen_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET canteen orders for user #{}", claims.sub);
    let orders = api.orders_for_canteen_admin(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(OrderList::from(orders)))
}

route!(my_orders => Get "/order/my" impl OrderManagement where requires [Role::User, Role::CanteenAdmin]);
pub async fn my_orders<B: OrderManagement>(
    claims: JwtClaims,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET my orders for user #{}", claims.sub);
    let orders = api.orders_for_customer(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(OrderList::from(orders)))
}

route!(order_by_id => Get "/order/{id}" impl OrderManagement where requires [Role::User, Role::CanteenAdmin, Role::Admin]);
pub async fn order_by_id<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    trace!("💻️ GET order #{order_id} for user #{}", claims.sub);
    let order = api.fetch_order(order_id, claims.user_id(), claims.role).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(update_order_status => Put "/order/{id}/status" impl OrderManagement where requires [Role::CanteenAdmin]);
pub async fn update_order_status<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<StatusUpdateRequest>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let status = body.into_inner().status;
    debug!("💻️ PUT status of order #{order_id} to {status} by user #{}", claims.sub);
    let order = api.advance_order_status(order_id, &status, claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(cancel_order => Put "/order/{id}/cancel" impl OrderManagement where requires [Role::User, Role::CanteenAdmin]);
pub async fn cancel_order<B: OrderManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ PUT cancel order #{order_id} by user #{}", claims.sub);
    let order = api.cancel_order_by_customer(order_id, claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Canteen staff  -------------------------------------------
route!(my_canteens => Get "/canteen/mine" impl CatalogManagement where requires [Role::CanteenAdmin]);
pub async fn my_canteens<B: CatalogManagement>(
    claims: JwtClaims,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET canteens run by user #{}", claims.sub);
    let canteens = api.canteens_for_admin(claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(canteens))
}

route!(toggle_canteen => Put "/canteen/{id}/toggle" impl CatalogManagement where requires [Role::CanteenAdmin]);
pub async fn toggle_canteen<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let canteen_id = path.into_inner();
    debug!("💻️ PUT toggle canteen #{canteen_id} by user #{}", claims.sub);
    let canteen = api.toggle_canteen(canteen_id, claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(canteen))
}

route!(set_opening_hours => Put "/canteen/{id}/hours" impl CatalogManagement where requires [Role::CanteenAdmin]);
pub async fn set_opening_hours<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<HoursRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let canteen_id = path.into_inner();
    let hours = body.into_inner();
    debug!("💻️ PUT hours of canteen #{canteen_id} to {hours:?}");
    let canteen = api
        .set_opening_hours(canteen_id, claims.user_id(), hours.opening_time.as_deref(), hours.closing_time.as_deref())
        .await?;
    Ok(HttpResponse::Ok().json(canteen))
}

route!(add_menu_item => Post "/canteen/{id}/menu" impl CatalogManagement where requires [Role::CanteenAdmin]);
pub async fn add_menu_item<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<NewMenuItemRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let canteen_id = path.into_inner();
    let NewMenuItemRequest { name, price, photo } = body.into_inner();
    debug!("💻️ POST menu item '{name}' to canteen #{canteen_id}");
    let item = api.add_menu_item(canteen_id, claims.user_id(), &name, price, photo).await?;
    Ok(HttpResponse::Created().json(item))
}

route!(update_menu_item => Put "/menu/{id}" impl CatalogManagement where requires [Role::CanteenAdmin]);
pub async fn update_menu_item<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<MenuItemUpdateRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    debug!("💻️ PUT menu item #{item_id} by user #{}", claims.sub);
    let item = api.update_menu_item(item_id, claims.user_id(), body.into_inner().into()).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(delete_menu_item => Delete "/menu/{id}" impl CatalogManagement where requires [Role::CanteenAdmin]);
pub async fn delete_menu_item<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    debug!("💻️ DELETE menu item #{item_id} by user #{}", claims.sub);
    api.delete_menu_item(item_id, claims.user_id()).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Menu item {item_id} deleted"))))
}

//----------------------------------------------   Platform admin  ------------------------------------------
route!(all_canteens => Get "/admin/canteens" impl CatalogManagement where requires [Role::Admin]);
pub async fn all_canteens<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET all canteens");
    let canteens = api.all_canteens().await?;
    Ok(HttpResponse::Ok().json(canteens))
}

route!(create_canteen => Post "/admin/canteens" impl CatalogManagement where requires [Role::Admin]);
pub async fn create_canteen<B: CatalogManagement>(
    body: web::Json<NewCanteenRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let new_canteen: NewCanteen = body.into_inner().try_into()?;
    debug!("💻️ POST new canteen {new_canteen:?}");
    let canteen = api.create_canteen(new_canteen).await?;
    Ok(HttpResponse::Created().json(canteen))
}

route!(update_canteen => Put "/admin/canteens/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn update_canteen<B: CatalogManagement>(
    path: web::Path<i64>,
    body: web::Json<AdminCanteenUpdate>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let canteen_id = path.into_inner();
    let update: CanteenUpdate = body.into_inner().try_into()?;
    debug!("💻️ PUT canteen #{canteen_id} {update:?}");
    let canteen = api.update_canteen(canteen_id, update).await?;
    Ok(HttpResponse::Ok().json(canteen))
}

route!(delete_canteen => Delete "/admin/canteens/{id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn delete_canteen<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let canteen_id = path.into_inner();
    debug!("💻️ DELETE canteen #{canteen_id}");
    api.delete_canteen(canteen_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Canteen {canteen_id} deleted"))))
}

route!(add_canteen_admin => Post "/admin/canteens/{id}/admins" impl CatalogManagement where requires [Role::Admin]);
pub async fn add_canteen_admin<B: CatalogManagement>(
    path: web::Path<i64>,
    body: web::Json<CanteenAdminRequest>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let canteen_id = path.into_inner();
    let user_id = body.user_id;
    debug!("💻️ POST admin #{user_id} to canteen #{canteen_id}");
    let canteen = api.add_canteen_admin(canteen_id, user_id).await?;
    Ok(HttpResponse::Ok().json(canteen))
}

route!(remove_canteen_admin => Delete "/admin/canteens/{id}/admins/{user_id}" impl CatalogManagement where requires [Role::Admin]);
pub async fn remove_canteen_admin<B: CatalogManagement>(
    path: web::Path<(i64, i64)>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (canteen_id, user_id) = path.into_inner();
    debug!("💻️ DELETE admin #{user_id} from canteen #{canteen_id}");
    let canteen = api.remove_canteen_admin(canteen_id, user_id).await?;
    Ok(HttpResponse::Ok().json(canteen))
}

route!(list_users => Get "/admin/users" impl UserManagement where requires [Role::Admin]);
pub async fn list_users<B: UserManagement>(api: web::Data<AuthApi<B>>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET all users");
    let users = api.list_users().await?;
    Ok(HttpResponse::Ok().json(users))
}

route!(list_canteen_requests => Get "/admin/canteen-requests" impl CanteenRequestManagement where requires [Role::Admin]);
pub async fn list_canteen_requests<B: CanteenRequestManagement>(
    api: web::Data<CanteenRequestApi<B>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ GET canteen requests");
    let requests = api.list_requests().await?;
    Ok(HttpResponse::Ok().json(requests))
}

route!(approve_canteen_request => Post "/admin/canteen-requests/{id}/approve" impl CanteenRequestManagement where requires [Role::Admin]);
pub async fn approve_canteen_request<B: CanteenRequestManagement>(
    path: web::Path<i64>,
    api: web::Data<CanteenRequestApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let request_id = path.into_inner();
    debug!("💻️ POST approve canteen request #{request_id}");
    let approved = api.approve_request(request_id).await?;
    Ok(HttpResponse::Ok().json(approved))
}
