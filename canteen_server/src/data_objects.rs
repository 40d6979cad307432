use std::fmt::Display;

use canteen_common::Paise;
use canteen_engine::{
    catalog_objects::Pagination,
    db_types::{time_of_day, User},
    traits::{CanteenUpdate, MenuItemUpdate, NewCanteen},
};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

//----------------------------------------------   Accounts  ----------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub mobile: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub mobile: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

//----------------------------------------------   Cart & orders  -----------------------------------------------
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ItemRequest {
    pub item_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: String,
}

/// What the client needs to open the hosted checkout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOrderResponse {
    pub gateway_order_id: String,
    pub amount: Paise,
    pub currency: String,
    pub key_id: String,
}

//----------------------------------------------   Catalog  -----------------------------------------------------
fn parse_flag(value: Option<&str>) -> Option<bool> {
    match value.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("true" | "1" | "yes") => Some(true),
        Some("false" | "0" | "no") => Some(false),
        _ => None,
    }
}

fn parse_number(value: Option<&str>) -> Option<i64> {
    value.and_then(|s| s.trim().parse::<i64>().ok())
}

/// Query string of `GET /canteens`. Every field is optional and unparseable values fall back to the defaults, so a
/// sloppy client still gets a listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CanteenListParams {
    pub q: Option<String>,
    pub open: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl CanteenListParams {
    pub fn is_open(&self) -> Option<bool> {
        parse_flag(self.open.as_deref())
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::for_canteens(parse_number(self.page.as_deref()), parse_number(self.limit.as_deref()))
    }
}

/// Query string of `GET /canteens/{id}/menu`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuParams {
    pub only_available: Option<String>,
    pub q: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

impl MenuParams {
    /// `only_available=true` restricts the menu to available items. Anything else shows everything.
    pub fn is_available(&self) -> Option<bool> {
        parse_flag(self.only_available.as_deref()).filter(|only| *only)
    }

    pub fn pagination(&self) -> Pagination {
        Pagination::for_menu(parse_number(self.page.as_deref()), parse_number(self.limit.as_deref()))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HoursRequest {
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMenuItemRequest {
    pub name: String,
    pub price: Paise,
    #[serde(default)]
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MenuItemUpdateRequest {
    pub name: Option<String>,
    pub price: Option<Paise>,
    pub photo: Option<String>,
    pub is_available: Option<bool>,
}

impl From<MenuItemUpdateRequest> for MenuItemUpdate {
    fn from(req: MenuItemUpdateRequest) -> Self {
        Self { name: req.name, price: req.price, photo: req.photo, is_available: req.is_available }
    }
}

fn parse_time(field: &str, value: Option<&str>) -> Result<Option<NaiveTime>, ServerError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => time_of_day::parse(s)
            .map(Some)
            .map_err(|_| ServerError::ValidationError(format!("{field} must be HH:MM, not '{s}'"))),
    }
}

/// Body of `POST /admin/canteens`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewCanteenRequest {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub photos: Vec<String>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
}

impl TryFrom<NewCanteenRequest> for NewCanteen {
    type Error = ServerError;

    fn try_from(req: NewCanteenRequest) -> Result<Self, Self::Error> {
        Ok(NewCanteen {
            opening_time: parse_time("Opening time", req.opening_time.as_deref())?,
            closing_time: parse_time("Closing time", req.closing_time.as_deref())?,
            name: req.name,
            location: req.location,
            photos: req.photos,
        })
    }
}

/// Body of `PUT /admin/canteens/{id}`. Absent fields are left unchanged. If either time is given, both ends of the
/// ordering window are replaced, and a blank time clears that end.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdminCanteenUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub is_open: Option<bool>,
    pub photos: Option<Vec<String>>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
}

impl TryFrom<AdminCanteenUpdate> for CanteenUpdate {
    type Error = ServerError;

    fn try_from(req: AdminCanteenUpdate) -> Result<Self, Self::Error> {
        let mut update = CanteenUpdate {
            name: req.name,
            location: req.location,
            is_open: req.is_open,
            photos: req.photos,
            opening_hours: None,
        };
        if req.opening_time.is_some() || req.closing_time.is_some() {
            let opening = parse_time("Opening time", req.opening_time.as_deref())?;
            let closing = parse_time("Closing time", req.closing_time.as_deref())?;
            update = update.with_opening_hours(opening, closing);
        }
        Ok(update)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CanteenAdminRequest {
    pub user_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanteenRequestSubmission {
    pub admin_name: String,
    pub canteen_name: String,
    pub working_hours: String,
    pub admin_mobile: String,
    pub admin_password: String,
}
