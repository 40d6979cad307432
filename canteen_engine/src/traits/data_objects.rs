use canteen_common::Paise;
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::db_types::{time_of_day, Canteen, CanteenRequest, User};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCanteen {
    pub name: String,
    pub location: String,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default, with = "time_of_day")]
    pub opening_time: Option<NaiveTime>,
    #[serde(default, with = "time_of_day")]
    pub closing_time: Option<NaiveTime>,
}

impl NewCanteen {
    pub fn new<S: Into<String>>(name: S, location: S) -> Self {
        Self { name: name.into(), location: location.into(), ..Default::default() }
    }
}

/// A partial update. `None` leaves the field unchanged.
///
/// Opening hours are replaced as a pair when `opening_hours` is given; `Some((None, None))` clears the window.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanteenUpdate {
    pub name: Option<String>,
    pub location: Option<String>,
    pub is_open: Option<bool>,
    pub photos: Option<Vec<String>>,
    #[serde(skip)]
    pub opening_hours: Option<(Option<NaiveTime>, Option<NaiveTime>)>,
}

impl CanteenUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.location.is_none() &&
            self.is_open.is_none() &&
            self.photos.is_none() &&
            self.opening_hours.is_none()
    }

    pub fn with_is_open(mut self, is_open: bool) -> Self {
        self.is_open = Some(is_open);
        self
    }

    pub fn with_opening_hours(mut self, opening: Option<NaiveTime>, closing: Option<NaiveTime>) -> Self {
        self.opening_hours = Some((opening, closing));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMenuItem {
    pub canteen_id: i64,
    pub name: String,
    pub price: Paise,
    pub photo: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub price: Option<Paise>,
    pub photo: Option<String>,
    pub is_available: Option<bool>,
}

impl MenuItemUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.price.is_none() && self.photo.is_none() && self.is_available.is_none()
    }
}

/// Search and paging over canteens. `offset`/`limit` are already clamped by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CanteenQuery {
    pub search: Option<String>,
    pub is_open: Option<bool>,
    pub offset: i64,
    pub limit: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuQuery {
    pub search: Option<String>,
    pub is_available: Option<bool>,
    pub offset: i64,
    pub limit: i64,
}

/// Everything produced by approving a canteen request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovedCanteenRequest {
    pub request: CanteenRequest,
    pub canteen: Canteen,
    pub admin: User,
}
