use serde::{Deserialize, Serialize};

use crate::db_types::{Canteen, MenuItem};

pub const DEFAULT_CANTEEN_PAGE_SIZE: i64 = 50;
pub const MAX_CANTEEN_PAGE_SIZE: i64 = 200;
pub const DEFAULT_MENU_PAGE_SIZE: i64 = 200;
pub const MAX_MENU_PAGE_SIZE: i64 = 500;

/// A 1-based page request with the limit already clamped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
}

impl Pagination {
    /// Missing or non-positive pages become page 1. A missing or zero limit takes the default; others are clamped to
    /// `[1, max_limit]`.
    pub fn new(page: Option<i64>, limit: Option<i64>, default_limit: i64, max_limit: i64) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = match limit {
            None | Some(0) => default_limit,
            Some(l) => l.clamp(1, max_limit),
        };
        Self { page, limit }
    }

    pub fn for_canteens(page: Option<i64>, limit: Option<i64>) -> Self {
        Self::new(page, limit, DEFAULT_CANTEEN_PAGE_SIZE, MAX_CANTEEN_PAGE_SIZE)
    }

    pub fn for_menu(page: Option<i64>, limit: Option<i64>) -> Self {
        Self::new(page, limit, DEFAULT_MENU_PAGE_SIZE, MAX_MENU_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn meta(&self, total: i64) -> PageMeta {
        let total_pages = if total <= 0 { 0 } else { (total + self.limit - 1) / self.limit };
        PageMeta { total, page: self.page, limit: self.limit, total_pages }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanteenPage {
    pub canteens: Vec<Canteen>,
    pub meta: PageMeta,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuPage {
    pub canteen: Canteen,
    pub menu: Vec<MenuItem>,
    pub meta: PageMeta,
}
