use std::fmt::Debug;

use canteen_common::Paise;
use log::*;

use crate::{
    canteen_api::catalog_objects::{CanteenPage, MenuPage, Pagination},
    db_types::{time_of_day, Canteen, MenuItem},
    traits::{CanteenQuery, CanteenUpdate, CatalogError, CatalogManagement, MenuItemUpdate, MenuQuery, NewCanteen, NewMenuItem},
};

/// Canteens and menus: public browsing, platform admin management, and the canteen staff's own tools.
///
/// Role checks happen at the route level. This API enforces membership: staff calls fail with
/// [`CatalogError::NotCanteenAdmin`] unless the acting user administers the canteen in question.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

fn clean_search(search: Option<String>) -> Option<String> {
    search.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn require_text(field: &str, value: &str) -> Result<(), CatalogError> {
    if value.trim().is_empty() {
        return Err(CatalogError::ValidationError(format!("{field} is required")));
    }
    Ok(())
}

fn parse_time(field: &str, value: Option<&str>) -> Result<Option<chrono::NaiveTime>, CatalogError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => time_of_day::parse(s)
            .map(Some)
            .map_err(|_| CatalogError::ValidationError(format!("{field} must be HH:MM, not '{s}'"))),
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    //-----------------------------------------   Public   ------------------------------------------------------

    pub async fn list_canteens(
        &self,
        search: Option<String>,
        is_open: Option<bool>,
        page: Pagination,
    ) -> Result<CanteenPage, CatalogError> {
        let query = CanteenQuery { search: clean_search(search), is_open, offset: page.offset(), limit: page.limit };
        let (canteens, total) = self.db.search_canteens(query).await?;
        Ok(CanteenPage { canteens, meta: page.meta(total) })
    }

    pub async fn canteen_menu(
        &self,
        canteen_id: i64,
        search: Option<String>,
        is_available: Option<bool>,
        page: Pagination,
    ) -> Result<MenuPage, CatalogError> {
        let canteen = self.db.fetch_canteen(canteen_id).await?.ok_or(CatalogError::CanteenNotFound(canteen_id))?;
        let query = MenuQuery { search: clean_search(search), is_available, offset: page.offset(), limit: page.limit };
        let (menu, total) = self.db.search_menu(canteen_id, query).await?;
        Ok(MenuPage { canteen, menu, meta: page.meta(total) })
    }

    //-----------------------------------------   Platform admin   ----------------------------------------------

    pub async fn create_canteen(&self, canteen: NewCanteen) -> Result<Canteen, CatalogError> {
        require_text("Canteen name", &canteen.name)?;
        require_text("Location", &canteen.location)?;
        let canteen = self.db.insert_canteen(canteen).await?;
        info!("🏪️ Canteen #{} '{}' created", canteen.id, canteen.name);
        Ok(canteen)
    }

    pub async fn all_canteens(&self) -> Result<Vec<Canteen>, CatalogError> {
        self.db.fetch_all_canteens().await
    }

    pub async fn update_canteen(&self, canteen_id: i64, update: CanteenUpdate) -> Result<Canteen, CatalogError> {
        if update.is_empty() {
            return Err(CatalogError::ValidationError("Nothing to update".into()));
        }
        if let Some(name) = &update.name {
            require_text("Canteen name", name)?;
        }
        if let Some(location) = &update.location {
            require_text("Location", location)?;
        }
        let canteen = self.db.update_canteen(canteen_id, update).await?;
        debug!("🏪️ Canteen #{canteen_id} updated");
        Ok(canteen)
    }

    pub async fn delete_canteen(&self, canteen_id: i64) -> Result<(), CatalogError> {
        self.db.delete_canteen(canteen_id).await?;
        info!("🏪️ Canteen #{canteen_id} deleted");
        Ok(())
    }

    pub async fn add_canteen_admin(&self, canteen_id: i64, user_id: i64) -> Result<Canteen, CatalogError> {
        let canteen = self.db.add_canteen_admin(canteen_id, user_id).await?;
        info!("🏪️ User #{user_id} is now an administrator of canteen #{canteen_id}");
        Ok(canteen)
    }

    pub async fn remove_canteen_admin(&self, canteen_id: i64, user_id: i64) -> Result<Canteen, CatalogError> {
        let canteen = self.db.remove_canteen_admin(canteen_id, user_id).await?;
        info!("🏪️ User #{user_id} is no longer an administrator of canteen #{canteen_id}");
        Ok(canteen)
    }

    //-----------------------------------------   Canteen staff   -----------------------------------------------

    pub async fn canteens_for_admin(&self, user_id: i64) -> Result<Vec<Canteen>, CatalogError> {
        self.db.fetch_canteens_for_admin(user_id).await
    }

    async fn staff_canteen(&self, canteen_id: i64, user_id: i64) -> Result<Canteen, CatalogError> {
        let canteen = self.db.fetch_canteen(canteen_id).await?.ok_or(CatalogError::CanteenNotFound(canteen_id))?;
        if !canteen.is_admin(user_id) {
            warn!("🏪️ User #{user_id} tried to manage canteen #{canteen_id} without being one of its admins");
            return Err(CatalogError::NotCanteenAdmin(canteen_id));
        }
        Ok(canteen)
    }

    /// Flips the manual open/closed override.
    pub async fn toggle_canteen(&self, canteen_id: i64, user_id: i64) -> Result<Canteen, CatalogError> {
        let canteen = self.staff_canteen(canteen_id, user_id).await?;
        let update = CanteenUpdate::default().with_is_open(!canteen.is_open);
        let canteen = self.db.update_canteen(canteen_id, update).await?;
        info!("🏪️ {} is now {}", canteen.name, if canteen.is_open { "open" } else { "closed" });
        Ok(canteen)
    }

    /// Sets the ordering window. Times are `HH:MM`; a blank or missing value clears that end of the window.
    pub async fn set_opening_hours(
        &self,
        canteen_id: i64,
        user_id: i64,
        opening_time: Option<&str>,
        closing_time: Option<&str>,
    ) -> Result<Canteen, CatalogError> {
        let opening = parse_time("Opening time", opening_time)?;
        let closing = parse_time("Closing time", closing_time)?;
        self.staff_canteen(canteen_id, user_id).await?;
        let update = CanteenUpdate::default().with_opening_hours(opening, closing);
        self.db.update_canteen(canteen_id, update).await
    }

    pub async fn add_menu_item(
        &self,
        canteen_id: i64,
        user_id: i64,
        name: &str,
        price: Paise,
        photo: Option<String>,
    ) -> Result<MenuItem, CatalogError> {
        require_text("Item name", name)?;
        if price.is_negative() {
            return Err(CatalogError::ValidationError("Price cannot be negative".into()));
        }
        self.staff_canteen(canteen_id, user_id).await?;
        let item = NewMenuItem { canteen_id, name: name.trim().to_string(), price, photo };
        let item = self.db.insert_menu_item(item).await?;
        debug!("🏪️ Menu item #{} '{}' ({}) added to canteen #{canteen_id}", item.id, item.name, item.price);
        Ok(item)
    }

    async fn staff_menu_item(&self, item_id: i64, user_id: i64) -> Result<MenuItem, CatalogError> {
        let item = self.db.fetch_menu_item(item_id).await?.ok_or(CatalogError::MenuItemNotFound(item_id))?;
        self.staff_canteen(item.canteen_id, user_id).await?;
        Ok(item)
    }

    pub async fn update_menu_item(
        &self,
        item_id: i64,
        user_id: i64,
        update: MenuItemUpdate,
    ) -> Result<MenuItem, CatalogError> {
        if update.is_empty() {
            return Err(CatalogError::ValidationError("Nothing to update".into()));
        }
        if let Some(name) = &update.name {
            require_text("Item name", name)?;
        }
        if update.price.is_some_and(|p| p.is_negative()) {
            return Err(CatalogError::ValidationError("Price cannot be negative".into()));
        }
        self.staff_menu_item(item_id, user_id).await?;
        self.db.update_menu_item(item_id, update).await
    }

    pub async fn delete_menu_item(&self, item_id: i64, user_id: i64) -> Result<(), CatalogError> {
        let item = self.staff_menu_item(item_id, user_id).await?;
        self.db.delete_menu_item(item_id).await?;
        debug!("🏪️ Menu item #{item_id} '{}' deleted from canteen #{}", item.name, item.canteen_id);
        Ok(())
    }
}
