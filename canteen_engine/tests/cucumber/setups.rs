use canteen_common::Paise;
use canteen_engine::{
    db_types::{NewUser, Role},
    traits::{CatalogManagement, NewCanteen, NewMenuItem, UserManagement},
};
use cucumber::given;

use crate::cucumber::{canteen_world::CanteenSystem, CanteenWorld};

#[given("a fresh install")]
async fn fresh_database(world: &mut CanteenWorld) {
    let system = CanteenSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "a customer {string} with mobile {string}")]
async fn customer(world: &mut CanteenWorld, name: String, mobile: String) {
    let user = world
        .system()
        .db
        .insert_user(NewUser::new(name.as_str(), mobile.as_str(), "not-a-real-hash"))
        .await
        .expect("Error inserting customer");
    world.users.insert(name, user);
}

#[given(expr = "{string} with mobile {string} runs the canteen {string}")]
async fn canteen_with_admin(world: &mut CanteenWorld, name: String, mobile: String, canteen: String) {
    let db = &world.system().db;
    let new_user = NewUser::new(name.as_str(), mobile.as_str(), "not-a-real-hash").with_role(Role::CanteenAdmin);
    let admin = db.insert_user(new_user).await.expect("Error inserting canteen admin");
    let new_canteen = db.insert_canteen(NewCanteen::new(canteen.as_str(), "Main campus")).await.expect("Error inserting canteen");
    let new_canteen = db.add_canteen_admin(new_canteen.id, admin.id).await.expect("Error adding canteen admin");
    world.users.insert(name, admin);
    world.canteens.insert(canteen, new_canteen);
}

#[given(expr = "{string} sells {string} for {int} rupees")]
async fn menu_item(world: &mut CanteenWorld, canteen: String, item: String, rupees: i64) {
    let canteen_id = world.canteen(&canteen).id;
    let new_item = NewMenuItem { canteen_id, name: item.clone(), price: Paise::from_rupees(rupees), photo: None };
    let menu_item = world.system().db.insert_menu_item(new_item).await.expect("Error inserting menu item");
    world.items.insert(item, menu_item);
}
