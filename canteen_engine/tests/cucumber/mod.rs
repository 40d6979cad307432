mod canteen_world;
mod setups;
mod steps;

pub use canteen_world::{CanteenSystem, CanteenWorld};
