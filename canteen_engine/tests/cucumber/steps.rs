use canteen_common::{Paise, Secret};
use canteen_engine::{
    db_types::{CartItem, OrderItem},
    helpers::{PaymentProof, PaymentSignature},
    order_objects::CartSnapshot,
    traits::{CartManagement, OrderManagement},
};
use cucumber::{then, when};

use crate::cucumber::{canteen_world::GATEWAY_SECRET, CanteenWorld};

#[when(expr = "{string} adds {string} to the cart")]
async fn add_to_cart(world: &mut CanteenWorld, customer: String, item: String) {
    let customer_id = world.user(&customer).id;
    let item_id = world.item(&item).id;
    if let Err(e) = world.system().cart.add_item(customer_id, item_id).await {
        world.last_error = Some(e.to_string());
    }
}

#[when(expr = "{string} removes {string} from the cart")]
async fn remove_from_cart(world: &mut CanteenWorld, customer: String, item: String) {
    let customer_id = world.user(&customer).id;
    let item_id = world.item(&item).id;
    if let Err(e) = world.system().cart.remove_item(customer_id, item_id).await {
        world.last_error = Some(e.to_string());
    }
}

#[then(expr = "the cart of {string} has {int} line(s) totalling {int} rupees")]
async fn check_cart(world: &mut CanteenWorld, customer: String, lines: usize, rupees: i64) {
    let customer_id = world.user(&customer).id;
    let cart = world.system().cart.get_cart(customer_id).await.expect("Error fetching cart");
    assert_eq!(cart.items.len(), lines, "Unexpected number of cart lines");
    assert_eq!(cart.total_amount, Paise::from_rupees(rupees), "Cart total is incorrect");
    let line_sum = CartItem::checked_total(&cart.items);
    assert_eq!(Some(cart.total_amount), line_sum, "Cart total does not match its lines");
}

#[then(expr = "the cart of {string} belongs to {string}")]
async fn check_cart_canteen(world: &mut CanteenWorld, customer: String, canteen: String) {
    let customer_id = world.user(&customer).id;
    let canteen_id = world.canteen(&canteen).id;
    let cart = world.system().cart.get_cart(customer_id).await.expect("Error fetching cart");
    assert_eq!(cart.canteen_id, Some(canteen_id));
}

#[then(expr = "the cart of {string} contains {int} x {string}")]
async fn check_cart_line(world: &mut CanteenWorld, customer: String, quantity: i64, item: String) {
    let customer_id = world.user(&customer).id;
    let cart = world.system().cart.get_cart(customer_id).await.expect("Error fetching cart");
    let line = cart.items.iter().find(|i| i.name == item).unwrap_or_else(|| panic!("{item} is not in the cart"));
    assert_eq!(line.quantity, quantity);
}

#[then(expr = "{string} has no cart")]
async fn check_no_cart(world: &mut CanteenWorld, customer: String) {
    let customer_id = world.user(&customer).id;
    let cart = world.system().db.fetch_cart(customer_id).await.expect("Error fetching cart");
    assert!(cart.is_none(), "Cart still exists: {cart:?}");
}

async fn checkout(world: &mut CanteenWorld, customer: String, proof: PaymentProof) {
    let customer_id = world.user(&customer).id;
    let cart = world.system().cart.get_cart(customer_id).await.expect("Error fetching cart");
    let snapshot = CartSnapshot::from(cart);
    world.checked_out = Some(snapshot.clone());
    match world.system().orders.create_order_from_payment(customer_id, proof, snapshot).await {
        Ok(order) => world.last_order = Some(order),
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "{string} checks out with gateway order {string} and payment {string}")]
async fn checkout_with_valid_proof(world: &mut CanteenWorld, customer: String, order_id: String, payment_id: String) {
    let signer = PaymentSignature::new(Secret::new(GATEWAY_SECRET.to_string()));
    let signature = signer.sign(&order_id, &payment_id).expect("Could not sign");
    let proof = PaymentProof::new(order_id.as_str(), payment_id.as_str(), signature.as_str());
    checkout(world, customer, proof).await;
}

#[when(expr = "{string} checks out with gateway order {string}, payment {string} and signature {string}")]
async fn checkout_with_signature(
    world: &mut CanteenWorld,
    customer: String,
    order_id: String,
    payment_id: String,
    signature: String,
) {
    let proof = PaymentProof::new(order_id.as_str(), payment_id.as_str(), signature.as_str());
    checkout(world, customer, proof).await;
}

#[then(expr = "the order is {string} for {int} rupees")]
async fn check_order(world: &mut CanteenWorld, status: String, rupees: i64) {
    let order = world.last_order();
    assert_eq!(order.status.to_string(), status);
    assert_eq!(order.amount, Paise::from_rupees(rupees));
}

#[then("the order items match the cart that was checked out")]
async fn check_order_items(world: &mut CanteenWorld) {
    let snapshot = world.checked_out.as_ref().expect("Nothing was checked out");
    let expected = snapshot.items.iter().cloned().map(OrderItem::from).collect::<Vec<_>>();
    assert_eq!(world.last_order().items, expected);
}

#[then(expr = "{string} has {int} order(s)")]
async fn check_order_count(world: &mut CanteenWorld, customer: String, count: usize) {
    let customer_id = world.user(&customer).id;
    let orders = world.system().orders.orders_for_customer(customer_id).await.expect("Error fetching orders");
    assert_eq!(orders.len(), count);
}

#[when(expr = "{string} sets the order status to {string}")]
async fn advance_status(world: &mut CanteenWorld, admin: String, status: String) {
    let admin_id = world.user(&admin).id;
    let order_id = world.last_order().id;
    match world.system().orders.advance_order_status(order_id, &status, admin_id).await {
        Ok(order) => world.last_order = Some(order),
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "{string} cancels the order")]
async fn cancel(world: &mut CanteenWorld, customer: String) {
    let customer_id = world.user(&customer).id;
    let order_id = world.last_order().id;
    match world.system().orders.cancel_order_by_customer(order_id, customer_id).await {
        Ok(order) => world.last_order = Some(order),
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[then(expr = "the stored order status is {string}")]
async fn check_stored_status(world: &mut CanteenWorld, status: String) {
    let order_id = world.last_order().id;
    let order = world.system().db.fetch_order(order_id).await.expect("Error fetching order").expect("Order is gone");
    assert_eq!(order.status.to_string(), status);
}

#[then(expr = "the last call fails with {string}")]
async fn check_error(world: &mut CanteenWorld, message: String) {
    let err = world.last_error.take().expect("The last call did not fail");
    assert!(err.contains(&message), "Expected an error containing '{message}', got '{err}'");
}

#[then("no call failed")]
async fn check_no_error(world: &mut CanteenWorld) {
    assert!(world.last_error.is_none(), "Unexpected error: {:?}", world.last_error);
}
