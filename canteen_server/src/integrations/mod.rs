//! Clients for the third-party services the server talks to: the Razorpay Orders API and a Twilio-style WhatsApp API.
mod razorpay;
mod whatsapp;

pub use razorpay::{GatewayError, GatewayOrder, RazorpayClient};
pub use whatsapp::{international_number, LogOnlySender, MessageError, MessageSender, TwilioWhatsApp};
