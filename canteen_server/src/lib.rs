//! # Canteen server
//! The HTTP front end of the canteen ordering service. It is responsible for:
//! * Authenticating users with bearer tokens and enforcing the role required by each route.
//! * Translating requests into calls on the canteen engine APIs, and engine errors into JSON error responses.
//! * Creating payment gateway orders before the hosted checkout.
//! * Sending WhatsApp notifications when orders are placed, become ready, or are cancelled.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! See [routes](routes/index.html). Public routes include `/health`, `/auth/register`, `/auth/login`, `/canteens` and
//! `/canteens/{id}/menu`. Everything else requires an `Authorization: Bearer <token>` header.
pub mod auth;
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod notifications;
pub mod routes;
pub mod server;
