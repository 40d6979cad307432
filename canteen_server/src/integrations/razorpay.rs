use std::sync::Arc;

use canteen_common::{Paise, CURRENCY_CODE};
use chrono::Utc;
use log::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::RazorpayConfig;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Could not create the payment gateway client. {0}")]
    Initialization(String),
    #[error("The payment gateway could not be reached. {0}")]
    RequestError(String),
    #[error("The payment gateway rejected the request ({status}). {message}")]
    QueryError { status: u16, message: String },
    #[error("Unexpected response from the payment gateway. {0}")]
    JsonError(String),
    #[error("The payment gateway credentials are not configured")]
    NotConfigured,
}

#[derive(Debug, Clone, Serialize)]
struct NewGatewayOrder<'a> {
    amount: i64,
    currency: &'a str,
    receipt: String,
}

/// An order as created by the Razorpay Orders API. Amounts are in paise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: Paise,
    pub currency: String,
    #[serde(default)]
    pub receipt: Option<String>,
    #[serde(default)]
    pub status: String,
}

/// Creates gateway orders ahead of the hosted checkout. Payment verification does not call the gateway; see
/// `canteen_engine::helpers::PaymentSignature`.
#[derive(Clone)]
pub struct RazorpayClient {
    config: RazorpayConfig,
    client: Arc<Client>,
}

impl RazorpayClient {
    pub fn new(config: RazorpayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder().build().map_err(|e| GatewayError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    /// The public key id. Clients pass it to the checkout widget.
    pub fn key_id(&self) -> &str {
        self.config.key_id.as_str()
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.api_url.trim_end_matches('/'))
    }

    pub async fn create_order(&self, amount: Paise) -> Result<GatewayOrder, GatewayError> {
        if self.config.key_id.is_empty() || self.config.key_secret.is_empty() {
            return Err(GatewayError::NotConfigured);
        }
        let body =
            NewGatewayOrder { amount: amount.value(), currency: CURRENCY_CODE, receipt: new_receipt_id() };
        debug!("💳️ Creating gateway order for {amount} with receipt {}", body.receipt);
        let response = self
            .client
            .post(self.url("/orders"))
            .basic_auth(&self.config.key_id, Some(self.config.key_secret.reveal()))
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            let order = response.json::<GatewayOrder>().await.map_err(|e| GatewayError::JsonError(e.to_string()))?;
            info!("💳️ Gateway order {} created for {}", order.id, order.amount);
            Ok(order)
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayError::RequestError(e.to_string()))?;
            warn!("💳️ Gateway order request failed with status {status}. {message}");
            Err(GatewayError::QueryError { status, message })
        }
    }
}

fn new_receipt_id() -> String {
    format!("rcpt_{}", Utc::now().timestamp_millis())
}
