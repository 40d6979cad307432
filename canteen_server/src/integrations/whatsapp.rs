use std::sync::Arc;

use futures::future::BoxFuture;
use log::*;
use reqwest::Client;
use thiserror::Error;

use crate::config::WhatsAppConfig;

#[derive(Debug, Clone, Error)]
pub enum MessageError {
    #[error("Could not create the messaging client. {0}")]
    Initialization(String),
    #[error("The messaging provider could not be reached. {0}")]
    RequestError(String),
    #[error("The messaging provider rejected the message ({status}). {message}")]
    Rejected { status: u16, message: String },
}

/// Something that can deliver a text message to a mobile number.
///
/// Senders are shared between the notification hooks, which run on their own tasks, so the returned future must be
/// `Send` and must not borrow from the sender.
pub trait MessageSender: Send + Sync {
    fn send_message(&self, to: &str, body: &str) -> BoxFuture<'static, Result<(), MessageError>>;
}

/// Sends WhatsApp messages through the Twilio Messages API.
#[derive(Clone)]
pub struct TwilioWhatsApp {
    config: WhatsAppConfig,
    client: Arc<Client>,
}

impl TwilioWhatsApp {
    pub fn new(config: WhatsAppConfig) -> Result<Self, MessageError> {
        let client = Client::builder().build().map_err(|e| MessageError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", self.config.api_url.trim_end_matches('/'), self.config.account_sid)
    }
}

impl MessageSender for TwilioWhatsApp {
    fn send_message(&self, to: &str, body: &str) -> BoxFuture<'static, Result<(), MessageError>> {
        let client = Arc::clone(&self.client);
        let url = self.messages_url();
        let sid = self.config.account_sid.clone();
        let token = self.config.auth_token.reveal().clone();
        let from = format!("whatsapp:{}", international_number(&self.config.from, &self.config.country_code));
        let to = format!("whatsapp:{}", international_number(to, &self.config.country_code));
        let body = body.to_string();
        Box::pin(async move {
            trace!("📨️ Sending WhatsApp message to {to}");
            let params = [("From", from.as_str()), ("To", to.as_str()), ("Body", body.as_str())];
            let response = client
                .post(url)
                .basic_auth(sid, Some(token))
                .form(&params)
                .send()
                .await
                .map_err(|e| MessageError::RequestError(e.to_string()))?;
            if response.status().is_success() {
                debug!("📨️ WhatsApp message to {to} accepted");
                Ok(())
            } else {
                let status = response.status().as_u16();
                let message = response.text().await.unwrap_or_default();
                Err(MessageError::Rejected { status, message })
            }
        })
    }
}

/// Used when no messaging credentials are configured. Messages are written to the log and dropped.
#[derive(Clone, Default)]
pub struct LogOnlySender;

impl MessageSender for LogOnlySender {
    fn send_message(&self, to: &str, body: &str) -> BoxFuture<'static, Result<(), MessageError>> {
        info!("📨️ [not sent] To {to}: {body}");
        Box::pin(async { Ok(()) })
    }
}

/// Normalises a mobile number to international format. Ten-digit local numbers get `country_code` prepended;
/// numbers that already start with `+` are left alone.
pub fn international_number(mobile: &str, country_code: &str) -> String {
    let mobile = mobile.trim();
    if mobile.starts_with('+') {
        return mobile.to_string();
    }
    let digits = mobile.chars().filter(char::is_ascii_digit).collect::<String>();
    if digits.len() == 10 {
        format!("{country_code}{digits}")
    } else {
        format!("+{digits}")
    }
}
