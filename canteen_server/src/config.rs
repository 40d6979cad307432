use std::{env, io::Write};

use canteen_common::{parse_boolean_flag, Secret};
use chrono::Duration;
use log::*;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_CANTEEN_HOST: &str = "127.0.0.1";
const DEFAULT_CANTEEN_PORT: u16 = 8480;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/canteen.db";
const DEFAULT_TOKEN_LIFETIME_DAYS: i64 = 14;
const DEFAULT_RAZORPAY_API_URL: &str = "https://api.razorpay.com/v1";
const DEFAULT_WHATSAPP_API_URL: &str = "https://api.twilio.com/2010-04-01";
const DEFAULT_COUNTRY_CODE: &str = "+91";
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 25;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    pub razorpay: RazorpayConfig,
    pub whatsapp: WhatsAppConfig,
    /// When true, order status changes must follow the kitchen flow (Paid → Preparing → Ready → Completed).
    /// Otherwise canteen admins may set any status, e.g. to correct a mistake.
    pub strict_transitions: bool,
    /// Queue length of each order event handler.
    pub event_buffer_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_CANTEEN_HOST.to_string(),
            port: DEFAULT_CANTEEN_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            razorpay: RazorpayConfig::default(),
            whatsapp: WhatsAppConfig::default(),
            strict_transitions: false,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("CANTEEN_HOST").ok().unwrap_or_else(|| DEFAULT_CANTEEN_HOST.into());
        let port = env::var("CANTEEN_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for CANTEEN_PORT. {e} Using the default, {DEFAULT_CANTEEN_PORT}, \
                         instead."
                    );
                    DEFAULT_CANTEEN_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_CANTEEN_PORT);
        let database_url = env::var("CANTEEN_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ CANTEEN_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let razorpay = RazorpayConfig::from_env_or_defaults();
        let whatsapp = WhatsAppConfig::from_env_or_defaults();
        let strict_transitions = parse_boolean_flag(env::var("CANTEEN_STRICT_ORDER_TRANSITIONS").ok(), false);
        let event_buffer_size = env::var("CANTEEN_EVENT_BUFFER_SIZE")
            .ok()
            .and_then(|s| {
                s.parse::<usize>()
                    .ok()
                    .filter(|n| *n > 0)
                    .or_else(|| {
                        error!("🪛️ Invalid value for CANTEEN_EVENT_BUFFER_SIZE: {s}. Using {DEFAULT_EVENT_BUFFER_SIZE}");
                        None
                    })
            })
            .unwrap_or(DEFAULT_EVENT_BUFFER_SIZE);
        Self { host, port, database_url, auth, razorpay, whatsapp, strict_transitions, event_buffer_size }
    }
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
#[derive(Clone, Debug)]
pub struct AuthConfig {
    /// HS256 key for signing and verifying access tokens.
    pub jwt_secret: Secret<String>,
    pub token_lifetime: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT signing key has not been set. I'm using a random value for this session. DO NOT operate on \
             production like this since every user will be logged out when the server restarts. 🚨️🚨️🚨️"
        );
        let secret = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect::<String>();
        match &mut tmpfile {
            Some((f, p)) => match writeln!(f, "{secret}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The JWT signing key for this session was written to {}. If this is a production instance, \
                     you are doing it wrong! Set the CANTEEN_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the JWT signing key to the temporary file. {e}"),
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT signing key. ");
            },
        }
        Self { jwt_secret: Secret::new(secret), token_lifetime: token_lifetime_from_env() }
    }
}

impl AuthConfig {
    pub fn new(jwt_secret: &str, token_lifetime: Duration) -> Self {
        Self { jwt_secret: Secret::new(jwt_secret.to_string()), token_lifetime }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret = env::var("CANTEEN_JWT_SECRET")
            .map_err(|e| ServerError::ConfigurationError(format!("{e} [CANTEEN_JWT_SECRET]")))?;
        if secret.trim().is_empty() {
            return Err(ServerError::ConfigurationError("CANTEEN_JWT_SECRET is empty".into()));
        }
        Ok(Self { jwt_secret: Secret::new(secret), token_lifetime: token_lifetime_from_env() })
    }
}

fn token_lifetime_from_env() -> Duration {
    env::var("CANTEEN_JWT_EXPIRY_DAYS")
        .map_err(|_| {
            debug!("🪛️ CANTEEN_JWT_EXPIRY_DAYS is not set. Tokens are valid for {DEFAULT_TOKEN_LIFETIME_DAYS} days.")
        })
        .and_then(|s| {
            s.parse::<i64>()
                .ok()
                .filter(|d| *d > 0)
                .map(Duration::days)
                .ok_or_else(|| warn!("🪛️ Invalid configuration value for CANTEEN_JWT_EXPIRY_DAYS: {s}"))
        })
        .unwrap_or_else(|_| Duration::days(DEFAULT_TOKEN_LIFETIME_DAYS))
}

//-------------------------------------------------  RazorpayConfig  ---------------------------------------------------
#[derive(Clone, Debug)]
pub struct RazorpayConfig {
    /// The public key id. Clients need it to open the hosted checkout.
    pub key_id: String,
    /// Authenticates calls to the Orders API, and is the HMAC key for payment signatures.
    pub key_secret: Secret<String>,
    pub api_url: String,
}

impl Default for RazorpayConfig {
    fn default() -> Self {
        Self { key_id: String::default(), key_secret: Secret::default(), api_url: DEFAULT_RAZORPAY_API_URL.into() }
    }
}

impl RazorpayConfig {
    pub fn from_env_or_defaults() -> Self {
        let key_id = env::var("CANTEEN_RAZORPAY_KEY_ID").ok().unwrap_or_else(|| {
            error!("🪛️ CANTEEN_RAZORPAY_KEY_ID is not set. Customers will not be able to pay for orders.");
            String::default()
        });
        let key_secret = env::var("CANTEEN_RAZORPAY_KEY_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ CANTEEN_RAZORPAY_KEY_SECRET is not set. Every payment will fail verification.");
            String::default()
        });
        let api_url = env::var("CANTEEN_RAZORPAY_API_URL").ok().unwrap_or_else(|| DEFAULT_RAZORPAY_API_URL.into());
        Self { key_id, key_secret: Secret::new(key_secret), api_url }
    }
}

//-------------------------------------------------  WhatsAppConfig  ---------------------------------------------------
#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub account_sid: String,
    pub auth_token: Secret<String>,
    /// Sender number, in international format.
    pub from: String,
    pub api_url: String,
    /// Prepended to bare 10-digit mobile numbers.
    pub country_code: String,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            account_sid: String::default(),
            auth_token: Secret::default(),
            from: String::default(),
            api_url: DEFAULT_WHATSAPP_API_URL.into(),
            country_code: DEFAULT_COUNTRY_CODE.into(),
        }
    }
}

impl WhatsAppConfig {
    pub fn from_env_or_defaults() -> Self {
        let account_sid = env::var("CANTEEN_WHATSAPP_ACCOUNT_SID").unwrap_or_default();
        let auth_token = Secret::new(env::var("CANTEEN_WHATSAPP_AUTH_TOKEN").unwrap_or_default());
        let from = env::var("CANTEEN_WHATSAPP_FROM").unwrap_or_default();
        let api_url = env::var("CANTEEN_WHATSAPP_API_URL").ok().unwrap_or_else(|| DEFAULT_WHATSAPP_API_URL.into());
        let country_code = env::var("CANTEEN_WHATSAPP_COUNTRY_CODE").ok().unwrap_or_else(|| DEFAULT_COUNTRY_CODE.into());
        let config = Self { account_sid, auth_token, from, api_url, country_code };
        if config.is_configured() {
            info!("🪛️ WhatsApp notifications will be sent from {}", config.from);
        } else {
            warn!(
                "🪛️ CANTEEN_WHATSAPP_ACCOUNT_SID, CANTEEN_WHATSAPP_AUTH_TOKEN and CANTEEN_WHATSAPP_FROM must all be set \
                 to send notifications. Notifications will only be logged."
            );
        }
        config
    }

    pub fn is_configured(&self) -> bool {
        !self.account_sid.is_empty() && !self.auth_token.is_empty() && !self.from.is_empty()
    }
}
