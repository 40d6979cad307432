mod password;
mod payment_signature;

use once_cell::sync::Lazy;
pub use password::{hash_password, verify_password, PasswordError};
pub use payment_signature::{PaymentProof, PaymentSignature, PaymentSignatureError};
use regex::Regex;

static MOBILE_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[0-9]{10}$").expect("mobile number regex is valid"));

/// Mobile numbers are stored as bare 10-digit national numbers.
pub fn is_valid_mobile(mobile: &str) -> bool {
    MOBILE_REGEX.is_match(mobile)
}

pub const MIN_PASSWORD_LENGTH: usize = 6;

pub fn is_acceptable_password(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}
