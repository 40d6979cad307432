//! # Payment proof verification
//!
//! After a hosted checkout completes, the payment gateway hands the client three values: the gateway order id, the
//! payment id and a signature. The client forwards them to us, and we must make sure they were really issued by the
//! gateway, otherwise anyone could claim that an order was paid for.
//!
//! The gateway signs with the merchant's key secret, which the client never sees:
//!
//! ```text
//!    signature = hex( HMAC-SHA256(key_secret, "{gateway_order_id}|{payment_id}") )
//! ```
//!
//! Verification recomputes the MAC locally. Nothing is sent to the gateway.
use canteen_common::Secret;
use hmac::{Hmac, Mac};
use log::*;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, Error)]
#[error("Could not initialise the payment signature MAC: {0}")]
pub struct PaymentSignatureError(String);

/// The values returned by the gateway's checkout widget.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentProof {
    #[serde(default)]
    pub gateway_order_id: String,
    #[serde(default)]
    pub payment_id: String,
    #[serde(default)]
    pub signature: String,
}

impl PaymentProof {
    pub fn new<S: Into<String>>(gateway_order_id: S, payment_id: S, signature: S) -> Self {
        Self { gateway_order_id: gateway_order_id.into(), payment_id: payment_id.into(), signature: signature.into() }
    }

    /// True when none of the three fields is blank.
    pub fn is_complete(&self) -> bool {
        [&self.gateway_order_id, &self.payment_id, &self.signature].iter().all(|s| !s.trim().is_empty())
    }
}

#[derive(Clone, Default)]
pub struct PaymentSignature {
    key: Secret<String>,
}

impl PaymentSignature {
    pub fn new(key: Secret<String>) -> Self {
        Self { key }
    }

    fn mac(&self, gateway_order_id: &str, payment_id: &str) -> Result<HmacSha256, PaymentSignatureError> {
        let mut mac = HmacSha256::new_from_slice(self.key.reveal().as_bytes())
            .map_err(|e| PaymentSignatureError(e.to_string()))?;
        mac.update(gateway_order_id.as_bytes());
        mac.update(b"|");
        mac.update(payment_id.as_bytes());
        Ok(mac)
    }

    /// The hex-encoded signature the gateway would produce for these ids.
    pub fn sign(&self, gateway_order_id: &str, payment_id: &str) -> Result<String, PaymentSignatureError> {
        let mac = self.mac(gateway_order_id, payment_id)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// Checks the proof in constant time. The signature must be exactly what [`Self::sign`] produces: lowercase hex
    /// with no padding. Anything else is a mismatch.
    pub fn verify(&self, proof: &PaymentProof) -> bool {
        let is_lower_hex = proof.signature.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        let supplied = match hex::decode(&proof.signature) {
            Ok(bytes) if is_lower_hex => bytes,
            _ => {
                debug!("🔐️ Payment signature for {} is not lowercase hex", proof.gateway_order_id);
                return false;
            },
        };
        match self.mac(&proof.gateway_order_id, &proof.payment_id) {
            Ok(mac) => mac.verify_slice(&supplied).is_ok(),
            Err(e) => {
                error!("🔐️ {e}");
                false
            },
        }
    }
}
