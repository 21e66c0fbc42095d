//! Stripe webhook signature verification.
//!
//! Deliveries are authenticated with Stripe's `v1` signing scheme: an
//! HMAC-SHA256 tag over `"{timestamp}.{raw body}"`, carried in the
//! `Stripe-Signature` header alongside the timestamp it was computed for.
//! Verification runs over the exact bytes received, before any JSON
//! parsing, and stale timestamps are rejected to bound replay.

use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::stripe_event::StripeEvent;
use super::webhook_errors::WebhookError;

type HmacSha256 = Hmac<Sha256>;

/// Deliveries older than this are refused as potential replays.
const MAX_EVENT_AGE_SECS: i64 = 300;

/// How far ahead of our clock a timestamp may sit before it is refused.
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Parsed form of the `Stripe-Signature` header.
///
/// While an endpoint secret is being rotated, Stripe signs each delivery
/// with every active secret, so a single header can carry several `v1`
/// entries. The delivery authenticates if any of them matches. Schemes
/// other than `v1` (the legacy `v0`, anything newer) are skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Unix timestamp the signatures were computed over.
    pub timestamp: i64,

    /// Decoded `v1` signatures, in header order.
    pub v1_signatures: Vec<Vec<u8>>,
}

impl SignatureHeader {
    /// Parses a header of the form `t=<unix>,v1=<hex>[,v1=<hex>,...]`.
    pub fn parse(header: &str) -> Result<Self, WebhookError> {
        let mut timestamp = None;
        let mut v1_signatures = Vec::new();

        for entry in header.split(',') {
            let Some((scheme, value)) = entry.split_once('=') else {
                return Err(WebhookError::MalformedHeader(format!(
                    "expected scheme=value, got {:?}",
                    entry
                )));
            };
            match scheme {
                "t" => {
                    let parsed = value.parse().map_err(|_| {
                        WebhookError::MalformedHeader(format!(
                            "timestamp is not an integer: {:?}",
                            value
                        ))
                    })?;
                    timestamp = Some(parsed);
                }
                "v1" => {
                    let decoded = hex::decode(value).map_err(|_| {
                        WebhookError::MalformedHeader("v1 signature is not valid hex".to_string())
                    })?;
                    v1_signatures.push(decoded);
                }
                // Unrecognized schemes carry signatures we cannot verify
                _ => {}
            }
        }

        let Some(timestamp) = timestamp else {
            return Err(WebhookError::MalformedHeader(
                "missing t entry".to_string(),
            ));
        };
        if v1_signatures.is_empty() {
            return Err(WebhookError::MalformedHeader(
                "no v1 signature present".to_string(),
            ));
        }

        Ok(Self {
            timestamp,
            v1_signatures,
        })
    }

    /// Returns true if any carried signature equals `expected`.
    ///
    /// Each candidate is compared in constant time; which candidate
    /// matched is not secret, only the signature bytes are.
    fn matches(&self, expected: &[u8]) -> bool {
        self.v1_signatures
            .iter()
            .any(|candidate| bool::from(candidate.as_slice().ct_eq(expected)))
    }
}

/// Authenticates webhook deliveries against the endpoint signing secret.
#[derive(Clone)]
pub struct StripeWebhookVerifier {
    secret: SecretString,
}

impl StripeWebhookVerifier {
    /// Creates a verifier bound to the endpoint's `whsec_...` secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::new(secret.into()),
        }
    }

    /// Verifies `payload` against `signature_header` and parses the event.
    ///
    /// The signature covers the raw bytes as received, so callers must
    /// pass the body unmodified. Parsing runs only after authentication;
    /// a forged delivery never reaches the JSON layer.
    pub fn verify_and_parse(
        &self,
        payload: &[u8],
        signature_header: &str,
    ) -> Result<StripeEvent, WebhookError> {
        // 1. Parse the header into a timestamp and signature candidates
        let header = SignatureHeader::parse(signature_header)?;

        // 2. Bound replay before doing any crypto
        check_freshness(header.timestamp, Utc::now().timestamp())?;

        // 3. Compare the expected tag against every candidate
        let expected = self.sign(header.timestamp, payload);
        if !header.matches(&expected) {
            return Err(WebhookError::InvalidSignature);
        }

        // 4. Parse only after authentication
        serde_json::from_slice(payload)
            .map_err(|err| WebhookError::MalformedPayload(err.to_string()))
    }

    /// Computes the expected tag for `timestamp` over `payload`.
    ///
    /// The MAC is fed the raw body bytes, so payloads that are not valid
    /// UTF-8 still sign exactly as Stripe computed them.
    fn sign(&self, timestamp: i64, payload: &[u8]) -> Vec<u8> {
        let mut mac = HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(payload);
        mac.finalize().into_bytes().to_vec()
    }
}

/// Rejects timestamps outside the acceptance window.
///
/// Old deliveries are treated as replays. Timestamps ahead of `now` are
/// tolerated up to the skew allowance and refused beyond it.
fn check_freshness(timestamp: i64, now: i64) -> Result<(), WebhookError> {
    let age = now - timestamp;
    if age > MAX_EVENT_AGE_SECS {
        return Err(WebhookError::TimestampOutOfRange);
    }
    if age < -MAX_CLOCK_SKEW_SECS {
        return Err(WebhookError::InvalidTimestamp);
    }
    Ok(())
}

/// Signs `payload` the way Stripe would, for building test fixtures.
#[cfg(test)]
pub fn compute_test_signature(secret: &str, timestamp: i64, payload: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}
