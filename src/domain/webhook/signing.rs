//! HMAC-SHA256 webhook signatures.
//!
//! The signed message is `<timestamp>.<raw body>` where the timestamp is the
//! exact `X-Webhook-Timestamp` header value (unix milliseconds). Signatures
//! travel hex-encoded in `X-Webhook-Signature`.

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use thiserror::Error;

pub const SIGNATURE_HEADER: &str = "X-Webhook-Signature";
pub const TIMESTAMP_HEADER: &str = "X-Webhook-Timestamp";
pub const EVENT_HEADER: &str = "X-Webhook-Event";

/// Allowed clock skew for timestamps from the future (1 minute).
const MAX_CLOCK_SKEW_MS: i64 = 60_000;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("missing header {0}")]
    MissingHeader(&'static str),

    #[error("timestamp header is not a unix millisecond value")]
    MalformedTimestamp,

    #[error("signature mismatch")]
    InvalidSignature,

    #[error("timestamp outside the accepted window")]
    TimestampOutOfRange,
}

/// Signs and verifies webhook bodies with one shared secret.
#[derive(Clone)]
pub struct WebhookSigner {
    secret: Secret<String>,
}

impl WebhookSigner {
    pub fn new(secret: Secret<String>) -> Self {
        Self { secret }
    }

    /// Hex-encoded signature over `timestamp "." body`.
    pub fn sign(&self, timestamp: &str, body: &[u8]) -> String {
        hex::encode(self.mac(timestamp, body))
    }

    /// Checks `signature_hex` against the body in constant time.
    pub fn verify(
        &self,
        timestamp: &str,
        body: &[u8],
        signature_hex: &str,
    ) -> Result<(), SignatureError> {
        let provided =
            hex::decode(signature_hex.trim()).map_err(|_| SignatureError::InvalidSignature)?;
        let expected = self.mac(timestamp, body);
        if constant_time_compare(&expected, &provided) {
            Ok(())
        } else {
            Err(SignatureError::InvalidSignature)
        }
    }

    /// Like [`verify`](Self::verify), additionally rejecting timestamps older
    /// than `max_age_ms` or more than a minute in the future.
    pub fn verify_fresh(
        &self,
        timestamp: &str,
        body: &[u8],
        signature_hex: &str,
        now_ms: i64,
        max_age_ms: i64,
    ) -> Result<(), SignatureError> {
        let ts: i64 = timestamp
            .trim()
            .parse()
            .map_err(|_| SignatureError::MalformedTimestamp)?;
        self.verify(timestamp, body, signature_hex)?;

        let age = now_ms.saturating_sub(ts);
        if age > max_age_ms || age < -MAX_CLOCK_SKEW_MS {
            return Err(SignatureError::TimestampOutOfRange);
        }
        Ok(())
    }

    fn mac(&self, timestamp: &str, body: &[u8]) -> Vec<u8> {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.expose_secret().as_bytes())
            .expect("HMAC accepts any key");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(body);
        mac.finalize().into_bytes().to_vec()
    }
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TEST_SECRET: &str = "whsec_forum_test";

    fn signer() -> WebhookSigner {
        WebhookSigner::new(Secret::new(TEST_SECRET.to_string()))
    }

    // ══════════════════════════════════════════════════════════════
    // Signing
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn signature_is_64_hex_chars() {
        let sig = signer().sign("1700000000000", b"{}");
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_matches_manual_hmac() {
        let mut mac = Hmac::<Sha256>::new_from_slice(TEST_SECRET.as_bytes()).unwrap();
        mac.update(b"1700000000000.{\"a\":1}");
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(signer().sign("1700000000000", b"{\"a\":1}"), expected);
    }

    #[test]
    fn different_secrets_produce_different_signatures() {
        let other = WebhookSigner::new(Secret::new("other".to_string()));
        assert_ne!(signer().sign("1", b"x"), other.sign("1", b"x"));
    }

    // ══════════════════════════════════════════════════════════════
    // Verification
    // ══════════════════════════════════════════════════════════════

    #[test]
    fn verify_rejects_non_hex_signature() {
        assert_eq!(
            signer().verify("1", b"x", "zz-not-hex"),
            Err(SignatureError::InvalidSignature)
        );
    }

    #[test]
    fn verify_fresh_rejects_stale_timestamp() {
        let now = 1_700_000_600_000_i64;
        let ts = (now - 301_000).to_string();
        let sig = signer().sign(&ts, b"{}");
        assert_eq!(
            signer().verify_fresh(&ts, b"{}", &sig, now, 300_000),
            Err(SignatureError::TimestampOutOfRange)
        );
    }

    #[test]
    fn verify_fresh_rejects_far_future_timestamp() {
        let now = 1_700_000_000_000_i64;
        let ts = (now + 120_000).to_string();
        let sig = signer().sign(&ts, b"{}");
        assert_eq!(
            signer().verify_fresh(&ts, b"{}", &sig, now, 300_000),
            Err(SignatureError::TimestampOutOfRange)
        );
    }

    #[test]
    fn verify_fresh_accepts_recent_timestamp() {
        let now = 1_700_000_000_000_i64;
        let ts = (now - 5_000).to_string();
        let sig = signer().sign(&ts, b"{}");
        assert!(signer().verify_fresh(&ts, b"{}", &sig, now, 300_000).is_ok());
    }

    #[test]
    fn verify_fresh_rejects_extreme_timestamps() {
        let now = 1_700_000_000_000_i64;
        for ts in [i64::MIN, i64::MAX] {
            let ts = ts.to_string();
            let sig = signer().sign(&ts, b"{}");
            assert_eq!(
                signer().verify_fresh(&ts, b"{}", &sig, now, 300_000),
                Err(SignatureError::TimestampOutOfRange)
            );
        }
    }

    #[test]
    fn verify_fresh_rejects_non_numeric_timestamp() {
        assert_eq!(
            signer().verify_fresh("yesterday", b"{}", "00", 0, 300_000),
            Err(SignatureError::MalformedTimestamp)
        );
    }

    proptest! {
        #[test]
        fn signed_payload_verifies(ts in 0i64..4_000_000_000_000, body in proptest::collection::vec(any::<u8>(), 0..256)) {
            let ts = ts.to_string();
            let sig = signer().sign(&ts, &body);
            prop_assert!(signer().verify(&ts, &body, &sig).is_ok());
        }

        #[test]
        fn altered_body_fails(ts in 0i64..4_000_000_000_000, body in proptest::collection::vec(any::<u8>(), 1..256), idx in any::<usize>()) {
            let ts = ts.to_string();
            let sig = signer().sign(&ts, &body);
            let mut tampered = body.clone();
            let i = idx % tampered.len();
            tampered[i] ^= 0x01;
            prop_assert_eq!(signer().verify(&ts, &tampered, &sig), Err(SignatureError::InvalidSignature));
        }

        #[test]
        fn altered_timestamp_fails(ts in 0i64..4_000_000_000_000, delta in 1i64..1_000_000) {
            let sig = signer().sign(&ts.to_string(), b"{\"event\":\"x\"}");
            let moved = (ts + delta).to_string();
            prop_assert_eq!(signer().verify(&moved, b"{\"event\":\"x\"}", &sig), Err(SignatureError::InvalidSignature));
        }

        #[test]
        fn altered_signature_fails(ts in 0i64..4_000_000_000_000, idx in 0usize..64) {
            let ts = ts.to_string();
            let sig = signer().sign(&ts, b"body");
            let mut chars: Vec<char> = sig.chars().collect();
            chars[idx] = if chars[idx] == '0' { '1' } else { '0' };
            let tampered: String = chars.into_iter().collect();
            prop_assert_eq!(signer().verify(&ts, b"body", &tampered), Err(SignatureError::InvalidSignature));
        }
    }
}
