//! Keyed djb2 checksum used by collars to tag telemetry payloads.
//!
//! The checksum deters casual spoofing only; djb2 is not a MAC and must not be
//! treated as a security boundary.
//!
//! # Wire contract
//!
//! - Message: the JSON payload with the top-level `signature` field removed,
//!   serialized compactly with object keys sorted at every depth.
//! - Checksum: djb2 over the message bytes followed by the shared key bytes,
//!   `h = h * 33 + byte (mod 2^32)` starting from 5381.
//! - Encoding: eight lowercase hex digits. A JSON string signature is read
//!   as hex (optional `0x` prefix); a JSON number is read as decimal.

use serde_json::{Map, Value};
use zeroize::Zeroizing;

/// Payload field carrying the device-computed signature.
pub const SIGNATURE_FIELD: &str = "signature";

const DJB2_SEED: u32 = 5381;

/// Compute the djb2 checksum over a byte stream.
///
/// # Examples
/// ```
/// use collar_gateway::domain::signature::djb2;
///
/// assert_eq!(djb2(b"".iter().copied()), 5381);
/// assert_eq!(djb2(b"a".iter().copied()), 177_670);
/// ```
pub fn djb2(bytes: impl IntoIterator<Item = u8>) -> u32 {
    bytes.into_iter().fold(DJB2_SEED, |hash, byte| {
        (hash << 5).wrapping_add(hash).wrapping_add(u32::from(byte))
    })
}

/// Recursively sort object keys for canonical JSON representation.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by_key(|(k, _)| k.as_str());
            let canonical_map: Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), canonicalize(v)))
                .collect();
            Value::Object(canonical_map)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}

/// Canonical message bytes for a payload, excluding the signature field.
pub fn canonical_message(payload: &Value) -> Vec<u8> {
    let stripped = match payload {
        Value::Object(map) => {
            let mut unsigned = map.clone();
            unsigned.remove(SIGNATURE_FIELD);
            Value::Object(unsigned)
        }
        other => other.clone(),
    };
    canonicalize(&stripped).to_string().into_bytes()
}

/// Compute the checksum a collar holding `key` would attach to `payload`.
pub fn compute_signature(payload: &Value, key: &str) -> u32 {
    let message = canonical_message(payload);
    djb2(message.into_iter().chain(key.bytes()))
}

/// Render a checksum in the canonical wire encoding.
///
/// # Examples
/// ```
/// use collar_gateway::domain::signature::encode_signature;
///
/// assert_eq!(encode_signature(5381), "00001505");
/// ```
pub fn encode_signature(checksum: u32) -> String {
    hex::encode(checksum.to_be_bytes())
}

/// Normalise a provided signature into its numeric checksum.
///
/// Returns `None` when the value is neither a hex string of at most eight
/// digits nor a non-negative integer that fits in 32 bits.
pub fn parse_signature(provided: &Value) -> Option<u32> {
    match provided {
        Value::String(raw) => {
            let trimmed = raw.trim();
            let digits = trimmed
                .strip_prefix("0x")
                .or_else(|| trimmed.strip_prefix("0X"))
                .unwrap_or(trimmed);
            if digits.is_empty() || digits.len() > 8 {
                return None;
            }
            let padded = format!("{digits:0>8}");
            let bytes: [u8; 4] = hex::decode(padded).ok()?.try_into().ok()?;
            Some(u32::from_be_bytes(bytes))
        }
        Value::Number(number) => number.as_u64().and_then(|n| u32::try_from(n).ok()),
        _ => None,
    }
}

/// Stateless verification contract.
///
/// With no key verification is disabled and every payload passes. With a key
/// a missing or unparsable signature fails.
pub fn verify(payload: &Value, provided: Option<&Value>, key: Option<&str>) -> bool {
    check(payload, provided, key).is_accepted()
}

fn check(payload: &Value, provided: Option<&Value>, key: Option<&str>) -> SignatureCheck {
    let Some(key) = key else {
        return SignatureCheck::Disabled;
    };
    let Some(provided) = provided.filter(|value| !value.is_null()) else {
        return SignatureCheck::Missing;
    };
    let Some(provided) = parse_signature(provided) else {
        return SignatureCheck::Malformed;
    };
    if compute_signature(payload, key) == provided {
        SignatureCheck::Verified
    } else {
        SignatureCheck::Mismatch
    }
}

/// Outcome of checking one payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureCheck {
    /// The signature matched the computed checksum.
    Verified,
    /// No key is configured; the payload was accepted unchecked.
    Disabled,
    /// A key is configured but the payload carried no signature.
    Missing,
    /// The signature could not be decoded.
    Malformed,
    /// The signature did not match.
    Mismatch,
}

impl SignatureCheck {
    /// Whether the payload may proceed through the pipeline.
    pub fn is_accepted(self) -> bool {
        matches!(self, Self::Verified | Self::Disabled)
    }
}

/// Verifier bound to the gateway's optional shared key.
#[derive(Clone, Default)]
pub struct SignatureVerifier {
    key: Option<Zeroizing<String>>,
}

impl SignatureVerifier {
    /// Build a verifier. Blank keys disable verification.
    pub fn new(key: Option<String>) -> Self {
        let key = key
            .filter(|value| !value.trim().is_empty())
            .map(Zeroizing::new);
        Self { key }
    }

    /// Verifier that accepts every payload.
    pub fn disabled() -> Self {
        Self::default()
    }

    /// Whether a shared key is configured.
    pub fn is_enabled(&self) -> bool {
        self.key.is_some()
    }

    /// Check a raw payload against its embedded `signature` field.
    pub fn verify(&self, payload: &Value) -> SignatureCheck {
        check(
            payload,
            payload.get(SIGNATURE_FIELD),
            self.key.as_ref().map(|key| key.as_str()),
        )
    }
}

impl std::fmt::Debug for SignatureVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureVerifier")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    //! Checksum vectors and tamper detection.

    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    const KEY: &str = "secret";

    #[fixture]
    fn payload() -> Value {
        json!({ "device_id": "collar-01", "battery": { "percent": 80 } })
    }

    fn signed(mut payload: Value, signature: Value) -> Value {
        if let Value::Object(map) = &mut payload {
            map.insert(SIGNATURE_FIELD.to_owned(), signature);
        }
        payload
    }

    #[rstest]
    fn canonical_message_sorts_keys_and_drops_signature(payload: Value) {
        let message = canonical_message(&signed(payload, json!("ffffffff")));
        assert_eq!(
            String::from_utf8(message).expect("utf8"),
            r#"{"battery":{"percent":80},"device_id":"collar-01"}"#
        );
    }

    #[rstest]
    fn checksum_matches_reference_vector(payload: Value) {
        let checksum = compute_signature(&payload, KEY);
        assert_eq!(checksum, 1_922_282_848);
        assert_eq!(encode_signature(checksum), "7293b560");
    }

    #[rstest]
    #[case(json!("7293b560"))]
    #[case(json!("7293B560"))]
    #[case(json!("0x7293b560"))]
    #[case(json!(1_922_282_848_u64))]
    fn accepts_hex_and_decimal_encodings(payload: Value, #[case] signature: Value) {
        let signed_payload = signed(payload, signature);
        let verifier = SignatureVerifier::new(Some(KEY.to_owned()));
        assert_eq!(verifier.verify(&signed_payload), SignatureCheck::Verified);
    }

    #[rstest]
    fn flipping_a_message_byte_fails(payload: Value) {
        let signature = json!(encode_signature(compute_signature(&payload, KEY)));
        let mut tampered = signed(payload, signature);
        tampered["device_id"] = json!("collar-02");
        assert!(!verify(&tampered, tampered.get(SIGNATURE_FIELD), Some(KEY)));
    }

    #[rstest]
    fn flipping_a_key_byte_fails(payload: Value) {
        let signature = json!(encode_signature(compute_signature(&payload, KEY)));
        let signed_payload = signed(payload, signature);
        assert!(verify(&signed_payload, signed_payload.get(SIGNATURE_FIELD), Some(KEY)));
        assert!(!verify(&signed_payload, signed_payload.get(SIGNATURE_FIELD), Some("secreu")));
    }

    #[rstest]
    fn missing_signature_fails_when_key_configured(payload: Value) {
        let verifier = SignatureVerifier::new(Some(KEY.to_owned()));
        assert_eq!(verifier.verify(&payload), SignatureCheck::Missing);
        assert_eq!(
            verifier.verify(&signed(payload, Value::Null)),
            SignatureCheck::Missing
        );
    }

    #[rstest]
    #[case(json!("not-hex"))]
    #[case(json!("123456789"))]
    #[case(json!(-1))]
    #[case(json!(4_294_967_296_u64))]
    #[case(json!(true))]
    fn undecodable_signatures_are_malformed(payload: Value, #[case] signature: Value) {
        let verifier = SignatureVerifier::new(Some(KEY.to_owned()));
        assert_eq!(
            verifier.verify(&signed(payload, signature)),
            SignatureCheck::Malformed
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some(String::new()))]
    #[case(Some("   ".to_owned()))]
    fn disabled_verifier_accepts_everything(payload: Value, #[case] key: Option<String>) {
        let verifier = SignatureVerifier::new(key);
        assert!(!verifier.is_enabled());
        let check = verifier.verify(&signed(payload, json!("garbage")));
        assert_eq!(check, SignatureCheck::Disabled);
        assert!(check.is_accepted());
    }

    #[rstest]
    fn debug_output_never_contains_key() {
        let verifier = SignatureVerifier::new(Some(KEY.to_owned()));
        let rendered = format!("{verifier:?}");
        assert!(!rendered.contains(KEY));
    }
}
