use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ApiError;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the shared secret for the database-trigger webhooks
pub const SECRET_HEADER: &str = "x-webhook-secret";

/// Header carrying the signed billing payload: `t=<unix>,v1=<hex>`
pub const SIGNATURE_HEADER: &str = "stripe-signature";

/// Plain shared-secret check for the trigger webhooks. An unconfigured
/// secret rejects everything rather than letting the endpoint run open.
pub fn verify_shared_secret(headers: &HeaderMap, expected: &str) -> Result<(), ApiError> {
    if expected.is_empty() {
        return Err(ApiError::unauthorized("Webhook secret not configured"));
    }

    let presented = headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::unauthorized("Missing webhook secret header"))?;

    if !constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
        return Err(ApiError::unauthorized("Invalid webhook secret"));
    }
    Ok(())
}

/// Verify a billing event signature: HMAC-SHA256 over `"<timestamp>.<body>"`
/// with the signing secret, plus a freshness window on the timestamp.
pub fn verify_billing_signature(
    secret: &str,
    header_value: &str,
    body: &[u8],
    now_unix: i64,
    tolerance_secs: i64,
) -> Result<(), ApiError> {
    if secret.is_empty() {
        return Err(ApiError::unauthorized("Billing webhook not configured"));
    }

    let (timestamp, presented_hex) = parse_signature_header(header_value)
        .ok_or_else(|| ApiError::unauthorized("Malformed signature header"))?;

    if (now_unix - timestamp).abs() > tolerance_secs {
        return Err(ApiError::unauthorized("Signature timestamp outside tolerance"));
    }

    let expected_hex = signature_hex(secret, timestamp, body);
    if !constant_time_eq(expected_hex.as_bytes(), presented_hex.to_lowercase().as_bytes()) {
        return Err(ApiError::unauthorized("Invalid billing signature"));
    }
    Ok(())
}

/// Hex HMAC for a timestamped payload. Also used by tests to build valid
/// headers.
pub fn signature_hex(secret: &str, timestamp: i64, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    mac.finalize()
        .into_bytes()
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn parse_signature_header(value: &str) -> Option<(i64, String)> {
    let mut timestamp = None;
    let mut v1 = None;

    for part in value.split(',') {
        let (key, val) = part.trim().split_once('=')?;
        match key {
            "t" => timestamp = val.parse::<i64>().ok(),
            "v1" => v1 = Some(val.to_string()),
            _ => {}
        }
    }
    Some((timestamp?, v1?))
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test_4242";
    const BODY: &[u8] = br#"{"type":"customer.subscription.updated"}"#;

    fn header_for(timestamp: i64) -> String {
        format!("t={},v1={}", timestamp, signature_hex(SECRET, timestamp, BODY))
    }

    #[test]
    fn valid_signature_is_accepted() {
        let now = 1_700_000_000;
        let header = header_for(now);
        assert!(verify_billing_signature(SECRET, &header, BODY, now, 300).is_ok());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let now = 1_700_000_000;
        let header = format!("t={},v1={}", now, signature_hex("other-secret", now, BODY));
        assert!(verify_billing_signature(SECRET, &header, BODY, now, 300).is_err());
    }

    #[test]
    fn tampered_body_is_rejected() {
        let now = 1_700_000_000;
        let header = header_for(now);
        assert!(verify_billing_signature(SECRET, &header, b"{}", now, 300).is_err());
    }

    #[test]
    fn stale_timestamp_is_rejected() {
        let now = 1_700_000_000;
        let header = header_for(now - 301);
        assert!(verify_billing_signature(SECRET, &header, BODY, now, 300).is_err());
        // Within tolerance still passes
        let header = header_for(now - 299);
        assert!(verify_billing_signature(SECRET, &header, BODY, now, 300).is_ok());
    }

    #[test]
    fn malformed_headers_are_rejected() {
        let now = 1_700_000_000;
        for header in ["", "t=abc,v1=00", "v1=00", "t=123"] {
            assert!(verify_billing_signature(SECRET, header, BODY, now, 300).is_err());
        }
    }

    #[test]
    fn unconfigured_secret_rejects() {
        let now = 1_700_000_000;
        let header = header_for(now);
        assert!(verify_billing_signature("", &header, BODY, now, 300).is_err());

        let headers = HeaderMap::new();
        assert!(verify_shared_secret(&headers, "").is_err());
    }

    #[test]
    fn shared_secret_header_compare() {
        let mut headers = HeaderMap::new();
        headers.insert(SECRET_HEADER, "sekrit".parse().unwrap());
        assert!(verify_shared_secret(&headers, "sekrit").is_ok());
        assert!(verify_shared_secret(&headers, "other").is_err());

        let empty = HeaderMap::new();
        assert!(verify_shared_secret(&empty, "sekrit").is_err());
    }
}
