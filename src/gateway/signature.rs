//! Stripe-style webhook signatures.
//!
//! Header format: `t=<unix seconds>,v1=<hex hmac>[,v1=<hex hmac>...]`, where
//! each `v1` is HMAC-SHA256 over `"<t>.<raw body>"` keyed with the endpoint
//! signing secret.

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

use crate::errors::VerificationError;
use crate::models::{PaymentEvent, PaymentEventType, ReservationMetadata};

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";

struct ParsedHeader<'a> {
    timestamp: i64,
    signatures: Vec<&'a str>,
}

fn parse_header(header: &str) -> Result<ParsedHeader<'_>, VerificationError> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let Some((key, value)) = part.trim().split_once('=') else {
            continue;
        };
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => signatures.push(value),
            _ => {}
        }
    }

    match timestamp {
        Some(timestamp) if !signatures.is_empty() => Ok(ParsedHeader {
            timestamp,
            signatures,
        }),
        _ => Err(VerificationError::MalformedHeader),
    }
}

fn keyed_mac(secret: &str, timestamp: i64, payload: &[u8]) -> Result<HmacSha256, VerificationError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|_| VerificationError::MissingSecret)?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    Ok(mac)
}

/// Builds a header value for `payload` signed at `timestamp`.
pub fn signature_header(
    secret: &str,
    timestamp: i64,
    payload: &[u8],
) -> Result<String, VerificationError> {
    let digest = keyed_mac(secret, timestamp, payload)?.finalize().into_bytes();
    Ok(format!("t={timestamp},v1={}", hex::encode(digest)))
}

/// Verifies `header` for `payload` as of `now` (unix seconds).
pub fn verify_at(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    tolerance_secs: u64,
    now: i64,
) -> Result<(), VerificationError> {
    let header = header.ok_or(VerificationError::MissingHeader)?;
    let parsed = parse_header(header)?;
    let mac = keyed_mac(secret, parsed.timestamp, payload)?;

    let matched = parsed.signatures.iter().any(|candidate| {
        hex::decode(candidate)
            .map(|expected| mac.clone().verify_slice(&expected).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err(VerificationError::SignatureMismatch);
    }

    if now.abs_diff(parsed.timestamp) > tolerance_secs {
        return Err(VerificationError::TimestampOutsideTolerance);
    }
    Ok(())
}

#[derive(Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    data: Option<RawEventData>,
}

#[derive(Deserialize)]
struct RawEventData {
    object: RawEventObject,
}

#[derive(Deserialize)]
struct RawEventObject {
    id: Option<String>,
    metadata: Option<ReservationMetadata>,
}

/// Decodes an already-authenticated event body.
pub fn decode_event(payload: &[u8]) -> Result<PaymentEvent, VerificationError> {
    let raw: RawEvent = serde_json::from_slice(payload)
        .map_err(|e| VerificationError::MalformedEvent(e.to_string()))?;
    let object = raw.data.map(|data| data.object);

    Ok(PaymentEvent {
        id: raw.id,
        event_type: PaymentEventType::parse(&raw.event_type),
        session_id: object.as_ref().and_then(|object| object.id.clone()),
        metadata: object
            .and_then(|object| object.metadata)
            .unwrap_or_default(),
    })
}

/// Verifies against the current clock, then decodes.
pub fn verify_event(
    payload: &[u8],
    header: Option<&str>,
    secret: &str,
    tolerance_secs: u64,
) -> Result<PaymentEvent, VerificationError> {
    verify_at(
        payload,
        header,
        secret,
        tolerance_secs,
        chrono::Utc::now().timestamp(),
    )?;
    decode_event(payload)
}
