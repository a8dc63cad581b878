//! Share-link codec.
//!
//! A share link carries the whole booking summary in its `data` parameter so
//! a second person can pay without any server-side lookup:
//!
//! ```text
//! https://busflow.example/pay?pay=7QX2M9ZA&data=eyJ2IjoxLCJvIjoibGltYSIs...
//! ```
//!
//! The token is a JSON object with short keys, base64url-encoded without
//! padding. Tokens are versioned through the `v` key; decoders ignore keys
//! they do not know, so later versions may add fields without breaking older
//! readers. Tokens are neither signed nor time-limited.

use crate::catalog;
use crate::state::Booking;
use crate::types::{CityCode, DepartureTime, Money, PaymentId, SERVICE_FEE, ServiceClass};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD_NO_PAD, URL_SAFE_NO_PAD};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Token format written by [`encode`]
pub const TOKEN_VERSION: u32 = 1;

/// What a share link tells the payer
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareSummary {
    /// Origin city
    pub origin: CityCode,
    /// Destination city
    pub destination: CityCode,
    /// Travel date
    pub date: NaiveDate,
    /// Service class of the departure
    pub service_class: ServiceClass,
    /// Departure time
    pub time: DepartureTime,
    /// Amount to pay, service fee included
    pub total: Money,
    /// Name of the first passenger
    pub primary_passenger_name: String,
}

impl ShareSummary {
    /// Snapshot of a booking that has reached the payment step
    ///
    /// `None` until the booking has criteria, a departure and at least one
    /// passenger.
    #[must_use]
    pub fn from_booking(booking: &Booking) -> Option<Self> {
        let criteria = booking.criteria()?;
        let departure = booking.departure()?;
        let primary = booking.passengers().first()?;

        Some(Self {
            origin: criteria.origin.clone(),
            destination: criteria.destination.clone(),
            date: criteria.date,
            service_class: departure.service_class,
            time: departure.time,
            total: booking.grand_total(),
            primary_passenger_name: primary.display_name(),
        })
    }

    /// Fare without the service fee
    ///
    /// Decoded summaries always carry at least the fee.
    #[must_use]
    pub fn fare(&self) -> Money {
        self.total.checked_sub(SERVICE_FEE).unwrap_or(Money::ZERO)
    }
}

/// Encoded summary, safe to place in a URL
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ShareToken(String);

impl ShareToken {
    /// The token text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShareToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Why a token could not be read
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum DecodeError {
    /// Bad base64, bad JSON, missing fields or impossible values
    #[error("Malformed share token: {reason}")]
    Malformed {
        /// What was wrong
        reason: String,
    },

    /// Written by a newer version of the format
    #[error("Unsupported share token version {version}")]
    UnsupportedVersion {
        /// Version found in the token
        version: u64,
    },
}

impl DecodeError {
    fn malformed(reason: impl fmt::Display) -> Self {
        Self::Malformed {
            reason: reason.to_string(),
        }
    }
}

const fn current_version() -> u32 {
    TOKEN_VERSION
}

#[derive(Serialize, Deserialize)]
struct WireSummary {
    #[serde(default = "current_version")]
    v: u32,
    o: CityCode,
    d: CityCode,
    f: NaiveDate,
    s: ServiceClass,
    t: DepartureTime,
    p: Money,
    n: String,
}

/// Encodes a summary into a URL-safe token
///
/// # Errors
///
/// Returns [`DecodeError::Malformed`] for summaries [`decode`] would refuse,
/// i.e. a total below the service fee.
pub fn encode(summary: &ShareSummary) -> Result<ShareToken, DecodeError> {
    check_total(summary.total)?;

    let wire = WireSummary {
        v: TOKEN_VERSION,
        o: summary.origin.clone(),
        d: summary.destination.clone(),
        f: summary.date,
        s: summary.service_class,
        t: summary.time,
        p: summary.total,
        n: summary.primary_passenger_name.clone(),
    };
    let json = serde_json::to_vec(&wire).map_err(DecodeError::malformed)?;
    Ok(ShareToken(URL_SAFE_NO_PAD.encode(json)))
}

/// Decodes a token produced by [`encode`]
///
/// Accepts the URL-safe and the standard base64 alphabet, with or without
/// padding. City codes are not checked against the catalog.
///
/// # Errors
///
/// - [`DecodeError::UnsupportedVersion`]: `v` is newer than [`TOKEN_VERSION`]
/// - [`DecodeError::Malformed`]: anything else that is not a valid summary,
///   including a total below the service fee
pub fn decode(token: &str) -> Result<ShareSummary, DecodeError> {
    let trimmed = token.trim().trim_end_matches('=');
    let bytes = URL_SAFE_NO_PAD
        .decode(trimmed)
        .or_else(|_| STANDARD_NO_PAD.decode(trimmed))
        .map_err(|e| DecodeError::malformed(format!("invalid base64: {e}")))?;

    let value: serde_json::Value = serde_json::from_slice(&bytes)
        .map_err(|e| DecodeError::malformed(format!("invalid JSON: {e}")))?;

    if !value.is_object() {
        return Err(DecodeError::malformed("payload is not an object"));
    }

    match value.get("v") {
        None => {},
        Some(v) => match v.as_u64() {
            Some(version) if version > u64::from(TOKEN_VERSION) => {
                return Err(DecodeError::UnsupportedVersion { version });
            },
            Some(version) if version >= 1 => {},
            _ => return Err(DecodeError::malformed(format!("invalid version {v}"))),
        },
    }

    let wire: WireSummary = serde_json::from_value(value).map_err(DecodeError::malformed)?;
    check_total(wire.p)?;

    Ok(ShareSummary {
        origin: wire.o,
        destination: wire.d,
        date: wire.f,
        service_class: wire.s,
        time: wire.t,
        total: wire.p,
        primary_passenger_name: wire.n,
    })
}

fn check_total(total: Money) -> Result<(), DecodeError> {
    if total < SERVICE_FEE {
        return Err(DecodeError::malformed(format!(
            "total {total} is below the service fee"
        )));
    }
    Ok(())
}

/// Query parameters of a share link
///
/// Serialized as `pay=<payment id>&data=<token>`; other parameters are
/// ignored when reading.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkParams {
    /// Opaque payment id; informational only
    #[serde(rename = "pay")]
    pub payment_id: String,
    /// Encoded summary
    pub data: String,
}

impl LinkParams {
    /// Reads `pay` and `data` from a query string or a full URL
    ///
    /// Returns `None` unless both are present and the query decodes.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        let query = input.split_once('?').map_or(input, |(_, q)| q);
        let query = query.split_once('#').map_or(query, |(q, _)| q);

        match serde_urlencoded::from_str(query) {
            Ok(params) => Some(params),
            Err(e) => {
                tracing::debug!(error = %e, "Link has no share parameters");
                None
            },
        }
    }

    /// Percent-encoded query string
    ///
    /// # Errors
    ///
    /// Returns [`DecodeError::Malformed`] if the parameters cannot be encoded.
    pub fn to_query(&self) -> Result<String, DecodeError> {
        serde_urlencoded::to_string(self)
            .map_err(|e| DecodeError::malformed(format!("cannot build query: {e}")))
    }
}

/// A ready-to-send share link
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ShareLink {
    /// Payment id in the link
    pub payment_id: PaymentId,
    /// Full URL
    pub url: String,
    /// Message inviting someone to pay
    pub text: String,
}

impl ShareLink {
    /// Builds the link and its message
    ///
    /// # Errors
    ///
    /// Propagates [`encode`] and [`LinkParams::to_query`] failures.
    pub fn build(
        base_url: &str,
        payment_id: PaymentId,
        summary: &ShareSummary,
    ) -> Result<Self, DecodeError> {
        let params = LinkParams {
            payment_id: payment_id.as_str().to_owned(),
            data: encode(summary)?.to_string(),
        };
        let separator = if base_url.contains('?') { '&' } else { '?' };
        let url = format!("{base_url}{separator}{}", params.to_query()?);
        let text = share_text(summary, &url);

        Ok(Self {
            payment_id,
            url,
            text,
        })
    }
}

/// Message sent along with a share link
#[must_use]
pub fn share_text(summary: &ShareSummary, url: &str) -> String {
    format!(
        "Can you help me pay for my bus ticket?\n\
         {origin} → {destination}\n\
         Date: {date}\n\
         Service: {class} at {time}\n\
         Total: {total}\n\
         Pay here: {url}",
        origin = catalog::display_name(&summary.origin),
        destination = catalog::display_name(&summary.destination),
        date = summary.date.format("%d/%m/%Y"),
        class = summary.service_class,
        time = summary.time,
        total = summary.total,
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;

    fn summary() -> ShareSummary {
        ShareSummary {
            origin: CityCode::new("lima"),
            destination: CityCode::new("cusco"),
            date: NaiveDate::from_ymd_opt(2025, 3, 15).unwrap(),
            service_class: ServiceClass::Vip,
            time: DepartureTime::from_hm(8, 0).unwrap(),
            total: Money::new(125),
            primary_passenger_name: "Ana Quispe".to_string(),
        }
    }

    fn token_from(json: &str) -> String {
        URL_SAFE_NO_PAD.encode(json)
    }

    #[test]
    fn round_trip_keeps_every_field() {
        let original = summary();
        let token = encode(&original).unwrap();

        assert!(!token.as_str().contains(&['+', '/', '='][..]));
        assert_eq!(decode(token.as_str()).unwrap(), original);
        assert_eq!(original.fare(), Money::new(120));
    }

    #[test]
    fn standard_alphabet_and_padding_are_accepted() {
        let json = serde_json::to_vec(&serde_json::json!({
            "v": 1, "o": "lima", "d": "ica", "f": "2025-03-15",
            "s": "Economy", "t": "06:00", "p": 50, "n": "Luis ?>>"
        }))
        .unwrap();
        let decoded = decode(&STANDARD.encode(&json)).unwrap();
        assert_eq!(decoded.primary_passenger_name, "Luis ?>>");
    }

    #[test]
    fn missing_version_means_v1_and_unknown_keys_are_ignored() {
        let token = token_from(
            r#"{"o":"cusco","d":"puno","f":"2025-06-01","s":"SleeperBus","t":"22:00","p":104,"n":"Rosa","seat":12}"#,
        );
        let decoded = decode(&token).unwrap();
        assert_eq!(decoded.destination.as_str(), "puno");
        assert_eq!(decoded.total, Money::new(104));
    }

    #[test]
    fn newer_versions_are_rejected() {
        let token = token_from(r#"{"v":2,"o":"lima"}"#);
        assert_eq!(decode(&token), Err(DecodeError::UnsupportedVersion { version: 2 }));
    }

    #[test]
    fn malformed_tokens_are_rejected() {
        let cases = [
            "%%%not-base64%%%".to_string(),
            token_from("not json"),
            token_from("[1,2,3]"),
            token_from(r#"{"v":1,"o":"lima"}"#),
            token_from(r#"{"v":0,"o":"lima","d":"ica","f":"2025-03-15","s":"VIP","t":"06:00","p":50,"n":"A"}"#),
            token_from(r#"{"v":1,"o":"lima","d":"ica","f":"2025-03-15","s":"VIP","t":"6am","p":50,"n":"A"}"#),
        ];
        for token in &cases {
            assert!(
                matches!(decode(token), Err(DecodeError::Malformed { .. })),
                "expected malformed for {token}"
            );
        }
    }

    #[test]
    fn total_below_service_fee_is_malformed() {
        let token = token_from(
            r#"{"v":1,"o":"lima","d":"ica","f":"2025-03-15","s":"Economy","t":"06:00","p":4,"n":"A"}"#,
        );
        assert!(matches!(decode(&token), Err(DecodeError::Malformed { .. })));
    }

    #[test]
    fn summary_below_service_fee_is_not_encoded() {
        let short = ShareSummary {
            total: Money::new(3),
            ..summary()
        };
        assert!(matches!(encode(&short), Err(DecodeError::Malformed { .. })));
        assert!(ShareLink::build("https://busflow.example/pay", PaymentId::new("P"), &short).is_err());

        let fee_only = ShareSummary {
            total: SERVICE_FEE,
            ..summary()
        };
        let token = encode(&fee_only).unwrap();
        assert_eq!(decode(token.as_str()).unwrap().fare(), Money::ZERO);
    }

    #[test]
    fn link_params_from_url_or_query() {
        let params = LinkParams::parse("https://busflow.example/pay?pay=AB12&data=eyJ2Ijox#top").unwrap();
        assert_eq!(params.payment_id, "AB12");
        assert_eq!(params.data, "eyJ2Ijox");

        let params = LinkParams::parse("data=a%2Bb%3D&pay=X%20Y").unwrap();
        assert_eq!(params.payment_id, "X Y");
        assert_eq!(params.data, "a+b=");

        let params = LinkParams::parse("lang=es&data=abc&pay=P1").unwrap();
        assert_eq!(params.payment_id, "P1");
        assert_eq!(params.data, "abc");

        assert!(LinkParams::parse("?pay=only").is_none());
        assert!(LinkParams::parse("").is_none());
        assert!(LinkParams::parse("https://busflow.example/pay").is_none());
    }

    #[test]
    fn payment_ids_are_percent_encoded_in_the_query() {
        let params = LinkParams {
            payment_id: "A B&C".to_string(),
            data: "eyJ2Ijox".to_string(),
        };
        let query = params.to_query().unwrap();
        assert_eq!(query, "pay=A+B%26C&data=eyJ2Ijox");
        assert_eq!(LinkParams::parse(&query).unwrap(), params);
    }

    #[test]
    fn share_link_round_trips_through_its_url() {
        let link = ShareLink::build("https://busflow.example/pay", PaymentId::new("7QX2M9ZA"), &summary())
            .unwrap();

        assert!(link.url.starts_with("https://busflow.example/pay?pay=7QX2M9ZA&data="));
        assert!(link.text.contains("Lima → Cusco"));
        assert!(link.text.contains("15/03/2025"));
        assert!(link.text.contains("VIP at 08:00"));
        assert!(link.text.contains("S/ 125"));
        assert!(link.text.ends_with(&link.url));

        let params = LinkParams::parse(&link.url).unwrap();
        assert_eq!(params.payment_id, "7QX2M9ZA");
        assert_eq!(decode(&params.data).unwrap(), summary());
    }

    #[test]
    fn base_url_with_query_gets_ampersand() {
        let link = ShareLink::build("https://x.example/?lang=es", PaymentId::new("P"), &summary()).unwrap();
        assert!(link.url.starts_with("https://x.example/?lang=es&pay=P&data="));
    }
}
