//! Domain types for the bus booking flow.
//!
//! Value objects shared by the catalog, the availability generator, the
//! booking reducer and the share-link codec.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Most passengers a single booking may carry
pub const MAX_PASSENGERS: u8 = 6;

/// Fixed fee added to the fare at payment
pub const SERVICE_FEE: Money = Money::new(5);

// ============================================================================
// Identifiers
// ============================================================================

/// Catalog key of a city (`"lima"`, `"arequipa"`, ...)
///
/// Codes decoded from a share link may not exist in the catalog; they are
/// still valid values and are displayed verbatim.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityCode(String);

impl CityCode {
    /// Creates a city code
    #[must_use]
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// The raw code
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CityCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a departure within one search result
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DepartureId(String);

impl DepartureId {
    /// Creates a departure id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id given to the departure reconstructed from a share link
    #[must_use]
    pub fn shared() -> Self {
        Self::new("shared")
    }

    /// The raw id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DepartureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque id printed in a share link; informational only
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(String);

impl PaymentId {
    /// Creates a payment id
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw id
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Money
// ============================================================================

/// Amount in whole currency units
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u32);

impl Money {
    /// Zero
    pub const ZERO: Self = Self(0);

    /// Creates an amount
    #[must_use]
    pub const fn new(amount: u32) -> Self {
        Self(amount)
    }

    /// The amount in units
    #[must_use]
    pub const fn amount(self) -> u32 {
        self.0
    }

    /// `self × count`, saturating at `u32::MAX`
    #[must_use]
    pub const fn times(self, count: u32) -> Self {
        Self(self.0.saturating_mul(count))
    }

    /// Sum, saturating at `u32::MAX`
    #[must_use]
    pub const fn plus(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Difference, or `None` when `other` is larger
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S/ {}", self.0)
    }
}

// ============================================================================
// Seats
// ============================================================================

/// Seat number: 1-20 lower deck, 21-40 upper deck
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatNumber(u8);

impl SeatNumber {
    /// Placeholder seat of a booking resumed from a share link; the real seat
    /// is only known to the person who created the link.
    pub const UNASSIGNED: Self = Self(0);

    /// Creates a seat number
    #[must_use]
    pub const fn new(number: u8) -> Self {
        Self(number)
    }

    /// The raw number
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }

    /// False for [`SeatNumber::UNASSIGNED`]
    #[must_use]
    pub const fn is_assigned(self) -> bool {
        self.0 != 0
    }
}

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_assigned() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("unassigned")
        }
    }
}

// ============================================================================
// Departures
// ============================================================================

/// Service class of a departure
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ServiceClass {
    /// Base fare
    Economy,
    /// 1.4 × base fare
    #[serde(rename = "VIP")]
    Vip,
    /// 1.8 × base fare
    SleeperBus,
}

impl ServiceClass {
    /// Classes in the order departures cycle through them
    pub const ALL: [Self; 3] = [Self::Economy, Self::Vip, Self::SleeperBus];

    /// Fare multiplier in tenths (10 = ×1.0)
    #[must_use]
    pub const fn multiplier_tenths(self) -> u32 {
        match self {
            Self::Economy => 10,
            Self::Vip => 14,
            Self::SleeperBus => 18,
        }
    }

    /// On-board amenities
    #[must_use]
    pub const fn amenities(self) -> &'static [&'static str] {
        match self {
            Self::Economy => &["WiFi", "Restroom"],
            Self::Vip => &["WiFi", "Restroom", "Power outlet", "Blanket"],
            Self::SleeperBus => &["WiFi", "Restroom", "Power outlet", "Blanket", "Dinner", "Breakfast"],
        }
    }

    /// Human-readable label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Economy => "Economy",
            Self::Vip => "VIP",
            Self::SleeperBus => "Sleeper Bus",
        }
    }
}

impl fmt::Display for ServiceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Departure time of day, serialized as `HH:MM`
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DepartureTime(NaiveTime);

impl DepartureTime {
    const FORMAT: &'static str = "%H:%M";

    /// Builds a time from hour and minute
    #[must_use]
    pub fn from_hm(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// Parses `HH:MM`
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        NaiveTime::parse_from_str(value, Self::FORMAT).ok().map(Self)
    }

    /// The underlying time
    #[must_use]
    pub const fn time(self) -> NaiveTime {
        self.0
    }
}

impl fmt::Display for DepartureTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl Serialize for DepartureTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DepartureTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid departure time `{raw}`")))
    }
}

/// One scheduled bus for a route and date
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    /// Id within the result list
    pub id: DepartureId,
    /// Departure time
    pub time: DepartureTime,
    /// Trip duration in hours
    pub duration_hours: u8,
    /// Service class
    pub service_class: ServiceClass,
    /// Fare per seat
    pub price: Money,
    /// On-board amenities
    pub amenities: Vec<String>,
    /// Advertised free seats
    pub available_seats: u8,
}

// ============================================================================
// Search, passengers and contact
// ============================================================================

/// What the traveller searched for
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchCriteria {
    /// Origin city
    pub origin: CityCode,
    /// Destination city
    pub destination: CityCode,
    /// Travel date
    pub date: NaiveDate,
    /// Number of passengers (1-6)
    pub passenger_count: u8,
}

/// Identity document kinds accepted at boarding
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentType {
    /// National identity card
    #[default]
    NationalId,
    /// Passport
    Passport,
    /// Foreign resident card
    ForeignResidentCard,
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::NationalId => "National ID",
            Self::Passport => "Passport",
            Self::ForeignResidentCard => "Foreign resident card",
        })
    }
}

/// Longest accepted document number
pub const MAX_DOCUMENT_NUMBER_LEN: usize = 12;

/// Raw passenger form as typed by the user
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassengerForm {
    /// Document kind
    pub document_type: DocumentType,
    /// Document number
    pub document_number: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Email (required for the first passenger only)
    pub email: String,
    /// Phone (required for the first passenger only)
    pub phone: String,
}

/// A passenger bound to a seat
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passenger {
    /// Assigned seat
    pub seat: SeatNumber,
    /// Document kind
    pub document_type: DocumentType,
    /// Document number
    pub document_number: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Contact email, first passenger only
    pub email: Option<String>,
    /// Contact phone, first passenger only
    pub phone: Option<String>,
}

impl Passenger {
    /// "First Last", trimmed
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// Payer details captured on the payment step
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Payer's full name
    pub full_name: String,
    /// Email for the receipt
    pub email: String,
    /// Phone number
    pub phone: String,
    /// Payer's document number
    pub document_number: String,
    /// Birth date as typed
    pub birth_date: String,
}

impl ContactInfo {
    /// First empty required field, if any
    #[must_use]
    pub fn missing_field(&self) -> Option<&'static str> {
        [
            ("full_name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("document_number", &self.document_number),
            ("birth_date", &self.birth_date),
        ]
        .into_iter()
        .find(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn money_arithmetic() {
        assert_eq!(Money::new(89).times(2), Money::new(178));
        assert_eq!(Money::new(120).plus(SERVICE_FEE), Money::new(125));
        assert_eq!(Money::new(125).checked_sub(SERVICE_FEE), Some(Money::new(120)));
        assert_eq!(Money::new(3).checked_sub(SERVICE_FEE), None);
        assert_eq!(Money::new(u32::MAX).times(2), Money::new(u32::MAX));
        assert_eq!(Money::new(94).to_string(), "S/ 94");
    }

    #[test]
    fn departure_time_serializes_as_hh_mm() {
        let time = DepartureTime::from_hm(6, 0);
        assert_eq!(time.map(|t| t.to_string()).as_deref(), Some("06:00"));
        assert_eq!(
            serde_json::to_string(&DepartureTime::parse("23:30")).ok().as_deref(),
            Some("\"23:30\"")
        );
        assert!(serde_json::from_str::<DepartureTime>("\"25:99\"").is_err());
    }

    #[test]
    fn service_class_wire_names() {
        assert_eq!(serde_json::to_string(&ServiceClass::Vip).ok().as_deref(), Some("\"VIP\""));
        assert_eq!(ServiceClass::SleeperBus.multiplier_tenths(), 18);
        assert_eq!(ServiceClass::Vip.amenities().len(), 4);
    }

    #[test]
    fn unassigned_seat_displays_as_word() {
        assert_eq!(SeatNumber::UNASSIGNED.to_string(), "unassigned");
        assert_eq!(SeatNumber::new(12).to_string(), "12");
    }

    #[test]
    fn contact_reports_first_missing_field() {
        let mut contact = ContactInfo {
            full_name: "Ana Quispe".into(),
            email: "ana@example.com".into(),
            phone: "999111222".into(),
            document_number: "44556677".into(),
            birth_date: " ".into(),
        };
        assert_eq!(contact.missing_field(), Some("birth_date"));
        contact.birth_date = "1990-05-01".into();
        assert_eq!(contact.missing_field(), None);
    }
}
