//! Static catalog of served cities and route fares.

use crate::types::{CityCode, Money};

/// A city served by the network
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct City {
    /// Catalog key used in searches and share links
    pub key: &'static str,
    /// Display name
    pub name: &'static str,
    /// Three-letter terminal code
    pub code: &'static str,
}

/// Cities offered in the search form
pub const CITIES: [City; 8] = [
    City { key: "lima", name: "Lima", code: "LIM" },
    City { key: "arequipa", name: "Arequipa", code: "AQP" },
    City { key: "cusco", name: "Cusco", code: "CUS" },
    City { key: "trujillo", name: "Trujillo", code: "TRU" },
    City { key: "chiclayo", name: "Chiclayo", code: "CHI" },
    City { key: "piura", name: "Piura", code: "PIU" },
    City { key: "ica", name: "Ica", code: "ICA" },
    City { key: "tacna", name: "Tacna", code: "TAC" },
];

/// Duration and base fare of a route
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RouteInfo {
    /// Trip length in hours
    pub duration_hours: u8,
    /// Economy fare before the class multiplier
    pub base_price: Money,
}

/// Used for any pair missing from the route table
pub const DEFAULT_ROUTE: RouteInfo = RouteInfo {
    duration_hours: 10,
    base_price: Money::new(70),
};

const fn route(duration_hours: u8, base_price: u32) -> RouteInfo {
    RouteInfo {
        duration_hours,
        base_price: Money::new(base_price),
    }
}

// "puno" is not a searchable city; the entry stays so links that carry it
// still price consistently.
const ROUTES: [(&str, &str, RouteInfo); 10] = [
    ("lima", "arequipa", route(15, 89)),
    ("lima", "cusco", route(22, 120)),
    ("lima", "trujillo", route(8, 65)),
    ("lima", "ica", route(4, 45)),
    ("lima", "chiclayo", route(12, 75)),
    ("lima", "piura", route(14, 85)),
    ("lima", "tacna", route(18, 110)),
    ("arequipa", "cusco", route(10, 70)),
    ("arequipa", "tacna", route(6, 50)),
    ("cusco", "puno", route(7, 55)),
];

/// Looks up a catalog city
#[must_use]
pub fn city(code: &CityCode) -> Option<&'static City> {
    CITIES.iter().find(|c| c.key == code.as_str())
}

/// True when the code is a searchable city
#[must_use]
pub fn is_known(code: &CityCode) -> bool {
    city(code).is_some()
}

/// Display name for a code, or the raw code when it is not in the catalog
#[must_use]
pub fn display_name(code: &CityCode) -> &str {
    city(code).map_or(code.as_str(), |c| c.name)
}

/// Route data for an unordered city pair, falling back to [`DEFAULT_ROUTE`]
#[must_use]
pub fn route_info(origin: &CityCode, destination: &CityCode) -> RouteInfo {
    let (a, b) = (origin.as_str(), destination.as_str());
    ROUTES
        .iter()
        .find(|(from, to, _)| (*from == a && *to == b) || (*from == b && *to == a))
        .map_or(DEFAULT_ROUTE, |(_, _, info)| *info)
}
