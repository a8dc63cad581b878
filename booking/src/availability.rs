//! Simulated availability: departures per route and seat occupancy per deck.
//!
//! Nothing is persisted. Every search produces a fresh random schedule and
//! every opened departure a fresh occupancy draw.

use crate::catalog::{self, RouteInfo};
use crate::types::{CityCode, Departure, DepartureId, DepartureTime, Money, ServiceClass};
use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeSet;
use std::sync::{Mutex, PoisonError};

/// Daily departure times; a search lists the first five to seven
pub const DAILY_SCHEDULE: [(u32, u32); 8] = [
    (6, 0),
    (8, 0),
    (10, 0),
    (14, 0),
    (16, 0),
    (20, 0),
    (22, 0),
    (23, 30),
];

/// Source of departures and seat occupancy
pub trait Availability: Send + Sync {
    /// Departures for a route on a date
    fn list_departures(
        &self,
        origin: &CityCode,
        destination: &CityCode,
        date: NaiveDate,
    ) -> Vec<Departure>;

    /// Occupied seat numbers (1-based) for one deck of `deck_size` seats
    fn generate_occupancy(&self, deck_size: u8) -> BTreeSet<u8>;
}

/// Per-seat fare for a class: `round(base × multiplier)`, halves rounded up
#[must_use]
pub const fn fare_for(base: Money, class: ServiceClass) -> Money {
    let scaled = base.amount().saturating_mul(class.multiplier_tenths());
    Money::new(scaled.saturating_add(5) / 10)
}

/// Builds `count` departures for a route, service classes cycling
/// Economy → VIP → Sleeper Bus
pub fn build_departures<R: Rng + ?Sized>(rng: &mut R, route: RouteInfo, count: usize) -> Vec<Departure> {
    DAILY_SCHEDULE
        .iter()
        .filter_map(|(h, m)| DepartureTime::from_hm(*h, *m))
        .take(count)
        .enumerate()
        .map(|(i, time)| {
            let service_class = ServiceClass::ALL[i % ServiceClass::ALL.len()];
            Departure {
                id: DepartureId::new(format!("dep-{i}")),
                time,
                duration_hours: route.duration_hours,
                service_class,
                price: fare_for(route.base_price, service_class),
                amenities: service_class.amenities().iter().map(ToString::to_string).collect(),
                available_seats: rng.gen_range(20..40),
            }
        })
        .collect()
}

/// Random occupancy for one deck
///
/// Targets 30-70% of the deck. Each pick has a 40% chance of also taking the
/// neighbouring seat of the pair (odd seats pair upwards, even seats
/// downwards) while under target and inside the deck. Always terminates
/// because the target stays below the deck size.
pub fn draw_occupancy<R: Rng + ?Sized>(rng: &mut R, deck_size: u8) -> BTreeSet<u8> {
    let mut occupied = BTreeSet::new();
    if deck_size == 0 {
        return occupied;
    }

    let ratio = rng.gen_range(0.3..=0.7);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let target = (f64::from(deck_size) * ratio).floor() as usize;

    while occupied.len() < target {
        let seat = rng.gen_range(1..=deck_size);
        occupied.insert(seat);

        if rng.gen_bool(0.4) && occupied.len() < target {
            let partner = if seat % 2 == 0 { seat - 1 } else { seat.saturating_add(1) };
            if (1..=deck_size).contains(&partner) {
                occupied.insert(partner);
            }
        }
    }

    occupied
}

/// Random availability backed by a seedable RNG
pub struct RandomAvailability {
    rng: Mutex<StdRng>,
}

impl RandomAvailability {
    /// Seeded from OS entropy
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Deterministic sequence for a seed
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut rng)
    }
}

impl Default for RandomAvailability {
    fn default() -> Self {
        Self::new()
    }
}

impl Availability for RandomAvailability {
    fn list_departures(
        &self,
        origin: &CityCode,
        destination: &CityCode,
        date: NaiveDate,
    ) -> Vec<Departure> {
        let route = catalog::route_info(origin, destination);
        let departures = self.with_rng(|rng| {
            let count = 5 + rng.gen_range(0..3);
            build_departures(rng, route, count)
        });
        tracing::debug!(
            %origin,
            %destination,
            %date,
            count = departures.len(),
            "Generated departures"
        );
        departures
    }

    fn generate_occupancy(&self, deck_size: u8) -> BTreeSet<u8> {
        self.with_rng(|rng| draw_occupancy(rng, deck_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fares_round_half_up() {
        assert_eq!(fare_for(Money::new(89), ServiceClass::Economy), Money::new(89));
        // 89 × 1.4 = 124.6
        assert_eq!(fare_for(Money::new(89), ServiceClass::Vip), Money::new(125));
        // 45 × 1.8 = 81.0
        assert_eq!(fare_for(Money::new(45), ServiceClass::SleeperBus), Money::new(81));
        // 65 × 1.4 = 91.0, 55 × 1.8 = 99.0, 75 × 1.4 = 105.0
        assert_eq!(fare_for(Money::new(75), ServiceClass::Vip), Money::new(105));
    }

    #[test]
    fn departures_follow_schedule_and_class_cycle() {
        let availability = RandomAvailability::seeded(7);
        let departures = availability.list_departures(
            &CityCode::new("lima"),
            &CityCode::new("arequipa"),
            NaiveDate::MIN,
        );

        assert!((5..=7).contains(&departures.len()));
        assert_eq!(departures[0].time.to_string(), "06:00");
        assert_eq!(departures[0].service_class, ServiceClass::Economy);
        assert_eq!(departures[0].price, Money::new(89));
        assert_eq!(departures[1].service_class, ServiceClass::Vip);
        assert_eq!(departures[2].service_class, ServiceClass::SleeperBus);
        assert_eq!(departures[3].service_class, ServiceClass::Economy);
        for d in &departures {
            assert_eq!(d.duration_hours, 15);
            assert!((20..40).contains(&d.available_seats));
        }
    }

    #[test]
    fn occupancy_stays_in_bounds() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let occupied = draw_occupancy(&mut rng, 20);
            assert!(occupied.len() <= 14);
            assert!(occupied.len() >= 6);
            assert!(occupied.iter().all(|s| (1..=20).contains(s)));
        }
    }

    #[test]
    fn tiny_decks_terminate() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!(draw_occupancy(&mut rng, 0).is_empty());
        assert!(draw_occupancy(&mut rng, 1).is_empty());
        assert!(draw_occupancy(&mut rng, 3).len() <= 2);
    }

    #[test]
    fn seeded_availability_is_deterministic() {
        let a = RandomAvailability::seeded(99);
        let b = RandomAvailability::seeded(99);
        assert_eq!(a.generate_occupancy(20), b.generate_occupancy(20));
    }
}
