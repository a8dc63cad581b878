//! Two-deck seat map of a departure.

use crate::availability::Availability;
use crate::types::SeatNumber;
use serde::Serialize;
use std::collections::BTreeSet;

/// Seats per deck
pub const DECK_SIZE: u8 = 20;

/// Seats on the bus
pub const TOTAL_SEATS: u8 = DECK_SIZE * 2;

/// Deck of a seat
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Deck {
    /// Seats 1-20
    Lower,
    /// Seats 21-40
    Upper,
}

impl Deck {
    /// Deck holding `seat`, if the seat exists
    #[must_use]
    pub const fn of(seat: SeatNumber) -> Option<Self> {
        match seat.get() {
            1..=DECK_SIZE => Some(Self::Lower),
            n if n > DECK_SIZE && n <= TOTAL_SEATS => Some(Self::Upper),
            _ => None,
        }
    }
}

/// Rendering state of one seat
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum SeatState {
    /// Free to pick
    Available,
    /// Taken by someone else
    Occupied,
    /// Picked in the current booking
    Selected,
}

/// Occupancy snapshot drawn when a departure is opened
///
/// Occupied seats never change while the departure is shown.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SeatMap {
    occupied: BTreeSet<SeatNumber>,
}

impl SeatMap {
    /// Builds a map from deck-relative occupancy sets (1-based per deck)
    ///
    /// Numbers outside `1..=DECK_SIZE` are ignored.
    #[must_use]
    pub fn from_decks(lower: &BTreeSet<u8>, upper: &BTreeSet<u8>) -> Self {
        let in_deck = |n: &&u8| (1..=DECK_SIZE).contains(*n);
        let occupied = lower
            .iter()
            .filter(in_deck)
            .map(|n| SeatNumber::new(*n))
            .chain(upper.iter().filter(in_deck).map(|n| SeatNumber::new(n + DECK_SIZE)))
            .collect();
        Self { occupied }
    }

    /// Draws both decks independently
    #[must_use]
    pub fn draw(availability: &dyn Availability) -> Self {
        let lower = availability.generate_occupancy(DECK_SIZE);
        let upper = availability.generate_occupancy(DECK_SIZE);
        Self::from_decks(&lower, &upper)
    }

    /// True for seats 1-40
    #[must_use]
    pub const fn contains(seat: SeatNumber) -> bool {
        Deck::of(seat).is_some()
    }

    /// True when the seat was drawn as occupied
    #[must_use]
    pub fn is_occupied(&self, seat: SeatNumber) -> bool {
        self.occupied.contains(&seat)
    }

    /// Number of occupied seats
    #[must_use]
    pub fn occupied_count(&self) -> usize {
        self.occupied.len()
    }

    /// State of `seat` given the current selection
    #[must_use]
    pub fn state_of(&self, seat: SeatNumber, selected: &BTreeSet<SeatNumber>) -> SeatState {
        if self.is_occupied(seat) {
            SeatState::Occupied
        } else if selected.contains(&seat) {
            SeatState::Selected
        } else {
            SeatState::Available
        }
    }

    /// Every seat with its state, lower deck first
    pub fn seats<'a>(
        &'a self,
        selected: &'a BTreeSet<SeatNumber>,
    ) -> impl Iterator<Item = (SeatNumber, SeatState)> + 'a {
        (1..=TOTAL_SEATS).map(move |n| {
            let seat = SeatNumber::new(n);
            (seat, self.state_of(seat, selected))
        })
    }

    /// Seats nobody has taken, ascending
    pub fn available(&self) -> impl Iterator<Item = SeatNumber> + '_ {
        (1..=TOTAL_SEATS)
            .map(SeatNumber::new)
            .filter(|seat| !self.is_occupied(*seat))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upper_deck_is_offset() {
        let lower = BTreeSet::from([1, 20]);
        let upper = BTreeSet::from([1, 5, 21, 0]);
        let map = SeatMap::from_decks(&lower, &upper);

        assert!(map.is_occupied(SeatNumber::new(1)));
        assert!(map.is_occupied(SeatNumber::new(20)));
        assert!(map.is_occupied(SeatNumber::new(21)));
        assert!(map.is_occupied(SeatNumber::new(25)));
        assert_eq!(map.occupied_count(), 4);
    }

    #[test]
    fn seat_states_never_overlap() {
        let map = SeatMap::from_decks(&BTreeSet::from([3]), &BTreeSet::new());
        let selected = BTreeSet::from([SeatNumber::new(3), SeatNumber::new(4)]);

        assert_eq!(map.state_of(SeatNumber::new(3), &selected), SeatState::Occupied);
        assert_eq!(map.state_of(SeatNumber::new(4), &selected), SeatState::Selected);
        assert_eq!(map.state_of(SeatNumber::new(5), &selected), SeatState::Available);
        assert_eq!(map.seats(&selected).count(), 40);
        assert_eq!(map.available().count(), 39);
    }

    #[test]
    fn deck_bounds() {
        assert_eq!(Deck::of(SeatNumber::new(20)), Some(Deck::Lower));
        assert_eq!(Deck::of(SeatNumber::new(21)), Some(Deck::Upper));
        assert_eq!(Deck::of(SeatNumber::new(41)), None);
        assert!(!SeatMap::contains(SeatNumber::UNASSIGNED));
    }
}
