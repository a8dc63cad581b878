//! Rejections of booking commands.

use crate::state::BookingPhase;
use crate::types::{CityCode, DepartureId, SeatNumber};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

/// Why a booking command was rejected
///
/// Rejections are stored on the state for the UI to show; they never change
/// the phase.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum BookingError {
    /// Origin and destination are the same city
    #[error("Origin and destination must be different")]
    SameOriginDestination,

    /// City not in the catalog
    #[error("Unknown city: {0}")]
    UnknownCity(CityCode),

    /// Passenger count outside 1..=6
    #[error("Passenger count must be between 1 and 6 (got {count})")]
    InvalidPassengerCount {
        /// Requested count
        count: u8,
    },

    /// Travel date before today
    #[error("Travel date {date} is in the past")]
    DateInPast {
        /// Requested date
        date: NaiveDate,
    },

    /// Departure id not in the current results
    #[error("Unknown departure: {0}")]
    UnknownDeparture(DepartureId),

    /// Seat number outside 1-40
    #[error("Seat {0} does not exist")]
    SeatOutOfRange(SeatNumber),

    /// Already holding one seat per passenger
    #[error("Seat limit reached: {limit} seat(s) already selected")]
    SeatLimitReached {
        /// Seats allowed for this booking
        limit: u8,
    },

    /// Seat taken by someone else
    #[error("Seat {0} is occupied")]
    SeatOccupied(SeatNumber),

    /// Tried to continue without one seat per passenger
    #[error("Select {required} seat(s) to continue ({selected} selected)")]
    SeatCountMismatch {
        /// Seats selected
        selected: usize,
        /// Seats required
        required: u8,
    },

    /// Passenger slot does not exist
    #[error("No passenger slot at index {index}")]
    PassengerIndexOutOfRange {
        /// Requested slot
        index: usize,
    },

    /// Required passenger field left empty
    #[error("Passenger {index}: {field} is required")]
    IncompletePassenger {
        /// Passenger slot
        index: usize,
        /// Missing field
        field: &'static str,
    },

    /// Document number too long
    #[error("Passenger {index}: document number is too long")]
    DocumentNumberTooLong {
        /// Passenger slot
        index: usize,
    },

    /// Required contact field left empty
    #[error("Contact {field} is required")]
    IncompleteContact {
        /// Missing field
        field: &'static str,
    },

    /// Command not valid in the current phase
    #[error("{action} is not allowed during {phase:?}")]
    WrongPhase {
        /// Rejected command
        action: &'static str,
        /// Phase at the time
        phase: BookingPhase,
    },
}

impl BookingError {
    /// Short label for metrics
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SameOriginDestination => "same_origin_destination",
            Self::UnknownCity(_) => "unknown_city",
            Self::InvalidPassengerCount { .. } => "invalid_passenger_count",
            Self::DateInPast { .. } => "date_in_past",
            Self::UnknownDeparture(_) => "unknown_departure",
            Self::SeatOutOfRange(_) => "seat_out_of_range",
            Self::SeatLimitReached { .. } => "seat_limit_reached",
            Self::SeatOccupied(_) => "seat_occupied",
            Self::SeatCountMismatch { .. } => "seat_count_mismatch",
            Self::PassengerIndexOutOfRange { .. } => "passenger_index_out_of_range",
            Self::IncompletePassenger { .. } => "incomplete_passenger",
            Self::DocumentNumberTooLong { .. } => "document_number_too_long",
            Self::IncompleteContact { .. } => "incomplete_contact",
            Self::WrongPhase { .. } => "wrong_phase",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_problem() {
        assert_eq!(
            BookingError::SeatLimitReached { limit: 2 }.to_string(),
            "Seat limit reached: 2 seat(s) already selected"
        );
        assert_eq!(
            BookingError::WrongPhase {
                action: "Pay",
                phase: BookingPhase::Search
            }
            .to_string(),
            "Pay is not allowed during Search"
        );
        assert_eq!(BookingError::SeatOccupied(SeatNumber::new(7)).kind(), "seat_occupied");
    }
}
