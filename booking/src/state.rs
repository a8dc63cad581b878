//! Booking session state.

use crate::catalog;
use crate::countdown::Countdown;
use crate::error::BookingError;
use crate::seat_map::SeatMap;
use crate::share::{ShareLink, ShareSummary};
use crate::ticket::{QrPattern, TicketCode};
use crate::types::{
    ContactInfo, Departure, DepartureId, DocumentType, Money, Passenger, PassengerForm,
    SERVICE_FEE, SearchCriteria, SeatNumber,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

/// Step of the purchase flow
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub enum BookingPhase {
    /// Search form
    #[default]
    Search,
    /// Departure list
    Results,
    /// Seat map
    SeatSelection,
    /// Passenger forms
    PassengerEntry,
    /// Payment form
    Payment,
    /// Ticket issued
    Confirmed,
}

/// The booking being assembled
///
/// Fields are private so the fare can only change together with the seats
/// or the departure: `total_fare == selected_seats.len() × departure.price`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Booking {
    criteria: Option<SearchCriteria>,
    departure: Option<Departure>,
    selected_seats: BTreeSet<SeatNumber>,
    passengers: Vec<Passenger>,
    contact: Option<ContactInfo>,
    total_fare: Money,
}

impl Booking {
    /// Empty booking for a search
    #[must_use]
    pub fn new(criteria: SearchCriteria) -> Self {
        Self {
            criteria: Some(criteria),
            ..Self::default()
        }
    }

    /// Booking rebuilt from a share link, ready for payment
    ///
    /// Carries one placeholder passenger with the primary name, one
    /// [`SeatNumber::UNASSIGNED`] seat and a fare of `total − fee`.
    #[must_use]
    pub fn resumed(summary: &ShareSummary) -> Self {
        let route = catalog::route_info(&summary.origin, &summary.destination);
        let departure = Departure {
            id: DepartureId::shared(),
            time: summary.time,
            duration_hours: route.duration_hours,
            service_class: summary.service_class,
            price: summary.fare(),
            amenities: summary
                .service_class
                .amenities()
                .iter()
                .map(ToString::to_string)
                .collect(),
            available_seats: 0,
        };
        let placeholder = Passenger {
            seat: SeatNumber::UNASSIGNED,
            document_type: DocumentType::default(),
            document_number: String::new(),
            first_name: summary.primary_passenger_name.clone(),
            last_name: String::new(),
            email: None,
            phone: None,
        };

        let mut booking = Self::new(SearchCriteria {
            origin: summary.origin.clone(),
            destination: summary.destination.clone(),
            date: summary.date,
            passenger_count: 1,
        });
        booking.set_departure(departure);
        booking.selected_seats.insert(SeatNumber::UNASSIGNED);
        booking.passengers.push(placeholder);
        booking.recompute_fare();
        booking
    }

    /// Search criteria
    #[must_use]
    pub const fn criteria(&self) -> Option<&SearchCriteria> {
        self.criteria.as_ref()
    }

    /// Chosen departure
    #[must_use]
    pub const fn departure(&self) -> Option<&Departure> {
        self.departure.as_ref()
    }

    /// Selected seats, ascending
    #[must_use]
    pub const fn selected_seats(&self) -> &BTreeSet<SeatNumber> {
        &self.selected_seats
    }

    /// Passengers in seat order
    #[must_use]
    pub fn passengers(&self) -> &[Passenger] {
        &self.passengers
    }

    /// Payer details
    #[must_use]
    pub const fn contact(&self) -> Option<&ContactInfo> {
        self.contact.as_ref()
    }

    /// Seats × price
    #[must_use]
    pub const fn total_fare(&self) -> Money {
        self.total_fare
    }

    /// Fare plus service fee
    #[must_use]
    pub const fn grand_total(&self) -> Money {
        self.total_fare.plus(SERVICE_FEE)
    }

    /// Seats to select; 0 before a search
    #[must_use]
    pub fn passenger_count(&self) -> u8 {
        self.criteria.as_ref().map_or(0, |c| c.passenger_count)
    }

    /// Switches departure, dropping seats and passengers
    pub fn set_departure(&mut self, departure: Departure) {
        self.departure = Some(departure);
        self.selected_seats.clear();
        self.passengers.clear();
        self.recompute_fare();
    }

    /// Adds a seat; false if already selected
    pub fn select_seat(&mut self, seat: SeatNumber) -> bool {
        let added = self.selected_seats.insert(seat);
        self.recompute_fare();
        added
    }

    /// Removes a seat; false if it was not selected
    pub fn deselect_seat(&mut self, seat: SeatNumber) -> bool {
        let removed = self.selected_seats.remove(&seat);
        self.recompute_fare();
        removed
    }

    /// Replaces the passenger list
    pub fn set_passengers(&mut self, passengers: Vec<Passenger>) {
        self.passengers = passengers;
    }

    /// Stores payer details
    pub fn set_contact(&mut self, contact: ContactInfo) {
        self.contact = Some(contact);
    }

    fn recompute_fare(&mut self) {
        let price = self.departure.as_ref().map_or(Money::ZERO, |d| d.price);
        let seats = u32::try_from(self.selected_seats.len()).unwrap_or(u32::MAX);
        self.total_fare = price.times(seats);
    }
}

/// Delivery state of the operator notification
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum NotificationStatus {
    /// Sent, no answer yet
    #[default]
    Pending,
    /// Accepted by the endpoint
    Delivered,
    /// Failed; the booking stands
    Failed {
        /// Failure description
        reason: String,
    },
}

/// Issued ticket
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    /// Ticket code
    pub ticket_code: TicketCode,
    /// Decorative pattern for the code
    pub pattern: QrPattern,
    /// When payment was accepted
    pub confirmed_at: DateTime<Utc>,
    /// Operator notification outcome
    pub notification: NotificationStatus,
}

/// Non-error message for the user
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum Notice {
    /// A shared booking's payment window ran out
    LinkExpired,
    /// An opened share link could not be read
    InvalidLink {
        /// Decode failure
        reason: String,
    },
}

/// Origin of a booking opened from a share link
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResumedLink {
    /// Payment id from the link
    pub payment_id: String,
    /// Who asked for the payment
    pub requested_by: String,
}

/// Complete state of one booking session
#[derive(Clone, Debug, Default, Serialize)]
pub struct BookingState {
    /// Current step
    pub phase: BookingPhase,
    /// Booking in progress
    pub booking: Booking,
    /// Results of the last search
    pub departures: Vec<Departure>,
    /// Occupancy of the chosen departure
    pub seat_map: SeatMap,
    /// Passenger forms, one per selected seat
    pub passenger_forms: Vec<PassengerForm>,
    /// Payment window of a resumed booking
    pub countdown: Option<Countdown>,
    /// Set when the booking came from a share link
    pub resumed: Option<ResumedLink>,
    /// Last share link built in this session
    pub share_link: Option<ShareLink>,
    /// Set once paid
    pub confirmation: Option<Confirmation>,
    /// Generation of the search waiting for results
    pub pending_search: Option<u64>,
    /// Bumped on every new search, resume and reset
    pub generation: u64,
    /// Why the last command was rejected
    pub last_error: Option<BookingError>,
    /// Message for the user
    pub notice: Option<Notice>,
}

impl BookingState {
    /// Fresh session at the search form
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True for bookings opened from a share link
    #[must_use]
    pub const fn is_resumed(&self) -> bool {
        self.resumed.is_some()
    }

    /// Discards the booking and returns to the search form
    ///
    /// The generation moves forward so in-flight results and ticks for the
    /// discarded booking are ignored.
    pub fn reset(&mut self) {
        let generation = self.generation.wrapping_add(1);
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    /// Starts a new generation and returns it
    pub const fn next_generation(&mut self) -> u64 {
        self.generation = self.generation.wrapping_add(1);
        self.generation
    }
}
