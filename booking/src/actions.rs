//! Inputs of the booking reducer.

use crate::ticket::TicketCode;
use crate::types::{ContactInfo, Departure, DepartureId, PassengerForm, SearchCriteria, SeatNumber};
use busflow_macros::Action;

/// Actions for the booking state machine
///
/// Commands come from the user; events are fed back by effects.
#[derive(Action, Clone, Debug, PartialEq, Eq)]
pub enum BookingAction {
    // Commands
    /// Look for departures
    #[command]
    Search {
        /// What to look for
        criteria: SearchCriteria,
    },

    /// Pick a departure from the results
    #[command]
    SelectDeparture {
        /// Departure to open
        departure_id: DepartureId,
    },

    /// Select or release a seat
    #[command]
    ToggleSeat {
        /// Seat to toggle
        seat: SeatNumber,
    },

    /// Leave the seat map for the passenger forms
    #[command]
    ContinueToPassengers,

    /// Replace one passenger form
    #[command]
    UpdatePassenger {
        /// Form slot
        index: usize,
        /// Form contents
        form: PassengerForm,
    },

    /// Leave the passenger forms for payment
    #[command]
    ContinueToPayment,

    /// Pay and issue the ticket
    #[command]
    Pay {
        /// Payer details
        contact: ContactInfo,
    },

    /// Build a link so someone else can pay
    #[command]
    RequestShareLink,

    /// Resume a booking from a share link
    #[command]
    OpenSharedLink {
        /// `pay` parameter
        payment_id: String,
        /// `data` parameter
        data: String,
    },

    /// Return to the previous step
    #[command]
    GoBack,

    /// Discard the booking and start over
    #[command]
    NewSearch,

    // Events
    /// Search results arrived
    #[event]
    DeparturesLoaded {
        /// Generation of the search that produced them
        search: u64,
        /// Departures found
        departures: Vec<Departure>,
    },

    /// One second of the payment countdown passed
    #[event]
    CountdownTick {
        /// Generation of the booking the tick belongs to
        generation: u64,
    },

    /// Operator notification finished
    #[event]
    NotificationFinished {
        /// Ticket the notification was about
        ticket_code: TicketCode,
        /// Error text on failure
        outcome: Result<(), String>,
    },

    /// Share target finished
    #[event]
    ShareFinished {
        /// Error text on failure
        outcome: Result<(), String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_and_events_are_marked() {
        assert!(BookingAction::NewSearch.is_command());
        assert!(BookingAction::GoBack.is_command());
        assert!(BookingAction::CountdownTick { generation: 1 }.is_event());
        assert!(!BookingAction::ShareFinished { outcome: Ok(()) }.is_command());
        assert_eq!(BookingAction::ContinueToPayment.name(), "ContinueToPayment");
    }
}
