//! Booking state machine.
//!
//! ```text
//! Search → Results → SeatSelection → PassengerEntry → Payment → Confirmed
//!                                          share link ─────┘
//! ```
//!
//! Commands are validated against the current phase and the booking
//! invariants. A rejected command stores a [`BookingError`] in
//! `last_error`, leaves the phase untouched and produces no effects.
//! Events fed back by effects carry a generation so results and ticks for a
//! discarded booking are dropped.

use crate::actions::BookingAction;
use crate::catalog;
use crate::countdown::{self, Countdown, CountdownStatus};
use crate::environment::BookingEnvironment;
use crate::error::BookingError;
use crate::metrics;
use crate::notifier::booking_message;
use crate::seat_map::SeatMap;
use crate::share::{self, ShareLink, ShareSummary};
use crate::state::{
    Booking, BookingPhase, BookingState, Confirmation, Notice, NotificationStatus, ResumedLink,
};
use crate::ticket::{QrPattern, TicketCode};
use crate::types::{
    ContactInfo, Departure, DepartureId, MAX_DOCUMENT_NUMBER_LEN, MAX_PASSENGERS, Passenger, PassengerForm,
    SearchCriteria, SeatNumber,
};
use busflow_core::{async_effect, delay, effect::Effect, reducer::Reducer, smallvec, SmallVec};
use chrono::NaiveDate;
use std::sync::Arc;

type Effects = SmallVec<[Effect<BookingAction>; 4]>;

/// Reducer for the booking flow
#[derive(Clone, Debug, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Creates a new `BookingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn reject(state: &mut BookingState, error: BookingError) -> Effects {
        tracing::debug!(%error, phase = ?state.phase, "Command rejected");
        metrics::record_rejection(error.kind());
        state.last_error = Some(error);
        SmallVec::new()
    }

    fn wrong_phase(state: &mut BookingState, action: &'static str) -> Effects {
        let phase = state.phase;
        Self::reject(state, BookingError::WrongPhase { action, phase })
    }

    fn validate_search(criteria: &SearchCriteria, today: NaiveDate) -> Result<(), BookingError> {
        if criteria.origin == criteria.destination {
            return Err(BookingError::SameOriginDestination);
        }

        for city in [&criteria.origin, &criteria.destination] {
            if !catalog::is_known(city) {
                return Err(BookingError::UnknownCity(city.clone()));
            }
        }

        if !(1..=MAX_PASSENGERS).contains(&criteria.passenger_count) {
            return Err(BookingError::InvalidPassengerCount {
                count: criteria.passenger_count,
            });
        }

        if criteria.date < today {
            return Err(BookingError::DateInPast { date: criteria.date });
        }

        Ok(())
    }

    /// First problem in the passenger forms; the first passenger also owes
    /// an email and a phone
    fn validate_forms(forms: &[PassengerForm]) -> Result<(), BookingError> {
        for (index, form) in forms.iter().enumerate() {
            let mut required = vec![
                ("document_number", &form.document_number),
                ("first_name", &form.first_name),
                ("last_name", &form.last_name),
            ];
            if index == 0 {
                required.push(("email", &form.email));
                required.push(("phone", &form.phone));
            }

            if let Some((field, _)) = required.into_iter().find(|(_, v)| v.trim().is_empty()) {
                return Err(BookingError::IncompletePassenger { index, field });
            }

            if form.document_number.trim().chars().count() > MAX_DOCUMENT_NUMBER_LEN {
                return Err(BookingError::DocumentNumberTooLong { index });
            }
        }
        Ok(())
    }

    fn passengers_from_forms<'a>(
        seats: impl Iterator<Item = &'a SeatNumber>,
        forms: &[PassengerForm],
    ) -> Vec<Passenger> {
        seats
            .zip(forms)
            .enumerate()
            .map(|(index, (seat, form))| {
                let contact = |value: &str| (index == 0).then(|| value.trim().to_string());
                Passenger {
                    seat: *seat,
                    document_type: form.document_type,
                    document_number: form.document_number.trim().to_string(),
                    first_name: form.first_name.trim().to_string(),
                    last_name: form.last_name.trim().to_string(),
                    email: contact(&form.email),
                    phone: contact(&form.phone),
                }
            })
            .collect()
    }

    /// Stops the countdown if one is running
    fn stop_countdown(state: &mut BookingState, effects: &mut Effects) {
        if state.countdown.take().is_some() {
            metrics::record_countdown_stopped();
            effects.push(countdown::cancel());
        }
    }

    // ========== Commands ==========

    fn search(state: &mut BookingState, criteria: SearchCriteria, env: &BookingEnvironment) -> Effects {
        if state.phase != BookingPhase::Search {
            return Self::wrong_phase(state, "Search");
        }

        let today = env.clock.now().date_naive();
        if let Err(error) = Self::validate_search(&criteria, today) {
            return Self::reject(state, error);
        }

        let search = state.next_generation();
        let departures =
            env.availability
                .list_departures(&criteria.origin, &criteria.destination, criteria.date);

        tracing::info!(
            origin = %criteria.origin,
            destination = %criteria.destination,
            date = %criteria.date,
            passengers = criteria.passenger_count,
            search,
            "Searching departures"
        );
        metrics::record_search();

        state.booking = Booking::new(criteria);
        state.departures.clear();
        state.pending_search = Some(search);

        smallvec![delay! {
            duration: env.search_delay,
            action: BookingAction::DeparturesLoaded { search, departures }
        }]
    }

    fn select_departure(
        state: &mut BookingState,
        departure_id: &DepartureId,
        env: &BookingEnvironment,
    ) -> Effects {
        if state.phase != BookingPhase::Results {
            return Self::wrong_phase(state, "SelectDeparture");
        }

        let Some(departure) = state.departures.iter().find(|d| &d.id == departure_id).cloned() else {
            return Self::reject(state, BookingError::UnknownDeparture(departure_id.clone()));
        };

        state.seat_map = SeatMap::draw(env.availability.as_ref());
        tracing::debug!(
            departure = %departure.id,
            occupied = state.seat_map.occupied_count(),
            "Departure selected"
        );
        state.booking.set_departure(departure);
        state.passenger_forms.clear();
        state.phase = BookingPhase::SeatSelection;
        SmallVec::new()
    }

    fn toggle_seat(state: &mut BookingState, seat: SeatNumber) -> Effects {
        if state.phase != BookingPhase::SeatSelection {
            return Self::wrong_phase(state, "ToggleSeat");
        }

        if state.booking.selected_seats().contains(&seat) {
            state.booking.deselect_seat(seat);
            return SmallVec::new();
        }

        if !SeatMap::contains(seat) {
            return Self::reject(state, BookingError::SeatOutOfRange(seat));
        }

        let limit = state.booking.passenger_count();
        if state.booking.selected_seats().len() >= usize::from(limit) {
            return Self::reject(state, BookingError::SeatLimitReached { limit });
        }

        if state.seat_map.is_occupied(seat) {
            return Self::reject(state, BookingError::SeatOccupied(seat));
        }

        state.booking.select_seat(seat);
        SmallVec::new()
    }

    fn continue_to_passengers(state: &mut BookingState) -> Effects {
        if state.phase != BookingPhase::SeatSelection {
            return Self::wrong_phase(state, "ContinueToPassengers");
        }

        let required = state.booking.passenger_count();
        let selected = state.booking.selected_seats().len();
        if selected != usize::from(required) {
            return Self::reject(state, BookingError::SeatCountMismatch { selected, required });
        }

        // Forms survive a trip back to the seat map
        if state.passenger_forms.len() != selected {
            state.passenger_forms = vec![PassengerForm::default(); selected];
        }
        state.phase = BookingPhase::PassengerEntry;
        SmallVec::new()
    }

    fn update_passenger(state: &mut BookingState, index: usize, form: PassengerForm) -> Effects {
        if state.phase != BookingPhase::PassengerEntry {
            return Self::wrong_phase(state, "UpdatePassenger");
        }

        let Some(slot) = state.passenger_forms.get_mut(index) else {
            return Self::reject(state, BookingError::PassengerIndexOutOfRange { index });
        };
        *slot = form;
        SmallVec::new()
    }

    fn continue_to_payment(state: &mut BookingState) -> Effects {
        if state.phase != BookingPhase::PassengerEntry {
            return Self::wrong_phase(state, "ContinueToPayment");
        }

        if let Err(error) = Self::validate_forms(&state.passenger_forms) {
            return Self::reject(state, error);
        }

        let passengers =
            Self::passengers_from_forms(state.booking.selected_seats().iter(), &state.passenger_forms);
        state.booking.set_passengers(passengers);
        state.phase = BookingPhase::Payment;
        SmallVec::new()
    }

    fn pay(state: &mut BookingState, contact: ContactInfo, env: &BookingEnvironment) -> Effects {
        if state.phase != BookingPhase::Payment {
            return Self::wrong_phase(state, "Pay");
        }

        if let Some(field) = contact.missing_field() {
            return Self::reject(state, BookingError::IncompleteContact { field });
        }

        let mut effects = Effects::new();
        Self::stop_countdown(state, &mut effects);

        let now = env.clock.now();
        let ticket_code = env.codes.ticket_code();
        state.booking.set_contact(contact);
        let message = booking_message(&state.booking, &ticket_code, now);
        let total = state.booking.grand_total();

        state.confirmation = Some(Confirmation {
            pattern: QrPattern::for_code(&ticket_code),
            ticket_code: ticket_code.clone(),
            confirmed_at: now,
            notification: NotificationStatus::Pending,
        });
        state.phase = BookingPhase::Confirmed;

        tracing::info!(
            ticket = %ticket_code,
            %total,
            seats = state.booking.selected_seats().len(),
            shared = state.is_resumed(),
            "Booking confirmed"
        );
        metrics::record_confirmed(state.is_resumed(), total.amount());

        let notifier = Arc::clone(&env.notifier);
        effects.push(async_effect! {
            let outcome = notifier
                .notify_booking(message)
                .await
                .map_err(|error| error.to_string());
            Some(BookingAction::NotificationFinished { ticket_code, outcome })
        });
        effects
    }

    fn request_share_link(state: &mut BookingState, env: &BookingEnvironment) -> Effects {
        if state.phase != BookingPhase::Payment {
            return Self::wrong_phase(state, "RequestShareLink");
        }

        let Some(summary) = ShareSummary::from_booking(&state.booking) else {
            return Self::wrong_phase(state, "RequestShareLink");
        };

        let link = match ShareLink::build(&env.share_base_url, env.codes.payment_id(), &summary) {
            Ok(link) => link,
            Err(error) => {
                tracing::error!(%error, "Failed to build share link");
                return SmallVec::new();
            },
        };

        tracing::info!(payment_id = %link.payment_id, total = %summary.total, "Share link created");
        metrics::record_share_link("created");

        let share_target = Arc::clone(&env.share_target);
        let text = link.text.clone();
        state.share_link = Some(link);

        smallvec![async_effect! {
            let outcome = share_target.share(text).await.map_err(|error| error.to_string());
            Some(BookingAction::ShareFinished { outcome })
        }]
    }

    fn open_shared_link(state: &mut BookingState, payment_id: String, data: &str) -> Effects {
        if state.phase != BookingPhase::Search {
            return Self::wrong_phase(state, "OpenSharedLink");
        }

        let summary = match share::decode(data) {
            Ok(summary) => summary,
            Err(error) => {
                tracing::warn!(%error, %payment_id, "Invalid share link");
                metrics::record_share_link("invalid");
                state.reset();
                state.notice = Some(Notice::InvalidLink {
                    reason: error.to_string(),
                });
                return SmallVec::new();
            },
        };

        state.reset();
        let generation = state.generation;

        tracing::info!(
            %payment_id,
            origin = %summary.origin,
            destination = %summary.destination,
            total = %summary.total,
            "Resuming shared booking"
        );
        metrics::record_share_link("opened");
        metrics::record_countdown_started();

        state.booking = Booking::resumed(&summary);
        state.resumed = Some(ResumedLink {
            payment_id,
            requested_by: summary.primary_passenger_name,
        });
        state.countdown = Some(Countdown::start(generation));
        state.phase = BookingPhase::Payment;

        smallvec![countdown::schedule_tick(BookingAction::CountdownTick { generation })]
    }

    fn go_back(state: &mut BookingState) -> Effects {
        match state.phase {
            BookingPhase::Results => {
                state.departures.clear();
                state.pending_search = None;
                state.phase = BookingPhase::Search;
            },
            BookingPhase::SeatSelection => {
                state.seat_map = SeatMap::default();
                state.phase = BookingPhase::Results;
            },
            BookingPhase::PassengerEntry => state.phase = BookingPhase::SeatSelection,
            BookingPhase::Payment if !state.is_resumed() => {
                state.share_link = None;
                state.phase = BookingPhase::PassengerEntry;
            },
            BookingPhase::Search | BookingPhase::Payment | BookingPhase::Confirmed => {
                return Self::wrong_phase(state, "GoBack");
            },
        }
        SmallVec::new()
    }

    fn new_search(state: &mut BookingState) -> Effects {
        let mut effects = Effects::new();
        Self::stop_countdown(state, &mut effects);
        state.reset();
        effects
    }

    // ========== Events ==========

    fn departures_loaded(
        state: &mut BookingState,
        search: u64,
        departures: Vec<Departure>,
    ) -> Effects {
        if state.pending_search != Some(search) || state.phase != BookingPhase::Search {
            tracing::debug!(search, "Ignoring stale search results");
            return SmallVec::new();
        }

        tracing::debug!(search, count = departures.len(), "Departures loaded");
        state.pending_search = None;
        state.departures = departures;
        state.phase = BookingPhase::Results;
        SmallVec::new()
    }

    fn countdown_tick(state: &mut BookingState, generation: u64) -> Effects {
        let in_payment = state.phase == BookingPhase::Payment;
        let Some(countdown) = state
            .countdown
            .as_mut()
            .filter(|c| in_payment && c.generation() == generation)
        else {
            tracing::trace!(generation, "Ignoring stale countdown tick");
            return SmallVec::new();
        };

        match countdown.tick() {
            CountdownStatus::Running => {
                smallvec![countdown::schedule_tick(BookingAction::CountdownTick { generation })]
            },
            CountdownStatus::Expired => {
                tracing::info!(generation, "Shared booking payment window expired");
                metrics::record_share_link("expired");
                metrics::record_countdown_stopped();
                state.reset();
                state.notice = Some(Notice::LinkExpired);
                SmallVec::new()
            },
        }
    }

    fn notification_finished(
        state: &mut BookingState,
        ticket_code: &TicketCode,
        outcome: Result<(), String>,
    ) -> Effects {
        metrics::record_notification(outcome.is_ok());
        let status = match outcome {
            Ok(()) => {
                tracing::debug!(ticket = %ticket_code, "Booking notification delivered");
                NotificationStatus::Delivered
            },
            Err(reason) => {
                tracing::warn!(ticket = %ticket_code, %reason, "Booking notification failed");
                NotificationStatus::Failed { reason }
            },
        };

        if let Some(confirmation) = state
            .confirmation
            .as_mut()
            .filter(|c| &c.ticket_code == ticket_code)
        {
            confirmation.notification = status;
        }
        SmallVec::new()
    }
}

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        tracing::trace!(action = action.name(), phase = ?state.phase, "Reducing");

        if action.is_command() {
            state.last_error = None;
            state.notice = None;
        }

        match action {
            // ========== Commands ==========
            BookingAction::Search { criteria } => Self::search(state, criteria, env),
            BookingAction::SelectDeparture { departure_id } => {
                Self::select_departure(state, &departure_id, env)
            },
            BookingAction::ToggleSeat { seat } => Self::toggle_seat(state, seat),
            BookingAction::ContinueToPassengers => Self::continue_to_passengers(state),
            BookingAction::UpdatePassenger { index, form } => {
                Self::update_passenger(state, index, form)
            },
            BookingAction::ContinueToPayment => Self::continue_to_payment(state),
            BookingAction::Pay { contact } => Self::pay(state, contact, env),
            BookingAction::RequestShareLink => Self::request_share_link(state, env),
            BookingAction::OpenSharedLink { payment_id, data } => {
                Self::open_shared_link(state, payment_id, &data)
            },
            BookingAction::GoBack => Self::go_back(state),
            BookingAction::NewSearch => Self::new_search(state),

            // ========== Events ==========
            BookingAction::DeparturesLoaded { search, departures } => {
                Self::departures_loaded(state, search, departures)
            },
            BookingAction::CountdownTick { generation } => Self::countdown_tick(state, generation),
            BookingAction::NotificationFinished {
                ticket_code,
                outcome,
            } => Self::notification_finished(state, &ticket_code, outcome),
            BookingAction::ShareFinished { outcome } => {
                match outcome {
                    Ok(()) => tracing::debug!("Share link handed over"),
                    Err(reason) => tracing::warn!(%reason, "Sharing failed"),
                }
                SmallVec::new()
            },
        }
    }
}
