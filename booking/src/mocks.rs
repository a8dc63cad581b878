//! Deterministic collaborators for tests and demos.
//!
//! Every mock records what it was asked to do so tests can assert on the
//! side effects of a booking without a network or randomness.

use crate::availability::Availability;
use crate::environment::BookingEnvironment;
use crate::notifier::{NotifyError, NotifyResult, Notifier};
use crate::share_target::{ShareResult, ShareTarget};
use crate::ticket::{CodeGenerator, TicketCode};
use crate::types::{
    CityCode, Departure, DepartureId, DepartureTime, Money, PaymentId, ServiceClass,
};
use busflow_core::environment::Clock;
use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Builds a departure with class amenities and 30 free seats
///
/// Returns `None` for an invalid time of day.
#[must_use]
pub fn departure(
    id: &str,
    hour: u32,
    minute: u32,
    service_class: ServiceClass,
    price: u32,
) -> Option<Departure> {
    Some(Departure {
        id: DepartureId::new(id),
        time: DepartureTime::from_hm(hour, minute)?,
        duration_hours: 15,
        service_class,
        price: Money::new(price),
        amenities: service_class.amenities().iter().map(ToString::to_string).collect(),
        available_seats: 30,
    })
}

/// Lima → Arequipa schedule: 06:00 Economy 89, 08:00 VIP 125, 10:00 Sleeper 160
#[must_use]
pub fn lima_arequipa_departures() -> Vec<Departure> {
    [
        departure("dep-0", 6, 0, ServiceClass::Economy, 89),
        departure("dep-1", 8, 0, ServiceClass::Vip, 125),
        departure("dep-2", 10, 0, ServiceClass::SleeperBus, 160),
    ]
    .into_iter()
    .flatten()
    .collect()
}

/// Availability returning fixed departures and fixed deck occupancy
///
/// Occupancy requests alternate lower deck, upper deck, lower deck, ...
pub struct ScriptedAvailability {
    departures: Vec<Departure>,
    lower: BTreeSet<u8>,
    upper: BTreeSet<u8>,
    occupancy_calls: AtomicUsize,
    searches: Mutex<Vec<(CityCode, CityCode, NaiveDate)>>,
}

impl ScriptedAvailability {
    /// Fixed departures, empty decks
    #[must_use]
    pub fn new(departures: Vec<Departure>) -> Self {
        Self {
            departures,
            lower: BTreeSet::new(),
            upper: BTreeSet::new(),
            occupancy_calls: AtomicUsize::new(0),
            searches: Mutex::new(Vec::new()),
        }
    }

    /// Sets deck-relative occupied seats (1-20 on each deck)
    #[must_use]
    pub fn with_occupancy(mut self, lower: impl IntoIterator<Item = u8>, upper: impl IntoIterator<Item = u8>) -> Self {
        self.lower = lower.into_iter().collect();
        self.upper = upper.into_iter().collect();
        self
    }

    /// Routes searched so far
    #[must_use]
    pub fn searches(&self) -> Vec<(CityCode, CityCode, NaiveDate)> {
        self.searches.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Availability for ScriptedAvailability {
    fn list_departures(
        &self,
        origin: &CityCode,
        destination: &CityCode,
        date: NaiveDate,
    ) -> Vec<Departure> {
        self.searches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((origin.clone(), destination.clone(), date));
        self.departures.clone()
    }

    fn generate_occupancy(&self, deck_size: u8) -> BTreeSet<u8> {
        let call = self.occupancy_calls.fetch_add(1, Ordering::SeqCst);
        let deck = if call % 2 == 0 { &self.lower } else { &self.upper };
        deck.iter().copied().filter(|seat| (1..=deck_size).contains(seat)).collect()
    }
}

/// Codes counting up: `TKT-000001`, `PAY00001`, ...
#[derive(Debug, Default)]
pub struct SequentialCodes {
    tickets: AtomicU64,
    payments: AtomicU64,
}

impl SequentialCodes {
    /// Starts both sequences at 1
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CodeGenerator for SequentialCodes {
    fn ticket_code(&self) -> TicketCode {
        let n = self.tickets.fetch_add(1, Ordering::SeqCst) + 1;
        TicketCode::from_raw(format!("TKT-{n:06}"))
    }

    fn payment_id(&self) -> PaymentId {
        let n = self.payments.fetch_add(1, Ordering::SeqCst) + 1;
        PaymentId::new(format!("PAY{n:05}"))
    }
}

/// Notifier that stores messages and optionally fails
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    failure: Option<NotifyError>,
}

impl RecordingNotifier {
    /// Accepts every message
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records every message, then fails with `error`
    #[must_use]
    pub fn failing(error: NotifyError) -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            failure: Some(error),
        }
    }

    /// Messages received so far
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_booking(&self, message: String) -> Pin<Box<dyn Future<Output = NotifyResult> + Send>> {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message);
        let result = self.failure.clone().map_or(Ok(()), Err);
        Box::pin(async move { result })
    }
}

/// Share target that stores texts
#[derive(Debug, Default)]
pub struct RecordingShareTarget {
    texts: Mutex<Vec<String>>,
}

impl RecordingShareTarget {
    /// Empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts shared so far
    #[must_use]
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ShareTarget for RecordingShareTarget {
    fn share(&self, text: String) -> Pin<Box<dyn Future<Output = ShareResult> + Send>> {
        self.texts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text);
        Box::pin(async { Ok(()) })
    }
}

/// Environment wired with recording mocks
///
/// Keeps handles on the mocks so tests can inspect them after the run.
#[derive(Clone)]
pub struct MockHarness {
    /// Environment to hand to the reducer or store
    pub env: BookingEnvironment,
    /// Availability passed in
    pub availability: Arc<ScriptedAvailability>,
    /// Notification recorder
    pub notifier: Arc<RecordingNotifier>,
    /// Share recorder
    pub share_target: Arc<RecordingShareTarget>,
}

impl MockHarness {
    /// Harness with an accepting notifier and no search delay
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, availability: ScriptedAvailability) -> Self {
        Self::with_notifier(clock, availability, RecordingNotifier::new())
    }

    /// Harness with a specific notifier
    #[must_use]
    pub fn with_notifier(
        clock: Arc<dyn Clock>,
        availability: ScriptedAvailability,
        notifier: RecordingNotifier,
    ) -> Self {
        let availability = Arc::new(availability);
        let notifier = Arc::new(notifier);
        let share_target = Arc::new(RecordingShareTarget::new());
        let env = BookingEnvironment::new(
            clock,
            Arc::clone(&availability) as Arc<dyn Availability>,
            Arc::new(SequentialCodes::new()),
            Arc::clone(&notifier) as Arc<dyn Notifier>,
            Arc::clone(&share_target) as Arc<dyn ShareTarget>,
        );

        Self {
            env,
            availability,
            notifier,
            share_target,
        }
    }
}
