//! Property tests for seat selection and the share-link codec

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use busflow_booking::mocks::{MockHarness, ScriptedAvailability, lima_arequipa_departures};
use busflow_booking::share::{self, DecodeError, ShareSummary};
use busflow_booking::{
    BookingAction, BookingPhase, BookingReducer, BookingState, CityCode, DepartureId,
    DepartureTime, Money, SERVICE_FEE, SearchCriteria, SeatNumber, ServiceClass,
};
use busflow_core::reducer::Reducer;
use busflow_testing::mocks::FixedClock;
use chrono::NaiveDate;
use proptest::prelude::*;
use std::sync::Arc;

fn seat_selection(passengers: u8, lower: Vec<u8>, upper: Vec<u8>) -> (MockHarness, BookingState) {
    let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let h = MockHarness::new(
        Arc::new(FixedClock::at_date(today)),
        ScriptedAvailability::new(lima_arequipa_departures()).with_occupancy(lower, upper),
    );

    let reducer = BookingReducer::new();
    let mut state = BookingState::new();
    for action in [
        BookingAction::Search {
            criteria: SearchCriteria {
                origin: CityCode::new("lima"),
                destination: CityCode::new("arequipa"),
                date: today,
                passenger_count: passengers,
            },
        },
        BookingAction::DeparturesLoaded {
            search: 1,
            departures: lima_arequipa_departures(),
        },
        BookingAction::SelectDeparture {
            departure_id: DepartureId::new("dep-2"),
        },
    ] {
        let _ = reducer.reduce(&mut state, action, &h.env);
    }
    assert_eq!(state.phase, BookingPhase::SeatSelection);
    (h, state)
}

fn service_class() -> impl Strategy<Value = ServiceClass> {
    prop_oneof![
        Just(ServiceClass::Economy),
        Just(ServiceClass::Vip),
        Just(ServiceClass::SleeperBus),
    ]
}

prop_compose! {
    fn summary()(
        origin in "[a-z]{3,10}",
        destination in "[a-z]{3,10}",
        day in 0u32..2000,
        service_class in service_class(),
        hour in 0u32..24,
        minute in 0u32..60,
        total in 0u32..100_000,
        name in "\\PC{0,40}",
    ) -> ShareSummary {
        ShareSummary {
            origin: CityCode::new(origin),
            destination: CityCode::new(destination),
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(u64::from(day)),
            service_class,
            time: DepartureTime::from_hm(hour, minute).unwrap(),
            total: Money::new(total),
            primary_passenger_name: name,
        }
    }
}

proptest! {
    #[test]
    fn seat_selection_invariants_hold(
        passengers in 1u8..=6,
        lower in proptest::collection::vec(1u8..=20, 0..10),
        upper in proptest::collection::vec(1u8..=20, 0..10),
        toggles in proptest::collection::vec(0u8..=45, 0..40),
    ) {
        let (h, mut state) = seat_selection(passengers, lower, upper);
        let reducer = BookingReducer::new();

        for seat in toggles {
            let _ = reducer.reduce(&mut state, BookingAction::ToggleSeat { seat: SeatNumber::new(seat) }, &h.env);

            let selected = state.booking.selected_seats();
            prop_assert!(selected.len() <= usize::from(passengers));
            for seat in selected {
                prop_assert!((1..=40).contains(&seat.get()));
                prop_assert!(!state.seat_map.is_occupied(*seat));
            }
            let count = u32::try_from(selected.len()).unwrap();
            prop_assert_eq!(state.booking.total_fare(), Money::new(160).times(count));
            prop_assert_eq!(state.booking.grand_total(), state.booking.total_fare().plus(SERVICE_FEE));
            prop_assert_eq!(state.phase, BookingPhase::SeatSelection);
        }
    }

    #[test]
    fn share_token_decodes_to_the_encoded_summary(summary in summary()) {
        match share::encode(&summary) {
            Ok(token) => {
                prop_assert!(token.as_str().chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
                prop_assert_eq!(share::decode(token.as_str()), Ok(summary));
            },
            Err(error) => {
                prop_assert!(summary.total < SERVICE_FEE);
                prop_assert!(matches!(error, DecodeError::Malformed { .. }), "unexpected {:?}", error);
            },
        }
    }

    #[test]
    fn arbitrary_tokens_never_panic(token in "\\PC{0,200}") {
        match share::decode(&token) {
            Ok(summary) => prop_assert!(summary.total >= SERVICE_FEE),
            Err(DecodeError::Malformed { .. } | DecodeError::UnsupportedVersion { .. }) => {},
        }
    }
}
