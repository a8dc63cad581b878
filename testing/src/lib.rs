//! # Busflow Testing
//!
//! Testing utilities for busflow reducers.
//!
//! This crate provides:
//! - Mock implementations of core environment traits
//! - A Given-When-Then harness for reducers ([`ReducerTest`])
//! - Assertion helpers for returned effects
//!
//! ## Example
//!
//! ```ignore
//! use busflow_testing::{ReducerTest, assertions};
//!
//! ReducerTest::new(BookingReducer::new())
//!     .with_env(test_environment())
//!     .given_state(BookingState::default())
//!     .when_action(BookingAction::NewSearch)
//!     .then_state(|s| assert_eq!(s.phase, BookingPhase::Search))
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use busflow_core::environment::Clock;
use chrono::{DateTime, Utc};

mod reducer_test;

pub use reducer_test::{ReducerTest, assertions};

/// Mock implementations of environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};
    use chrono::{NaiveDate, TimeZone};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use busflow_testing::mocks::FixedClock;
    /// use busflow_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Clock fixed at midnight UTC of `date`
        #[must_use]
        pub fn at_date(date: NaiveDate) -> Self {
            Self::new(Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN)))
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, NaiveDate};

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        assert_eq!(clock.now(), clock.now());
        assert_eq!(clock.now().year(), 2025);
    }

    #[test]
    fn test_clock_at_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 14);
        assert!(date.is_some());
        if let Some(date) = date {
            let clock = FixedClock::at_date(date);
            assert_eq!(clock.now().date_naive(), date);
        }
    }
}
