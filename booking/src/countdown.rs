//! Payment countdown for bookings resumed from a share link.
//!
//! The countdown itself is plain state; time passes through a chain of
//! one-second cancellable delay effects, each feeding a tick back into the
//! reducer. All ticks share one effect id so a session never runs two timers.

use busflow_core::effect::{Effect, EffectId};
use busflow_core::{cancellable, delay};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Seconds on the clock when a shared link is opened (14:59)
pub const COUNTDOWN_START_SECS: u32 = 899;

/// Window advertised to the payer
pub const ADVERTISED_WINDOW_MINUTES: u32 = 15;

/// Interval between ticks
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Effect id shared by every countdown tick
#[must_use]
pub fn countdown_effect_id() -> EffectId {
    EffectId::new("payment-countdown")
}

/// Result of one tick
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CountdownStatus {
    /// Time left; schedule the next tick
    Running,
    /// Reached zero
    Expired,
}

/// Remaining payment time of a resumed booking
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Countdown {
    generation: u64,
    remaining_secs: u32,
}

impl Countdown {
    /// Full countdown bound to a booking generation
    #[must_use]
    pub const fn start(generation: u64) -> Self {
        Self {
            generation,
            remaining_secs: COUNTDOWN_START_SECS,
        }
    }

    /// Booking generation this countdown belongs to
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Seconds left
    #[must_use]
    pub const fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Removes one second
    pub const fn tick(&mut self) -> CountdownStatus {
        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            CountdownStatus::Expired
        } else {
            CountdownStatus::Running
        }
    }
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.remaining_secs / 60, self.remaining_secs % 60)
    }
}

/// Schedules `action` one tick from now under the countdown id
pub fn schedule_tick<A>(action: A) -> Effect<A> {
    cancellable! {
        id: countdown_effect_id(),
        effect: delay! {
            duration: TICK_INTERVAL,
            action: action
        }
    }
}

/// Stops the running tick chain, if any
#[must_use]
pub fn cancel<A>() -> Effect<A> {
    Effect::Cancel(countdown_effect_id())
}
