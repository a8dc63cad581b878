//! Busflow booking - intercity bus tickets as a reducer
//!
//! A traveller searches a route, picks a departure and seats, fills in the
//! passengers and pays. Instead of paying, they can hand a share link to
//! someone else, who opens it and pays within a fixed window.
//!
//! # Architecture
//!
//! ```text
//!   Session ──send──▶ Store ──reduce──▶ BookingReducer
//!                       ▲                     │
//!                       │                  effects
//!                       │                     ▼
//!                       └──── events ─── Delay / Future / Cancellable
//!                                         (search latency, countdown ticks,
//!                                          operator notification, sharing)
//! ```
//!
//! Everything with a side effect sits behind a trait in
//! [`BookingEnvironment`]: availability, code generation, the clock, the
//! operator notifier and the share target. [`mocks`] provides deterministic
//! versions for tests and demos.
//!
//! # Share links
//!
//! A link carries `pay` (an informational payment id) and `data`, a
//! URL-safe base64 JSON summary of the trip (see [`share`]). Opening it
//! rebuilds a payment-ready booking and starts a 14:59 countdown; when the
//! countdown runs out the booking is discarded.
//!
//! # Example
//!
//! ```ignore
//! let session = Session::new(BookingEnvironment::from_config(&Config::from_env())?);
//! let departures = session.search(criteria).await?;
//! session.select_departure(departures[0].id.clone()).await?;
//! session.toggle_seat(SeatNumber::new(5)).await?;
//! ```

pub mod actions;
pub mod availability;
pub mod catalog;
pub mod config;
pub mod countdown;
pub mod environment;
pub mod error;
pub mod metrics;
pub mod mocks;
pub mod notifier;
pub mod reducer;
pub mod seat_map;
pub mod session;
pub mod share;
pub mod share_target;
pub mod state;
pub mod ticket;
pub mod types;

pub use actions::BookingAction;
pub use config::Config;
pub use environment::BookingEnvironment;
pub use error::BookingError;
pub use reducer::BookingReducer;
pub use session::{BookingStore, Paid, Session, SessionError};
pub use share::{LinkParams, ShareLink, ShareSummary};
pub use state::{BookingPhase, BookingState, Confirmation, Notice};
pub use types::*;
