//! One booking session driven through a [`Store`].
//!
//! [`Session`] turns the action/state protocol of the reducer into plain
//! async calls: a rejected command comes back as
//! [`SessionError::Rejected`] instead of a field to inspect.

use crate::actions::BookingAction;
use crate::environment::BookingEnvironment;
use crate::error::BookingError;
use crate::reducer::BookingReducer;
use crate::share::{LinkParams, ShareLink};
use crate::state::{BookingPhase, BookingState, Confirmation, Notice};
use crate::types::{ContactInfo, Departure, DepartureId, PassengerForm, SearchCriteria, SeatNumber};
use busflow_runtime::{EffectHandle, Store, StoreError};
use std::time::Duration;
use thiserror::Error;

/// Store running the booking reducer
pub type BookingStore = Store<BookingState, BookingAction, BookingEnvironment, BookingReducer>;

/// Errors returned by [`Session`] calls
#[derive(Error, Debug)]
pub enum SessionError {
    /// The reducer refused the command
    #[error(transparent)]
    Rejected(#[from] BookingError),

    /// The store could not take the command
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The command was accepted but left nothing to return
    #[error("Command accepted but no {0} was produced")]
    MissingOutcome(&'static str),
}

/// Result of a successful payment
pub struct Paid {
    /// Issued ticket; the notification status is still pending
    pub confirmation: Confirmation,
    /// Completes once the operator notification has been reported back
    pub notification: EffectHandle,
}

/// A single user's booking session
#[derive(Clone)]
pub struct Session {
    store: BookingStore,
}

impl Session {
    /// Fresh session at the search form
    #[must_use]
    pub fn new(env: BookingEnvironment) -> Self {
        Self {
            store: Store::new(BookingState::new(), BookingReducer::new(), env),
        }
    }

    /// Session started from an incoming link
    ///
    /// A link without `pay` and `data` parameters starts a normal session.
    /// A link whose data cannot be read also starts a normal session, with
    /// [`Notice::InvalidLink`] set.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if the store rejects the action.
    pub async fn open(env: BookingEnvironment, link: &str) -> Result<Self, SessionError> {
        let session = Self::new(env);

        let Some(params) = LinkParams::parse(link) else {
            tracing::debug!("No share parameters in link, starting fresh");
            return Ok(session);
        };

        session
            .dispatch(BookingAction::OpenSharedLink {
                payment_id: params.payment_id,
                data: params.data,
            })
            .await?;
        Ok(session)
    }

    /// Sends a command and reports its rejection, if any
    ///
    /// Only commands touch `last_error`, so reading it right after the send
    /// observes this command's outcome.
    async fn dispatch(&self, action: BookingAction) -> Result<EffectHandle, SessionError> {
        let handle = self.store.send(action).await?;
        match self.store.state(|s| s.last_error.clone()).await {
            Some(error) => Err(error.into()),
            None => Ok(handle),
        }
    }

    /// Searches and waits for the results
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Rejected`] for invalid criteria or when not at
    /// the search form.
    pub async fn search(&self, criteria: SearchCriteria) -> Result<Vec<Departure>, SessionError> {
        let mut handle = self.dispatch(BookingAction::Search { criteria }).await?;
        handle.wait().await;

        let (phase, departures) = self.store.state(|s| (s.phase, s.departures.clone())).await;
        if phase == BookingPhase::Results {
            Ok(departures)
        } else {
            Err(SessionError::MissingOutcome("search results"))
        }
    }

    /// Opens a departure's seat map
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Rejected`] for unknown departures.
    pub async fn select_departure(&self, departure_id: DepartureId) -> Result<(), SessionError> {
        self.dispatch(BookingAction::SelectDeparture { departure_id }).await?;
        Ok(())
    }

    /// Selects or releases a seat
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Rejected`] for occupied, missing or excess seats.
    pub async fn toggle_seat(&self, seat: SeatNumber) -> Result<(), SessionError> {
        self.dispatch(BookingAction::ToggleSeat { seat }).await?;
        Ok(())
    }

    /// Moves to the passenger forms
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Rejected`] unless every passenger has a seat.
    pub async fn continue_to_passengers(&self) -> Result<(), SessionError> {
        self.dispatch(BookingAction::ContinueToPassengers).await?;
        Ok(())
    }

    /// Replaces one passenger form
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Rejected`] for an index without a seat.
    pub async fn update_passenger(&self, index: usize, form: PassengerForm) -> Result<(), SessionError> {
        self.dispatch(BookingAction::UpdatePassenger { index, form }).await?;
        Ok(())
    }

    /// Moves to payment
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Rejected`] naming the first incomplete form.
    pub async fn continue_to_payment(&self) -> Result<(), SessionError> {
        self.dispatch(BookingAction::ContinueToPayment).await?;
        Ok(())
    }

    /// Pays and returns the ticket without waiting for the notification
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Rejected`] for incomplete contact details or
    /// when the booking is not at payment (for example after expiry).
    pub async fn pay(&self, contact: ContactInfo) -> Result<Paid, SessionError> {
        let notification = self.dispatch(BookingAction::Pay { contact }).await?;
        let confirmation = self
            .store
            .state(|s| s.confirmation.clone())
            .await
            .ok_or(SessionError::MissingOutcome("confirmation"))?;

        Ok(Paid {
            confirmation,
            notification,
        })
    }

    /// Builds a share link and waits for it to be handed over
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Rejected`] when the booking is not at payment.
    pub async fn share_link(&self) -> Result<ShareLink, SessionError> {
        let mut handle = self.dispatch(BookingAction::RequestShareLink).await?;
        handle.wait().await;

        self.store
            .state(|s| s.share_link.clone())
            .await
            .ok_or(SessionError::MissingOutcome("share link"))
    }

    /// Returns to the previous step
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Rejected`] at the search form, after payment
    /// and for shared bookings.
    pub async fn go_back(&self) -> Result<(), SessionError> {
        self.dispatch(BookingAction::GoBack).await?;
        Ok(())
    }

    /// Discards the booking
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] during shutdown.
    pub async fn new_search(&self) -> Result<(), SessionError> {
        self.dispatch(BookingAction::NewSearch).await?;
        Ok(())
    }

    /// Current phase
    pub async fn phase(&self) -> BookingPhase {
        self.store.state(|s| s.phase).await
    }

    /// Pending message for the user
    pub async fn notice(&self) -> Option<Notice> {
        self.store.state(|s| s.notice.clone()).await
    }

    /// Copy of the whole state
    pub async fn snapshot(&self) -> BookingState {
        self.store.state(Clone::clone).await
    }

    /// Underlying store
    #[must_use]
    pub const fn store(&self) -> &BookingStore {
        &self.store
    }

    /// Stops the store, cancelling the countdown
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Store`] if effects outlive `timeout`.
    pub async fn shutdown(&self, timeout: Duration) -> Result<(), SessionError> {
        self.store.shutdown(timeout).await?;
        Ok(())
    }
}
