//! Collaborators injected into the booking reducer.

use crate::availability::{Availability, RandomAvailability};
use crate::config::Config;
use crate::notifier::{HttpNotifier, LogNotifier, NotifyError, Notifier};
use crate::share_target::{ConsoleShareTarget, ShareTarget};
use crate::ticket::{CodeGenerator, RandomCodes};
use busflow_core::environment::{Clock, SystemClock};
use std::sync::Arc;
use std::time::Duration;

/// Environment dependencies for the booking reducer
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Today's date for search validation; timestamps
    pub clock: Arc<dyn Clock>,
    /// Departures and seat occupancy
    pub availability: Arc<dyn Availability>,
    /// Ticket codes and payment ids
    pub codes: Arc<dyn CodeGenerator>,
    /// Operator notifications
    pub notifier: Arc<dyn Notifier>,
    /// Share-link delivery
    pub share_target: Arc<dyn ShareTarget>,
    /// Simulated search latency
    pub search_delay: Duration,
    /// Base of generated share links
    pub share_base_url: String,
}

impl BookingEnvironment {
    /// Creates an environment from its parts
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        availability: Arc<dyn Availability>,
        codes: Arc<dyn CodeGenerator>,
        notifier: Arc<dyn Notifier>,
        share_target: Arc<dyn ShareTarget>,
    ) -> Self {
        Self {
            clock,
            availability,
            codes,
            notifier,
            share_target,
            search_delay: Duration::ZERO,
            share_base_url: crate::config::DEFAULT_SHARE_BASE_URL.to_string(),
        }
    }

    /// Production wiring from configuration
    ///
    /// Uses [`HttpNotifier`] when an endpoint is configured, [`LogNotifier`]
    /// otherwise. A configured seed makes availability and codes
    /// reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] if the HTTP notifier cannot be built.
    pub fn from_config(config: &Config) -> Result<Self, NotifyError> {
        let notifier: Arc<dyn Notifier> = match &config.notifier.endpoint {
            Some(endpoint) => Arc::new(HttpNotifier::new(
                endpoint.clone(),
                config.notifier.chat_id.clone(),
                Duration::from_secs(config.notifier.timeout_secs),
            )?),
            None => LogNotifier::shared(),
        };

        let (availability, codes): (Arc<dyn Availability>, Arc<dyn CodeGenerator>) =
            match config.booking.seed {
                Some(seed) => (
                    Arc::new(RandomAvailability::seeded(seed)),
                    Arc::new(RandomCodes::seeded(seed.wrapping_add(1))),
                ),
                None => (Arc::new(RandomAvailability::new()), Arc::new(RandomCodes::new())),
            };

        Ok(Self::new(
            Arc::new(SystemClock),
            availability,
            codes,
            notifier,
            ConsoleShareTarget::shared(),
        )
        .with_search_delay(Duration::from_millis(config.booking.search_delay_ms))
        .with_share_base_url(config.share.base_url.clone()))
    }

    /// Overrides the search latency
    #[must_use]
    pub fn with_search_delay(mut self, delay: Duration) -> Self {
        self.search_delay = delay;
        self
    }

    /// Overrides the share-link base URL
    #[must_use]
    pub fn with_share_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.share_base_url = base_url.into();
        self
    }
}
