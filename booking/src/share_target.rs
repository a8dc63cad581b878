//! Where share-link messages go.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Share collaborator result
pub type ShareResult = Result<(), ShareError>;

/// Failure to hand a message to the share target
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ShareError {
    /// The user closed the share sheet
    #[error("Share cancelled")]
    Cancelled,

    /// Anything else
    #[error("Share failed: {0}")]
    Failed(String),
}

/// Destination for share-link messages (share sheet, chat app, stdout)
pub trait ShareTarget: Send + Sync {
    /// Hands the message over
    ///
    /// # Errors
    ///
    /// Returns [`ShareError`] when the message could not be delivered.
    fn share(&self, text: String) -> Pin<Box<dyn Future<Output = ShareResult> + Send>>;
}

/// Prints messages to stdout
#[derive(Clone, Debug, Default)]
pub struct ConsoleShareTarget;

impl ConsoleShareTarget {
    /// Creates a console target
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn ShareTarget> {
        Arc::new(Self::new())
    }
}

impl ShareTarget for ConsoleShareTarget {
    fn share(&self, text: String) -> Pin<Box<dyn Future<Output = ShareResult> + Send>> {
        Box::pin(async move {
            tracing::info!(chars = text.len(), "Sharing payment link");
            println!("\n{text}\n");
            Ok(())
        })
    }
}
