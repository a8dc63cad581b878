//! Booking notifications to the operator's chat channel.
//!
//! Notifications are best effort: the booking is confirmed before the
//! message is sent, and a failure is only logged and recorded.

use crate::catalog;
use crate::state::Booking;
use crate::ticket::TicketCode;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Serialize;
use std::fmt::Write as _;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Notifier result
pub type NotifyResult = Result<(), NotifyError>;

/// Notification failure
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum NotifyError {
    /// Request could not be sent or timed out
    #[error("Notification transport failed: {0}")]
    Transport(String),

    /// Endpoint answered with a non-success status
    #[error("Notification rejected (status {status}): {body}")]
    Rejected {
        /// HTTP status code
        status: u16,
        /// Response body
        body: String,
    },
}

/// Sink for booking notifications
pub trait Notifier: Send + Sync {
    /// Sends a formatted booking message
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the message was not accepted.
    fn notify_booking(&self, message: String) -> Pin<Box<dyn Future<Output = NotifyResult> + Send>>;
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

/// Posts messages as JSON to a chat bot endpoint
///
/// Body: `{"chat_id": ..., "text": ..., "parse_mode": "Markdown"}`.
#[derive(Clone, Debug)]
pub struct HttpNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl HttpNotifier {
    /// Creates a notifier with a request timeout
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError::Transport`] if the HTTP client cannot be built.
    pub fn new(
        endpoint: impl Into<String>,
        chat_id: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            chat_id: chat_id.into(),
        })
    }

    async fn post(client: Client, endpoint: String, chat_id: String, text: String) -> NotifyResult {
        let body = SendMessage {
            chat_id: &chat_id,
            text: &text,
            parse_mode: "Markdown",
        };

        let response = client
            .post(&endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(status = status.as_u16(), "Booking notification delivered");
            Ok(())
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(NotifyError::Rejected {
                status: status.as_u16(),
                body,
            })
        }
    }
}

impl Notifier for HttpNotifier {
    fn notify_booking(&self, message: String) -> Pin<Box<dyn Future<Output = NotifyResult> + Send>> {
        Box::pin(Self::post(
            self.client.clone(),
            self.endpoint.clone(),
            self.chat_id.clone(),
            message,
        ))
    }
}

/// Logs messages instead of sending them; used when no endpoint is configured
#[derive(Clone, Debug, Default)]
pub struct LogNotifier;

impl LogNotifier {
    /// Creates a log notifier
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared() -> Arc<dyn Notifier> {
        Arc::new(Self::new())
    }
}

impl Notifier for LogNotifier {
    fn notify_booking(&self, message: String) -> Pin<Box<dyn Future<Output = NotifyResult> + Send>> {
        Box::pin(async move {
            tracing::info!(%message, "Booking notification (not sent)");
            Ok(())
        })
    }
}

/// Escapes the characters legacy chat Markdown treats as markup
#[must_use]
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Operator message for a confirmed booking
///
/// Contact block, trip block, passenger list and booking timestamp. Missing
/// parts of a partial booking are skipped. User-entered text and unknown
/// city codes are escaped.
#[must_use]
pub fn booking_message(booking: &Booking, ticket: &TicketCode, booked_at: DateTime<Utc>) -> String {
    let mut out = String::from("*NEW BOOKING*\n");

    if let Some(contact) = booking.contact() {
        let _ = write!(
            out,
            "\n*Contact*\nName: {}\nEmail: {}\nPhone: {}\nDocument: {}\nBirth date: {}\n",
            escape_markdown(&contact.full_name),
            escape_markdown(&contact.email),
            escape_markdown(&contact.phone),
            escape_markdown(&contact.document_number),
            escape_markdown(&contact.birth_date),
        );
    }

    out.push_str("\n*Trip*\n");
    if let Some(criteria) = booking.criteria() {
        let _ = writeln!(
            out,
            "Route: {} → {}\nDate: {}",
            escape_markdown(catalog::display_name(&criteria.origin)),
            escape_markdown(catalog::display_name(&criteria.destination)),
            criteria.date.format("%d/%m/%Y"),
        );
    }
    if let Some(departure) = booking.departure() {
        let _ = writeln!(out, "Time: {}\nService: {}", departure.time, departure.service_class);
    }
    let _ = writeln!(out, "Ticket: {ticket}\nTotal: {}", booking.grand_total());

    out.push_str("\n*Passengers*\n");
    for passenger in booking.passengers() {
        let _ = writeln!(out, "• {} - Seat {}", escape_markdown(&passenger.display_name()), passenger.seat);
    }

    let _ = write!(out, "\nBooked at: {}", booked_at.format("%d/%m/%Y %H:%M UTC"));
    out
}
