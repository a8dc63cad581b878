//! Business metrics for the booking flow.
//!
//! No exporter is installed by this crate; without a recorder every call is
//! a no-op.
//!
//! # Exported Metrics
//!
//! ## Counters
//! - `busflow_searches_total` - Searches accepted
//! - `busflow_rejections_total{kind}` - Rejected commands by error kind
//! - `busflow_bookings_confirmed_total{source}` - Paid bookings (`direct` or `shared`)
//! - `busflow_revenue_total` - Sum of grand totals, in currency units
//! - `busflow_share_links_total{event}` - Share links `created`, `opened`, `invalid`, `expired`
//! - `busflow_notifications_total{status}` - Operator notifications `delivered` or `failed`
//!
//! ## Gauges
//! - `busflow_countdowns_active` - Resumed bookings waiting for payment

use metrics::{describe_counter, describe_gauge};

/// Registers metric descriptions; call once at startup.
pub fn register_booking_metrics() {
    describe_counter!("busflow_searches_total", "Searches accepted");
    describe_counter!("busflow_rejections_total", "Rejected booking commands by error kind");
    describe_counter!(
        "busflow_bookings_confirmed_total",
        "Paid bookings, direct or resumed from a share link"
    );
    describe_counter!("busflow_revenue_total", "Sum of paid totals in currency units");
    describe_counter!("busflow_share_links_total", "Share link lifecycle events");
    describe_counter!("busflow_notifications_total", "Operator notifications by outcome");
    describe_gauge!("busflow_countdowns_active", "Resumed bookings waiting for payment");

    tracing::info!("Booking metrics registered");
}

/// A search was accepted
pub fn record_search() {
    metrics::counter!("busflow_searches_total").increment(1);
}

/// A command was rejected
pub fn record_rejection(kind: &'static str) {
    metrics::counter!("busflow_rejections_total", "kind" => kind).increment(1);
}

/// A booking was paid
pub fn record_confirmed(shared: bool, total: u32) {
    let source = if shared { "shared" } else { "direct" };
    metrics::counter!("busflow_bookings_confirmed_total", "source" => source).increment(1);
    metrics::counter!("busflow_revenue_total").increment(u64::from(total));
}

/// Share link lifecycle event (`created`, `opened`, `invalid`, `expired`)
pub fn record_share_link(event: &'static str) {
    metrics::counter!("busflow_share_links_total", "event" => event).increment(1);
}

/// A payment countdown started
pub fn record_countdown_started() {
    metrics::gauge!("busflow_countdowns_active").increment(1.0);
}

/// A payment countdown ended (paid, expired or discarded)
pub fn record_countdown_stopped() {
    metrics::gauge!("busflow_countdowns_active").decrement(1.0);
}

/// An operator notification finished
pub fn record_notification(delivered: bool) {
    let status = if delivered { "delivered" } else { "failed" };
    metrics::counter!("busflow_notifications_total", "status" => status).increment(1);
}
