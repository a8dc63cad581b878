//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when reducers build `Effect` values,
//! particularly delayed and cancellable ones.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use busflow_core::async_effect;
///
/// async_effect! {
///     let outcome = notifier.notify_booking(message).await;
///     Some(BookingAction::NotificationFinished { outcome })
/// }
/// ```
#[macro_export]
macro_rules! async_effect {
    ($($body:tt)*) => {
        $crate::effect::Effect::Future(
            ::std::boxed::Box::pin(async move { $($body)* })
        )
    };
}

/// Create an `Effect::Delay` for scheduling delayed actions
///
/// # Example
///
/// ```rust,ignore
/// use busflow_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_millis(800),
///     action: BookingAction::DeparturesLoaded { search, departures }
/// }
/// ```
#[macro_export]
macro_rules! delay {
    (
        duration: $duration:expr,
        action: $action:expr
    ) => {
        $crate::effect::Effect::Delay {
            duration: $duration,
            action: ::std::boxed::Box::new($action),
        }
    };
}

/// Create an `Effect::Cancellable` wrapping another effect
///
/// # Example
///
/// ```rust,ignore
/// use busflow_core::{cancellable, delay};
///
/// cancellable! {
///     id: countdown_effect_id(),
///     effect: delay! {
///         duration: Duration::from_secs(1),
///         action: BookingAction::CountdownTick { generation }
///     }
/// }
/// ```
#[macro_export]
macro_rules! cancellable {
    (
        id: $id:expr,
        effect: $effect:expr
    ) => {
        $crate::effect::Effect::Cancellable {
            id: $id,
            effect: ::std::boxed::Box::new($effect),
        }
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::{Effect, EffectId};
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        AsyncResult { value: i32 },
        TimeoutExpired,
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::AsyncResult { value: 42 })
        };

        let Effect::Future(fut) = effect else {
            unreachable!("async_effect! must build a future effect");
        };
        assert_eq!(
            tokio_test::block_on(fut),
            Some(TestAction::AsyncResult { value: 42 })
        );
    }

    #[test]
    fn test_delay_macro() {
        let effect = delay! {
            duration: Duration::from_secs(30),
            action: TestAction::TimeoutExpired
        };

        assert!(matches!(
            effect,
            Effect::Delay { duration, ref action }
                if duration == Duration::from_secs(30) && **action == TestAction::TimeoutExpired
        ));
    }

    #[test]
    fn test_cancellable_macro() {
        let effect = cancellable! {
            id: EffectId::new("timer"),
            effect: delay! {
                duration: Duration::from_secs(1),
                action: TestAction::TimeoutExpired
            }
        };

        assert!(matches!(
            effect,
            Effect::Cancellable { ref id, ref effect }
                if id.as_str() == "timer" && matches!(**effect, Effect::Delay { .. })
        ));
    }
}
