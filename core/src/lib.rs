//! # Busflow Core
//!
//! Core traits and types for the busflow booking engine.
//!
//! Every piece of booking behaviour is written as a reducer: a pure function
//! `(State, Action, Environment) → (State, Effects)`. Side effects are returned
//! as [`Effect`](effect::Effect) descriptions and executed by the runtime crate.
//!
//! ## Core Concepts
//!
//! - **State**: Owned, cloneable domain state for one session
//! - **Action**: All inputs to a reducer (user commands and effect results)
//! - **Reducer**: Validates an action, mutates state, returns effects
//! - **Effect**: Description of async work (delays, futures, cancellation)
//! - **Environment**: Injected collaborators behind traits
//!
//! ## Example
//!
//! ```ignore
//! use busflow_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! impl Reducer for CounterReducer {
//!     type State = CounterState;
//!     type Action = CounterAction;
//!     type Environment = CounterEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut CounterState,
//!         action: CounterAction,
//!         _env: &CounterEnvironment,
//!     ) -> SmallVec<[Effect<CounterAction>; 4]> {
//!         state.count += 1;
//!         smallvec![Effect::None]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{SmallVec, smallvec};

/// Declarative macros for building effects
pub mod effect_macros;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`.
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        ///
        /// Most actions produce at most a handful of effects, so the return
        /// type keeps up to four inline without allocating.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable and cancellable.
pub mod effect {
    use std::fmt;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    /// Identifier for a cancellable effect
    ///
    /// The runtime keeps at most one running effect per id: scheduling a new
    /// cancellable effect under an id that is still running aborts the older one.
    #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub struct EffectId(Arc<str>);

    impl EffectId {
        /// Create an effect id from any string-like value
        #[must_use]
        pub fn new(id: impl AsRef<str>) -> Self {
            Self(Arc::from(id.as_ref()))
        }

        /// The id as a string slice
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for EffectId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str(&self.0)
        }
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action (for timeouts, ticks, simulated latency)
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Run an effect that can later be aborted with [`Effect::Cancel`]
        ///
        /// Only `Delay` and `Future` effects hold on to a task long enough to be
        /// worth cancelling. Other effects are executed as-is.
        Cancellable {
            /// Identifier used to cancel the effect
            id: EffectId,
            /// The wrapped effect
            effect: Box<Effect<Action>>,
        },

        /// Abort the running cancellable effect with this id, if any
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> fmt::Debug for Effect<Action>
    where
        Action: fmt::Debug,
    {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Make this effect cancellable under `id`
        #[must_use]
        pub fn cancellable(self, id: EffectId) -> Effect<Action> {
            Effect::Cancellable {
                id,
                effect: Box::new(self),
            }
        }

        /// True for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// Production code uses [`SystemClock`]; tests inject a fixed clock so
    /// date checks and timestamps are deterministic.
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Wall-clock time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::{Effect, EffectId};
    use super::environment::{Clock, SystemClock};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq)]
    enum TestAction {
        Tick,
    }

    #[test]
    fn effect_id_display_and_equality() {
        let a = EffectId::new("countdown");
        let b = EffectId::new(String::from("countdown"));
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "countdown");
        assert_eq!(a.as_str(), "countdown");
    }

    #[test]
    fn cancellable_wraps_inner_effect() {
        let effect = Effect::Delay {
            duration: Duration::from_secs(1),
            action: Box::new(TestAction::Tick),
        }
        .cancellable(EffectId::new("tick"));

        match effect {
            Effect::Cancellable { id, effect } => {
                assert_eq!(id.as_str(), "tick");
                assert!(matches!(*effect, Effect::Delay { .. }));
            },
            other => unreachable!("unexpected effect {other:?}"),
        }
    }

    #[test]
    fn debug_output_names_variants() {
        let cancel: Effect<TestAction> = Effect::Cancel(EffectId::new("tick"));
        assert_eq!(format!("{cancel:?}"), "Effect::Cancel(EffectId(\"tick\"))");

        let future: Effect<TestAction> = Effect::Future(Box::pin(async { None }));
        assert_eq!(format!("{future:?}"), "Effect::Future(<future>)");
    }

    #[test]
    fn merge_and_chain_build_composites() {
        let merged: Effect<TestAction> = Effect::merge(vec![Effect::None, Effect::None]);
        assert!(matches!(merged, Effect::Parallel(ref v) if v.len() == 2));

        let chained: Effect<TestAction> = Effect::chain(vec![Effect::None]);
        assert!(matches!(chained, Effect::Sequential(ref v) if v.len() == 1));
        assert!(Effect::<TestAction>::None.is_none());
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let first = clock.now();
        let second = clock.now();
        assert!(second >= first);
    }
}
