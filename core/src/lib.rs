//! # EventHub Core
//!
//! Core traits and types shared by every EventHub store.
//!
//! A store in EventHub is a small state machine:
//!
//! - **State**: the in-memory slice a store owns (events, enrollments, notifications, ...)
//! - **Action**: every input to the store, both commands (`FetchEvents`) and the
//!   outcomes reported back by effects (`EventsLoaded`, `OperationFailed`)
//! - **Reducer**: `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: a description of I/O to run (backend calls, simulated latency)
//! - **Environment**: injected dependencies (backend client, clock, id generator)
//!
//! The runtime crate executes effects and feeds their outcome actions back into
//! the reducer; this crate only defines the vocabulary.
//!
//! ## Example
//!
//! ```ignore
//! use eventhub_core::{effect::Effect, reducer::Reducer, SmallVec, smallvec};
//!
//! impl Reducer for NotificationReducer {
//!     type State = NotificationState;
//!     type Action = NotificationAction;
//!     type Environment = NotificationEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut NotificationState,
//!         action: NotificationAction,
//!         env: &NotificationEnvironment,
//!     ) -> SmallVec<[Effect<NotificationAction>; 4]> {
//!         match action {
//!             NotificationAction::MarkAllAsRead { .. } => smallvec![/* ... */],
//!             _ => SmallVec::new(),
//!         }
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use smallvec::{SmallVec, smallvec};

/// Declarative helpers for building effects
pub mod effect_macros;

/// Reducer module - the core trait for store logic
///
/// Reducers are deterministic: `(State, Action, Environment) → (State, Effects)`.
/// All I/O is described by the returned effects and executed by the runtime.
pub mod reducer {
    use super::SmallVec;
    use super::effect::Effect;

    /// The Reducer trait - core abstraction for store logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The slice of state this reducer owns
    /// - `Action`: Commands plus the outcome actions produced by its effects
    /// - `Environment`: The injected dependencies this reducer needs
    ///
    /// # Example
    ///
    /// ```ignore
    /// impl Reducer for AuthReducer {
    ///     type State = AuthState;
    ///     type Action = AuthAction;
    ///     type Environment = AuthEnvironment;
    ///
    ///     fn reduce(
    ///         &self,
    ///         state: &mut AuthState,
    ///         action: AuthAction,
    ///         env: &AuthEnvironment,
    ///     ) -> SmallVec<[Effect<AuthAction>; 4]> {
    ///         match action {
    ///             AuthAction::Logout => {
    ///                 state.user = None;
    ///                 state.is_authenticated = false;
    ///                 SmallVec::new()
    ///             }
    ///             _ => SmallVec::new(),
    ///         }
    ///     }
    /// }
    /// ```
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// Updates `state` in place and returns the effects the runtime
        /// should execute. Must not perform I/O itself.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - side effect descriptions
///
/// Effects are values returned from reducers. The runtime executes them and
/// feeds any produced action back into the same store.
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;
    use std::time::Duration;

    /// Effect type - describes a side effect to be executed
    ///
    /// # Type Parameters
    ///
    /// - `Action`: The action type that effects can produce (feedback loop)
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects concurrently
        Parallel(Vec<Effect<Action>>),

        /// Run effects one after another
        Sequential(Vec<Effect<Action>>),

        /// Dispatch an action after a delay
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if `Some`, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> std::fmt::Debug for Effect<Action>
    where
        Action: std::fmt::Debug,
    {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
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

        /// Wrap an already-known action so it flows back through the reducer
        ///
        /// Used when a command is rejected before any I/O happens: the outcome
        /// still travels the same path as a remote result.
        #[must_use]
        pub fn send(action: Action) -> Effect<Action>
        where
            Action: Send + 'static,
        {
            Effect::Future(Box::pin(async move { Some(action) }))
        }

        /// Returns `true` for [`Effect::None`]
        #[must_use]
        pub const fn is_none(&self) -> bool {
            matches!(self, Effect::None)
        }
    }
}

/// Environment module - dependency injection traits
///
/// External dependencies are abstracted behind traits and injected through
/// each store's environment struct.
pub mod environment {
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    ///
    /// # Examples
    ///
    /// ```
    /// use eventhub_core::environment::{Clock, SystemClock};
    ///
    /// let clock = SystemClock;
    /// let now = clock.now();
    /// assert!(now.timestamp() > 0);
    /// ```
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}
