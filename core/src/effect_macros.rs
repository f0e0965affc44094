//! Declarative macros for ergonomic effect construction
//!
//! Store reducers mostly return a single future that calls the backend and
//! maps the result to an outcome action. These macros cut the boxing noise.

/// Create an `Effect::Future` from an async block
///
/// # Example
///
/// ```rust,ignore
/// use eventhub_core::async_effect;
///
/// async_effect! {
///     let events = backend.list_events().await;
///     Some(EventAction::EventsLoaded { correlation_id, events })
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
/// use eventhub_core::delay;
/// use std::time::Duration;
///
/// delay! {
///     duration: Duration::from_secs(3),
///     action: EventAction::DismissError
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

/// Create an `Effect::Future` that resolves a fallible operation into one of
/// two actions
///
/// The `ok` arm receives the success value, the `err` arm the error.
///
/// # Example
///
/// ```rust,ignore
/// use eventhub_core::try_effect;
///
/// try_effect! {
///     run: backend.list_events(),
///     ok: |events| EventAction::EventsLoaded { correlation_id, events },
///     err: |error| EventAction::OperationFailed { correlation_id, error: error.into() }
/// }
/// ```
#[macro_export]
macro_rules! try_effect {
    (
        run: $operation:expr,
        ok: |$ok_param:ident| $ok_body:expr,
        err: |$err_param:ident| $err_body:expr
    ) => {
        $crate::effect::Effect::Future(::std::boxed::Box::pin(async move {
            match $operation.await {
                ::std::result::Result::Ok($ok_param) => ::std::option::Option::Some($ok_body),
                ::std::result::Result::Err($err_param) => ::std::option::Option::Some($err_body),
            }
        }))
    };
}

#[cfg(test)]
mod tests {
    use crate::effect::Effect;
    use std::time::Duration;

    #[derive(Clone, Debug, PartialEq)]
    enum TestAction {
        Loaded { value: i32 },
        Failed { error: String },
        TimeoutExpired,
    }

    #[test]
    fn test_async_effect_macro() {
        let effect = async_effect! {
            Some(TestAction::Loaded { value: 42 })
        };

        assert!(matches!(effect, Effect::Future(_)));
    }

    #[test]
    fn test_delay_macro() {
        let effect = delay! {
            duration: Duration::from_secs(30),
            action: TestAction::TimeoutExpired
        };

        assert!(matches!(effect, Effect::Delay { .. }));
    }

    #[test]
    fn test_try_effect_maps_error_arm() {
        let effect = try_effect! {
            run: async { Err::<i32, String>("backend offline".to_string()) },
            ok: |value| TestAction::Loaded { value },
            err: |error| TestAction::Failed { error }
        };

        let Effect::Future(fut) = effect else {
            unreachable!("try_effect! always builds a future");
        };
        assert_eq!(
            tokio_test::block_on(fut),
            Some(TestAction::Failed {
                error: "backend offline".to_string()
            })
        );
    }
}
