//! Conversions between typed endpoints and the untyped [`AnyEndpoint`] shape.
//!
//! Every crossing of the untyped boundary goes through the two helpers at the
//! bottom of this module, so a carrier is interpreted the same way whether it
//! is an endpoint request, an endpoint response, or a codec step:
//!
//! - `Nil` stands for the zero value of the expected type,
//! - a value of exactly the expected type is passed on,
//! - anything else fails with [`Error::TypeMismatch`].
//!
//! Errors produced by the wrapped callable are returned untouched.

use crate::{
    endpoint::{AnyEndpoint, Endpoint},
    error::{Error, Result},
    types::Value,
};
use std::any::Any;
use tracing::debug;

/// Exposes an untyped endpoint through a typed signature.
///
/// The response carrier is checked after the call; an error from `endpoint`
/// wins over any value it also produced.
pub fn adapt<Req, Resp>(endpoint: AnyEndpoint) -> Endpoint<Req, Resp>
where
    Req: Any + Send,
    Resp: Any + Default + Send,
{
    Endpoint::new(move |ctx, request: Req| {
        let response = endpoint.call(ctx, Value::new(request));
        async move { return_typed(response.await) }
    })
}

/// Wraps a typed endpoint so it can be registered with the untyped layer.
///
/// The request carrier is checked before the call; on a mismatch `endpoint`
/// is never invoked.
pub fn reverse_adapt<Req, Resp>(endpoint: Endpoint<Req, Resp>) -> AnyEndpoint
where
    Req: Any + Default + Send,
    Resp: Any + Send,
{
    Endpoint::new(move |ctx, request: Value| {
        let response = call_typed(request, |request: Req| Ok(endpoint.call(ctx, request)));
        async move { Ok(Value::new(response?.await?)) }
    })
}

/// [`adapt`] with the type parameters taken from an existing typed endpoint.
pub fn cast<Req, Resp>(
    _like: &Endpoint<Req, Resp>,
    endpoint: AnyEndpoint,
) -> Endpoint<Req, Resp>
where
    Req: Any + Send,
    Resp: Any + Default + Send,
{
    adapt(endpoint)
}

/// Turns the result of an untyped call into a typed one.
pub fn return_typed<T>(result: Result<Value>) -> Result<T>
where
    T: Any + Default,
{
    result?.into_typed::<T>().map_err(|mismatch| {
        debug!(%mismatch, "untyped result rejected");
        Error::from(mismatch)
    })
}

/// Hands the typed content of `value` to `f`, or fails without calling it.
pub fn call_typed<T, R, F>(value: Value, f: F) -> Result<R>
where
    T: Any + Default,
    F: FnOnce(T) -> Result<R>,
{
    match value.into_typed::<T>() {
        Ok(typed) => f(typed),
        Err(mismatch) => {
            debug!(%mismatch, "untyped argument rejected");
            Err(mismatch.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };
    use thiserror::Error;

    #[derive(Debug, Error)]
    #[error("test")]
    struct TestError;

    fn untyped<F>(f: F) -> AnyEndpoint
    where
        F: Fn(Value) -> Result<Value> + Send + Sync + 'static,
    {
        Endpoint::new(move |_ctx, request| futures::future::ready(f(request)))
    }

    #[tokio::test]
    async fn adapt_formats_request() {
        let e = adapt::<String, String>(untyped(|request| {
            let request: String = request.downcast()?;
            Ok(Value::new(format!("str-{request}")))
        }));
        let response = e.call(Context::background(), "data".into()).await.unwrap();
        assert_eq!(response, "str-data");
    }

    #[tokio::test]
    async fn adapt_rejects_foreign_response() {
        let e = adapt::<String, String>(untyped(|_| Ok(Value::new(12))));
        let err = e.call(Context::background(), "data".into()).await.unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[tokio::test]
    async fn adapt_maps_nil_to_zero_value() {
        let e = adapt::<String, String>(untyped(|_| Ok(Value::Nil)));
        let response = e.call(Context::background(), "data".into()).await.unwrap();
        assert_eq!(response, "");
    }

    #[tokio::test]
    async fn adapt_propagates_errors_before_checking() {
        let e = adapt::<String, String>(untyped(|_| Err(Error::new(TestError))));
        let err = e.call(Context::background(), "data".into()).await.unwrap_err();
        assert!(err.downcast_ref::<TestError>().is_some());
    }

    #[tokio::test]
    async fn reverse_adapt_passes_matching_request() {
        let e = reverse_adapt(Endpoint::new(|_ctx, request: String| async move {
            Ok(format!("str-{request}"))
        }));
        let response = e
            .call(Context::background(), Value::new(String::from("data")))
            .await
            .unwrap();
        assert_eq!(response.downcast::<String>().unwrap(), "str-data");
    }

    #[tokio::test]
    async fn reverse_adapt_propagates_errors() {
        let e = reverse_adapt(Endpoint::new(|_ctx, _request: String| async {
            Err::<String, _>(Error::new(TestError))
        }));
        let err = e
            .call(Context::background(), Value::new(String::from("data")))
            .await
            .unwrap_err();
        assert!(err.downcast_ref::<TestError>().is_some());
    }

    #[tokio::test]
    async fn reverse_adapt_skips_call_on_mismatch() {
        let called = Arc::new(AtomicBool::new(false));
        let e = reverse_adapt(Endpoint::new({
            let called = called.clone();
            move |_ctx, request: i64| {
                called.store(true, Ordering::SeqCst);
                async move { Ok(request) }
            }
        }));
        let err = e
            .call(Context::background(), Value::new("12"))
            .await
            .unwrap_err();
        assert!(err.is_type_mismatch());
        assert!(!called.load(Ordering::SeqCst));
    }

    #[test]
    fn call_typed_checks_before_calling() {
        let mut seen = None;
        assert!(call_typed(Value::new(10), |n: i32| {
            seen = Some(n);
            Ok(())
        })
        .is_ok());
        assert_eq!(seen, Some(10));

        let err = call_typed(Value::new(""), |_: i32| -> Result<()> {
            panic!("must not be called")
        })
        .unwrap_err();
        assert!(err.is_type_mismatch());
    }

    #[test]
    fn return_typed_prefers_the_error() {
        let err = return_typed::<i32>(Err(Error::new(TestError))).unwrap_err();
        assert!(err.downcast_ref::<TestError>().is_some());
        assert_eq!(return_typed::<i32>(Ok(Value::Nil)).unwrap(), 0);
    }
}
