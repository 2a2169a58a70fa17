//! Bridging between untyped middlewares and typed endpoints.

use crate::{
    adapter::{adapt, reverse_adapt},
    endpoint::{AnyEndpoint, AnyMiddleware, Endpoint, Middleware},
    types::Value,
};
use std::{any::Any, time::Instant};
use tracing::{debug, info_span, warn, Instrument};

/// Lifts an untyped middleware to a typed one.
///
/// The typed endpoint is reverse-adapted, decorated by `middleware`, then
/// adapted back, so hooks run in exactly the order they would on an untyped
/// endpoint.
pub fn adapter<Req, Resp>(middleware: AnyMiddleware) -> Middleware<Req, Resp>
where
    Req: Any + Default + Send,
    Resp: Any + Default + Send,
{
    Middleware::new(move |next| adapt(middleware.apply(reverse_adapt(next))))
}

/// Decorates a single typed endpoint with an untyped middleware.
pub fn wrap<Req, Resp>(
    middleware: &AnyMiddleware,
    endpoint: Endpoint<Req, Resp>,
) -> Endpoint<Req, Resp>
where
    Req: Any + Default + Send,
    Resp: Any + Default + Send,
{
    adapt(middleware.apply(reverse_adapt(endpoint)))
}

/// Runs each call inside a span named after `name` and logs how it ended.
pub fn traced(name: &'static str) -> AnyMiddleware {
    Middleware::new(move |next: AnyEndpoint| {
        Endpoint::new(move |ctx, request: Value| {
            let span = info_span!("call", endpoint = name, request = request.type_name());
            let response = next.call(ctx, request);
            async move {
                let started = Instant::now();
                let response = response.await;
                match &response {
                    Ok(value) => debug!(
                        response = value.type_name(),
                        elapsed = ?started.elapsed(),
                        "call finished"
                    ),
                    Err(err) => warn!(%err, elapsed = ?started.elapsed(), "call failed"),
                }
                response
            }
            .instrument(span)
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Context;
    use tracing_test::traced_test;

    #[tokio::test]
    #[traced_test]
    async fn traced_logs_failures_and_keeps_the_error() {
        let e = wrap(
            &traced("flaky"),
            Endpoint::new(|_ctx, _request: u8| async {
                Err::<u8, _>(crate::Error::new("boom"))
            }),
        );
        let err = e.call(Context::background(), 1).await.unwrap_err();
        assert_eq!(err.to_string(), "boom");
        assert!(logs_contain("call failed"));
    }

    #[tokio::test]
    #[traced_test]
    async fn traced_is_transparent_for_values() {
        let double = Endpoint::new(|_ctx, n: u8| async move { Ok(u16::from(n) * 2) });
        let e = adapter(traced("double")).apply(double);
        assert_eq!(e.call(Context::background(), 21).await.unwrap(), 42);
        assert!(logs_contain("call finished"));
    }

    #[tokio::test]
    async fn untyped_middleware_can_short_circuit() {
        let deny: AnyMiddleware = Middleware::new(|_next| {
            Endpoint::new(|_ctx, _request| async { Ok(Value::new("denied")) })
        });
        let e = wrap(&deny, Endpoint::new(|_ctx, n: u8| async move { Ok(n) }));
        let err = e.call(Context::background(), 1).await.unwrap_err();
        assert!(err.is_type_mismatch());
    }
}
