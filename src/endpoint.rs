use crate::{context::Context, error::Result, types::Value};
use futures::future::BoxFuture;
use std::{fmt, future::Future, sync::Arc};

/// A single RPC method, middleware stage, or client call.
///
/// Endpoints are cheap to clone and hold no per-call state; the [`Context`] is
/// moved into each invocation.
pub struct Endpoint<Req, Resp> {
    f: Arc<dyn Fn(Context, Req) -> BoxFuture<'static, Result<Resp>> + Send + Sync>,
}

/// The type-erased shape the untyped layer chains and registers.
pub type AnyEndpoint = Endpoint<Value, Value>;

impl<Req, Resp> Endpoint<Req, Resp>
where
    Req: Send + 'static,
    Resp: Send + 'static,
{
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: Fn(Context, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Resp>> + Send + 'static,
    {
        Self {
            f: Arc::new(
                move |ctx: Context, request: Req| -> BoxFuture<'static, Result<Resp>> {
                    Box::pin(f(ctx, request))
                },
            ),
        }
    }

    pub fn call(&self, ctx: Context, request: Req) -> BoxFuture<'static, Result<Resp>> {
        (self.f)(ctx, request)
    }
}

impl<Req, Resp> Endpoint<Req, Resp>
where
    Req: Send + 'static,
    Resp: Default + Send + 'static,
{
    /// An endpoint that ignores its request and returns the zero response.
    pub fn nop() -> Self {
        Self::new(|_ctx, _request| async { Ok(Resp::default()) })
    }
}

impl<Req, Resp> Clone for Endpoint<Req, Resp> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<Req, Resp> fmt::Debug for Endpoint<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Endpoint").finish_non_exhaustive()
    }
}

/// A chainable behavior modifier for endpoints.
pub struct Middleware<Req, Resp> {
    f: Arc<dyn Fn(Endpoint<Req, Resp>) -> Endpoint<Req, Resp> + Send + Sync>,
}

pub type AnyMiddleware = Middleware<Value, Value>;

impl<Req, Resp> Middleware<Req, Resp> {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Endpoint<Req, Resp>) -> Endpoint<Req, Resp> + Send + Sync + 'static,
    {
        Self { f: Arc::new(f) }
    }

    pub fn apply(&self, next: Endpoint<Req, Resp>) -> Endpoint<Req, Resp> {
        (self.f)(next)
    }
}

impl<Req, Resp> Clone for Middleware<Req, Resp> {
    fn clone(&self) -> Self {
        Self { f: self.f.clone() }
    }
}

impl<Req, Resp> fmt::Debug for Middleware<Req, Resp> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Middleware").finish_non_exhaustive()
    }
}

/// Composes middlewares so that `outer` sees a request first and the last of
/// `others` sits right in front of the endpoint.
pub fn chain<Req, Resp, I>(outer: Middleware<Req, Resp>, others: I) -> Middleware<Req, Resp>
where
    Req: 'static,
    Resp: 'static,
    I: IntoIterator<Item = Middleware<Req, Resp>>,
{
    let others: Vec<_> = others.into_iter().collect();
    Middleware::new(move |next| {
        let next = others.iter().rev().fold(next, |next, m| m.apply(next));
        outer.apply(next)
    })
}
