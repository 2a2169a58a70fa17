//! Typed endpoints over a type-erased endpoint layer.
//!
//! Application code works with [`Endpoint<Req, Resp>`]; middlewares, codecs,
//! and transports that only understand the erased [`AnyEndpoint`] shape are
//! reached through [`adapt`] and [`reverse_adapt`], which check the dynamic
//! type of every [`Value`] that crosses the boundary.

pub mod adapter;
pub mod codec;
pub mod context;
pub mod dispatcher;
pub mod endpoint;
pub mod error;
pub mod jsonrpc;
pub mod middleware;
pub mod net;
pub mod types;

pub use adapter::{adapt, cast, reverse_adapt};
pub use context::Context;
pub use endpoint::{chain, AnyEndpoint, AnyMiddleware, Endpoint, Middleware};
pub use error::{Error, RemoteError, Result};
pub use types::{TypeMismatch, Value};
