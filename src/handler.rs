use crate::context::RequestContext;
use crate::error::Failure;
use crate::kind::{FailureKind, Kind};

use std::future::{ready, Future};
use std::pin::Pin;
use std::sync::Arc;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type HandlerResult<K = Kind> = Result<(), Failure<K>>;

/// A route or failure-route handler.
///
/// A handler completes by writing a response through the context or by
/// failing, either with [`RequestContext::fail`] or by returning `Err`.
pub trait Handler<K>: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext<K>) -> BoxFuture<'a, HandlerResult<K>>;
}

pub type BoxHandler<K> = Arc<dyn Handler<K>>;

pub(crate) struct AsyncFn<F>(pub(crate) F);

pub(crate) struct SyncFn<F>(pub(crate) F);

impl<K, F> Handler<K> for AsyncFn<F>
where
    K: FailureKind,
    F: for<'a> Fn(&'a mut RequestContext<K>) -> BoxFuture<'a, HandlerResult<K>>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext<K>) -> BoxFuture<'a, HandlerResult<K>> {
        (self.0)(ctx)
    }
}

impl<K, F> Handler<K> for SyncFn<F>
where
    K: FailureKind,
    F: Fn(&mut RequestContext<K>) -> HandlerResult<K> + Send + Sync + 'static,
{
    fn call<'a>(&'a self, ctx: &'a mut RequestContext<K>) -> BoxFuture<'a, HandlerResult<K>> {
        Box::pin(ready((self.0)(ctx)))
    }
}
