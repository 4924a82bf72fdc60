use super::Router;

use crate::context::{Reply, RequestContext, Responder, ResponseSink, Settled};
use crate::error::Failure;
use crate::handler::{Handler, HandlerResult};
use crate::kind::FailureKind;

use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use bytes::Bytes;
use futures_util::FutureExt;
use http::{Request, Response};
use tracing::{debug, debug_span, error, warn, Instrument};

impl<K: FailureKind> Router<K> {
    /// Dispatches one request and writes exactly one response to `sink`.
    ///
    /// Never fails: every handler failure ends in a response from a failure
    /// route or in the default 500 response.
    pub async fn accept<S: ResponseSink>(&self, request: Request<Bytes>, sink: S) {
        let span = debug_span!(
            "dispatch",
            method = %request.method(),
            path = %request.uri().path()
        );
        self.dispatch(request, Responder::new(Box::new(sink)))
            .instrument(span)
            .await
    }

    /// Dispatches one request in-process and returns its response.
    pub async fn handle(&self, request: Request<Bytes>) -> Response<Bytes> {
        let (reply, rx) = Reply::channel();
        self.accept(request, reply).await;
        match rx.await {
            Ok(res) => res,
            Err(_) => self.config.internal_error::<K>(None),
        }
    }

    async fn dispatch(&self, request: Request<Bytes>, mut responder: Responder) {
        let (route, params) = match self.routes.find(request.method(), request.uri().path()) {
            Some(found) => found,
            None => {
                debug!("no route matched");
                responder.write(self.config.not_found());
                return;
            }
        };

        let matched = Some((route.pattern().as_str().into(), route.owner_arc()));
        let mut ctx = RequestContext::new(request, params, matched, responder);

        let outcome = invoke(&**route.handler(), &mut ctx).await;
        let failure = match ctx.settle(outcome) {
            Settled::Responded => return,
            Settled::Failed(failure) => failure,
            Settled::Silent => {
                warn!(route = %route.pattern(), "handler returned without responding");
                self.internal_error(&mut ctx);
                return;
            }
        };

        debug!(failure = %failure, "handler failed");
        self.handle_failure(&mut ctx, failure).await
    }

    async fn handle_failure(&self, ctx: &mut RequestContext<K>, failure: Failure<K>) {
        let kind = failure.kind();
        let found = self.failures.find(ctx.path(), kind);
        ctx.enter_failure(failure);

        let route = match found {
            Some(route) => route,
            None => {
                debug!(?kind, "no failure route matched");
                self.internal_error(ctx);
                return;
            }
        };

        // A failure raised here is not dispatched again.
        let outcome = invoke(&**route.handler(), ctx).await;
        match ctx.settle(outcome) {
            Settled::Responded => {}
            Settled::Failed(f) => {
                error!(route = %route.pattern(), failure = %f, "failure handler failed");
                self.internal_error(ctx);
            }
            Settled::Silent => {
                warn!(route = %route.pattern(), "failure handler returned without responding");
                self.internal_error(ctx);
            }
        }
    }

    fn internal_error(&self, ctx: &mut RequestContext<K>) {
        let res = self.config.internal_error(ctx.failure());
        ctx.responder().write(res);
    }
}

/// Runs a handler to completion, turning a panic into a failure.
async fn invoke<K: FailureKind>(
    handler: &dyn Handler<K>,
    ctx: &mut RequestContext<K>,
) -> HandlerResult<K> {
    let fut = match catch_unwind(AssertUnwindSafe(move || {
        let ctx = ctx;
        handler.call(ctx)
    })) {
        Ok(fut) => fut,
        Err(payload) => return Err(panicked(payload)),
    };
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(panicked(payload)),
    }
}

fn panicked<K: FailureKind>(payload: Box<dyn Any + Send>) -> Failure<K> {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_owned()
    };
    error!(panic = %msg, "handler panicked");
    Failure::new(K::unhandled()).with_message(format!("handler panicked: {}", msg))
}
