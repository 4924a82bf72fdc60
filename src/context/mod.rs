mod params;

pub use self::params::Params;

use crate::error::Failure;
use crate::kind::{FailureKind, Kind};

use std::sync::Arc;

use bytes::Bytes;
use http::header::{HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, Request, Response, StatusCode, Uri};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::oneshot;
use tracing::{debug, warn};

pub(crate) const JSON: &str = "application/json";
pub(crate) const TEXT: &str = "text/plain; charset=utf-8";

/// Where a dispatch writes its response. Implemented by the transport.
pub trait ResponseSink: Send + 'static {
    /// Whether the client has gone away. Writes to a closed sink are skipped.
    fn is_closed(&self) -> bool;

    fn write(&mut self, response: Response<Bytes>);
}

/// A [`ResponseSink`] backed by a oneshot channel.
///
/// Dropping the receiver marks the sink closed.
#[derive(Debug)]
pub struct Reply {
    tx: Option<oneshot::Sender<Response<Bytes>>>,
}

impl Reply {
    pub fn channel() -> (Self, oneshot::Receiver<Response<Bytes>>) {
        let (tx, rx) = oneshot::channel();
        (Self { tx: Some(tx) }, rx)
    }
}

impl ResponseSink for Reply {
    fn is_closed(&self) -> bool {
        self.tx.as_ref().map_or(true, |tx| tx.is_closed())
    }

    fn write(&mut self, response: Response<Bytes>) {
        if let Some(tx) = self.tx.take() {
            if tx.send(response).is_err() {
                debug!("reply receiver dropped before the response arrived");
            }
        }
    }
}

pub(crate) fn build_response(
    status: StatusCode,
    content_type: &'static str,
    body: impl Into<Bytes>,
) -> Response<Bytes> {
    let mut res = Response::new(body.into());
    *res.status_mut() = status;
    res.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    res
}

pub(crate) struct Responder {
    sink: Box<dyn ResponseSink>,
    written: bool,
}

impl Responder {
    pub(crate) fn new(sink: Box<dyn ResponseSink>) -> Self {
        Self {
            sink,
            written: false,
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.sink.is_closed()
    }

    pub(crate) fn write(&mut self, response: Response<Bytes>) {
        if self.written {
            warn!(status = %response.status(), "response already written, ignoring");
            return;
        }
        self.written = true;
        if self.sink.is_closed() {
            debug!(status = %response.status(), "client gone, response dropped");
            return;
        }
        self.sink.write(response);
    }
}

enum Signal<K> {
    Pending,
    Responded,
    Failed(Failure<K>),
}

pub(crate) enum Settled<K> {
    Responded,
    Failed(Failure<K>),
    Silent,
}

/// The state of one request while it is being dispatched.
///
/// A handler completes by either writing a response (`send*`) or raising a
/// failure (`fail`, or returning `Err`). Only the first of these counts.
pub struct RequestContext<K = Kind> {
    request: Request<Bytes>,
    path: String,
    params: Params,
    route: Option<Box<str>>,
    owner: Option<Arc<str>>,
    failure: Option<Failure<K>>,
    signal: Signal<K>,
    responder: Responder,
}

impl<K: FailureKind> RequestContext<K> {
    pub fn method(&self) -> &Method {
        self.request.method()
    }

    pub fn uri(&self) -> &Uri {
        self.request.uri()
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    pub fn request(&self) -> &Request<Bytes> {
        &self.request
    }

    pub fn body(&self) -> &Bytes {
        self.request.body()
    }

    pub fn body_json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(self.request.body())
    }

    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn tail(&self) -> Option<&str> {
        self.params.tail()
    }

    pub fn route(&self) -> Option<&str> {
        self.route.as_deref()
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }

    /// The failure being handled. Only set inside a failure handler.
    pub fn failure(&self) -> Option<&Failure<K>> {
        self.failure.as_ref()
    }

    /// The status of the failure being handled, or 500 when there is none.
    pub fn failure_status(&self) -> StatusCode {
        self.failure
            .as_ref()
            .map_or(StatusCode::INTERNAL_SERVER_ERROR, Failure::status)
    }

    pub fn is_closed(&self) -> bool {
        self.responder.is_closed()
    }

    pub fn is_settled(&self) -> bool {
        !matches!(self.signal, Signal::Pending)
    }

    pub fn send(&mut self, response: Response<Bytes>) {
        if !self.take_signal("send") {
            return;
        }
        self.signal = Signal::Responded;
        self.responder.write(response);
    }

    pub fn send_json<T: Serialize + ?Sized>(&mut self, payload: &T, status: StatusCode) {
        match serde_json::to_vec(payload) {
            Ok(body) => self.send(build_response(status, JSON, body)),
            Err(e) => self.fail(
                Failure::new(K::unhandled())
                    .with_message("response serialization failed")
                    .with_cause(e),
            ),
        }
    }

    pub fn send_text(&mut self, text: impl Into<String>, status: StatusCode) {
        self.send(build_response(status, TEXT, text.into()))
    }

    pub fn send_status(&mut self, status: StatusCode) {
        let reason = status.canonical_reason().unwrap_or("");
        self.send(build_response(status, TEXT, reason))
    }

    pub fn fail(&mut self, failure: impl Into<Failure<K>>) {
        let failure = failure.into();
        if !self.take_signal("fail") {
            debug!(failure = %failure, "late failure dropped");
            return;
        }
        self.signal = Signal::Failed(failure);
    }

    fn take_signal(&self, op: &'static str) -> bool {
        if self.is_settled() {
            warn!(
                op,
                path = %self.path,
                "handler signalled completion twice, ignoring"
            );
            return false;
        }
        true
    }
}

impl<K: FailureKind> RequestContext<K> {
    pub(crate) fn new(
        request: Request<Bytes>,
        params: Params,
        route: Option<(Box<str>, Arc<str>)>,
        responder: Responder,
    ) -> Self {
        let path = request.uri().path().to_owned();
        let (route, owner) = match route {
            Some((r, o)) => (Some(r), Some(o)),
            None => (None, None),
        };
        Self {
            request,
            path,
            params,
            route,
            owner,
            failure: None,
            signal: Signal::Pending,
            responder,
        }
    }

    pub(crate) fn settle(&mut self, result: Result<(), Failure<K>>) -> Settled<K> {
        if let Err(failure) = result {
            self.fail(failure);
        }
        match std::mem::replace(&mut self.signal, Signal::Responded) {
            Signal::Pending => {
                self.signal = Signal::Pending;
                Settled::Silent
            }
            Signal::Responded => Settled::Responded,
            Signal::Failed(failure) => Settled::Failed(failure),
        }
    }

    pub(crate) fn enter_failure(&mut self, failure: Failure<K>) {
        self.failure = Some(failure);
        self.signal = Signal::Pending;
    }

    pub(crate) fn responder(&mut self) -> &mut Responder {
        &mut self.responder
    }
}
