use crate::context::{build_response, Reply, TEXT};
use crate::handler::BoxFuture;
use crate::kind::{FailureKind, Kind};
use crate::router::Router;

use std::convert::Infallible;
use std::io;
use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::Service;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

type Request = http::Request<Incoming>;
type Response = http::Response<Full<Bytes>>;

/// Serves a [`Router`] over hyper.
///
/// Each request is dispatched on its own task. If the client disconnects
/// while a handler is still running, the handler is left to finish and its
/// response is dropped.
pub struct RouterService<K = Kind> {
    router: Arc<Router<K>>,
}

impl<K> Clone for RouterService<K> {
    fn clone(&self) -> Self {
        Self {
            router: Arc::clone(&self.router),
        }
    }
}

impl<K: FailureKind> RouterService<K> {
    pub fn new(router: Router<K>) -> Self {
        Self::shared(Arc::new(router))
    }

    pub fn shared(router: Arc<Router<K>>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Router<K> {
        &self.router
    }
}

impl<K: FailureKind> Service<Request> for RouterService<K> {
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn call(&self, req: Request) -> Self::Future {
        let router = Arc::clone(&self.router);
        Box::pin(async move {
            let (parts, body) = req.into_parts();
            let body = match body.collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    debug!(error = %e, "failed to read request body");
                    let res = build_response(StatusCode::BAD_REQUEST, TEXT, "400 Bad Request");
                    return Ok(res.map(Full::new));
                }
            };
            let request = http::Request::from_parts(parts, body);

            let (reply, rx) = Reply::channel();
            let task_router = Arc::clone(&router);
            tokio::spawn(async move { task_router.accept(request, reply).await });

            let res = match rx.await {
                Ok(res) => res,
                Err(_) => {
                    error!("dispatch ended without a response");
                    router.config().internal_error::<K>(None)
                }
            };
            Ok(res.map(Full::new))
        })
    }
}

/// Accepts HTTP/1 connections on `listener` until accepting fails.
pub async fn serve<K: FailureKind>(router: Router<K>, listener: TcpListener) -> io::Result<()> {
    let service = RouterService::new(router);
    info!(addr = ?listener.local_addr().ok(), "serving");
    loop {
        let (stream, remote) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let service = service.clone();
        tokio::spawn(async move {
            if let Err(err) = http1::Builder::new().serve_connection(io, service).await {
                debug!(%remote, error = %err, "connection error");
            }
        });
    }
}
