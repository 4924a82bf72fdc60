//! A declarative request router with specificity-ordered failure handlers.
//!
//! Handlers are bound to path patterns on [`Controller`]s. [`Router::configure`]
//! scans the controllers into two read-only tables:
//!
//! - routes, ordered so that the most specific pattern matching a request wins;
//! - failure routes, consulted when a handler fails. A failure route can be
//!   restricted to some failure [`Kind`]s (and their descendants); at equal path
//!   specificity a restricted failure route wins over a catch-all one.
//!
//! Patterns are made of literal segments, `:name` captures and an optional
//! trailing `*` matching the path and everything below it.
//!
//! ```
//! use nuclear_dispatch::{Controller, Failure, Kind, Router, StatusCode};
//! use bytes::Bytes;
//!
//! let mut api = Controller::new("api");
//! api.get("/users/:id", |ctx| Box::pin(async move {
//!     let id: u32 = match ctx.params().parse("id") {
//!         Some(Ok(id)) => id,
//!         _ => return Err(Failure::new(Kind::InvalidArgument)),
//!     };
//!     ctx.send_json(&serde_json::json!({ "id": id }), StatusCode::OK);
//!     Ok(())
//! }))
//! .register_failure("/*", &[], |ctx| Box::pin(async move {
//!     let status = ctx.failure_status();
//!     ctx.send_json(&serde_json::json!({ "success": false }), status);
//!     Ok(())
//! }));
//!
//! let router = Router::configure([api]).unwrap();
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let req = http::Request::get("/users/x").body(Bytes::new()).unwrap();
//! let res = router.handle(req).await;
//! assert_eq!(res.status(), StatusCode::BAD_REQUEST);
//! # });
//! ```

#![forbid(unsafe_code)]

mod config;
mod context;
mod controller;
mod error;
mod handler;
mod kind;
mod macros;
mod pattern;
mod router;
mod table;

#[cfg(feature = "hyper-service")]
pub mod hyper_service;

pub use self::config::RouterConfig;
pub use self::context::{Params, Reply, RequestContext, ResponseSink};
pub use self::controller::{Controller, Scanned};
pub use self::error::{BoxError, ConfigError, Failure};
pub use self::handler::{BoxFuture, BoxHandler, Handler, HandlerResult};
pub use self::kind::{FailureKind, Kind, Lineage, MAX_KIND_DEPTH};
pub use self::pattern::{PatternError, RoutePattern, Segment, Specificity};
pub use self::router::Router;
pub use self::table::{FailureRoute, FailureTable, MethodSet, Route, RouteTable};

pub use http::{Method, StatusCode};
