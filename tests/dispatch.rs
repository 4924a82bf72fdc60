use nuclear_dispatch::{
    Controller, Failure, FailureKind, Kind, Method, RequestContext, ResponseSink, Router,
    RouterConfig, StatusCode,
};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use http::{Request, Response};
use serde_json::{json, Value};
use tokio::sync::Notify;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn req(method: Method, path: &str) -> Request<Bytes> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Bytes::new())
        .unwrap()
}

fn json_body(res: &Response<Bytes>) -> Value {
    serde_json::from_slice(res.body()).unwrap()
}

fn counter() -> Arc<AtomicUsize> {
    Arc::new(AtomicUsize::new(0))
}

/// `/` fails with `Unhandled`, `/arg` with `InvalidArgument`. The catch-all is
/// registered before the filtered failure route on purpose.
fn fail_controller() -> Controller {
    let mut c = Controller::new("fail");
    c.endpoint("/", |_| Box::pin(async { Err(Failure::new(Kind::Unhandled)) }))
        .get("/arg", |_| {
            Box::pin(async { Err(Failure::new(Kind::InvalidArgument)) })
        })
        .register_failure("/*", &[], |ctx| {
            Box::pin(async move {
                let status = ctx.failure_status();
                ctx.send_json(&json!({ "success": false }), status);
                Ok(())
            })
        })
        .register_failure("/*", &[Kind::InvalidArgument], |ctx| {
            Box::pin(async move {
                ctx.send_json(&json!({ "success": false }), StatusCode::BAD_REQUEST);
                Ok(())
            })
        });
    c
}

#[tokio::test]
async fn scenario_catch_all_failure() {
    init_logging();
    let router = Router::configure([fail_controller()]).unwrap();

    let res = router.handle(req(Method::GET, "/")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(&res), json!({ "success": false }));
    assert_eq!(res.headers()["content-type"], "application/json");
}

#[tokio::test]
async fn scenario_selective_failure() {
    init_logging();
    let router = Router::configure([fail_controller()]).unwrap();

    let res = router.handle(req(Method::GET, "/arg")).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(&res), json!({ "success": false }));

    let res = router.handle(req(Method::GET, "/")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn scenario_unmatched_path() {
    init_logging();
    let hits = counter();
    let mut c = fail_controller();
    let h = Arc::clone(&hits);
    c.register_failure_sync("/*", &[Kind::Http], move |ctx| {
        h.fetch_add(1, Ordering::SeqCst);
        ctx.send_status(StatusCode::NOT_FOUND);
        Ok(())
    });
    let router = Router::configure([c]).unwrap();

    let res = router.handle(req(Method::GET, "/nope")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.body(), "404 Not Found");
    assert_eq!(hits.load(Ordering::SeqCst), 0);

    // method mismatch on the only matching pattern is also unmatched
    let res = router.handle(req(Method::POST, "/arg")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

fn text_route(c: &mut Controller, pattern: &str, methods: &[Method], text: &'static str) {
    c.register_sync(pattern, methods, move |ctx| {
        ctx.send_text(text, StatusCode::OK);
        Ok(())
    });
}

#[tokio::test]
async fn exact_route_beats_wildcard_from_other_controller() {
    let mut a = Controller::new("a");
    text_route(&mut a, "/*", &[], "root");
    let mut b = Controller::new("b");
    text_route(&mut b, "/status", &[Method::GET], "status");
    text_route(&mut b, "/status/*", &[], "status-tree");

    let router = Router::configure([a, b]).unwrap();

    let cases = [
        ("/status", "status"),
        ("/status/deep/er", "status-tree"),
        ("/other", "root"),
        ("/", "root"),
    ];
    for &(path, expected) in &cases {
        let res = router.handle(req(Method::GET, path)).await;
        assert_eq!(res.body(), expected, "path = {}", path);
    }

    // POST /status skips the GET-only exact route
    let res = router.handle(req(Method::POST, "/status")).await;
    assert_eq!(res.body(), "status-tree");
}

#[tokio::test]
async fn exact_route_beats_wildcard_with_same_literals() {
    let mut c = Controller::new("c");
    text_route(&mut c, "/a/b/*", &[], "tree");
    text_route(&mut c, "/a/b", &[Method::GET], "exact");
    let router = Router::configure([c]).unwrap();

    let res = router.handle(req(Method::GET, "/a/b")).await;
    assert_eq!(res.body(), "exact");
    let res = router.handle(req(Method::GET, "/a/b/c")).await;
    assert_eq!(res.body(), "tree");
}

#[tokio::test]
async fn equal_specificity_keeps_registration_order() {
    let mut a = Controller::new("a");
    text_route(&mut a, "/x/:id", &[], "capture");
    let mut b = Controller::new("b");
    text_route(&mut b, "/:name/y", &[], "other-capture");

    let router = Router::configure([a, b]).unwrap();
    let res = router.handle(req(Method::GET, "/x/y")).await;
    assert_eq!(res.body(), "capture");
}

#[tokio::test]
async fn params_and_tail() {
    let mut c = Controller::new("files");
    c.get("/u/:uid/files/*", |ctx| {
        Box::pin(async move {
            let body = json!({
                "uid": ctx.param("uid"),
                "tail": ctx.tail(),
                "route": ctx.route(),
                "owner": ctx.owner(),
            });
            ctx.send_json(&body, StatusCode::OK);
            Ok(())
        })
    });
    let router = Router::configure([c]).unwrap();

    let res = router.handle(req(Method::GET, "/u/asd/files/home/.bashrc")).await;
    assert_eq!(
        json_body(&res),
        json!({
            "uid": "asd",
            "tail": "home/.bashrc",
            "route": "/u/:uid/files/*",
            "owner": "files",
        })
    );

    let res = router.handle(req(Method::GET, "/u/asd/files")).await;
    assert_eq!(json_body(&res)["tail"], "");
}

fn failure_text(c: &mut Controller, pattern: &str, kinds: &[Kind], text: &'static str) {
    c.register_failure_sync(pattern, kinds, move |ctx| {
        ctx.send_text(text, StatusCode::OK);
        Ok(())
    });
}

fn raising(c: &mut Controller, pattern: &str) {
    c.register(pattern, &[Method::POST], |ctx| {
        Box::pin(async move {
            let failure = match ctx.body_json::<Value>() {
                Ok(v) => match v["kind"].as_str() {
                    Some("timeout") => Failure::new(Kind::Timeout),
                    Some("conflict") => Failure::new(Kind::Conflict),
                    Some("state") => Failure::new(Kind::InvalidState),
                    _ => Failure::new(Kind::Unhandled),
                },
                Err(e) => Failure::new(Kind::InvalidArgument).with_cause(e),
            };
            ctx.fail(failure);
            Ok(())
        })
    });
}

fn post(path: &str, body: Value) -> Request<Bytes> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .body(Bytes::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn filter_matches_ancestor_kind() {
    let mut c = Controller::new("c");
    raising(&mut c, "/*");
    failure_text(&mut c, "/*", &[], "catch-all");
    failure_text(&mut c, "/*", &[Kind::Io], "io");

    let router = Router::configure([c]).unwrap();
    let res = router.handle(post("/x", json!({ "kind": "timeout" }))).await;
    assert_eq!(res.body(), "io");
    let res = router.handle(post("/x", json!({ "kind": "conflict" }))).await;
    assert_eq!(res.body(), "catch-all");
}

#[tokio::test]
async fn path_specificity_comes_before_filter() {
    let mut c = Controller::new("c");
    raising(&mut c, "/*");
    failure_text(&mut c, "/*", &[Kind::Conflict], "root-conflict");
    failure_text(&mut c, "/*", &[], "root");
    failure_text(&mut c, "/api/*", &[], "api");

    let router = Router::configure([c]).unwrap();
    let cases = [
        ("/api/x", "conflict", "api"),
        ("/api/x", "state", "api"),
        ("/x", "conflict", "root-conflict"),
        ("/x", "state", "root"),
    ];
    for &(path, kind, expected) in &cases {
        let res = router.handle(post(path, json!({ "kind": kind }))).await;
        assert_eq!(res.body(), expected, "{} {}", path, kind);
    }
}

#[tokio::test]
async fn no_failure_route_gives_default_500() {
    let mut c = Controller::new("c");
    raising(&mut c, "/*");
    failure_text(&mut c, "/only/here/*", &[], "elsewhere");

    let router = Router::configure([c]).unwrap();
    let res = router.handle(post("/x", json!({}))).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body(), "500 Internal Server Error");
}

#[tokio::test]
async fn failure_inside_failure_handler_is_not_redispatched() {
    init_logging();
    let catch_all = counter();

    let mut c = Controller::new("c");
    raising(&mut c, "/*");
    c.register_failure_sync("/*", &[Kind::Conflict], |_| {
        Err(Failure::new(Kind::Unhandled).with_message("nested"))
    });
    let h = Arc::clone(&catch_all);
    c.register_failure_sync("/*", &[], move |ctx| {
        h.fetch_add(1, Ordering::SeqCst);
        ctx.send_status(StatusCode::OK);
        Ok(())
    });

    let config = RouterConfig {
        expose_failure_details: true,
        ..RouterConfig::default()
    };
    let router = Router::configure_with(config, [c]).unwrap();
    let res = router.handle(post("/x", json!({ "kind": "conflict" }))).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    // the default body describes the failure being handled, not the nested one
    assert_eq!(res.body(), "500 Internal Server Error: Conflict");
    assert_eq!(catch_all.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn panicking_handler_is_a_failure() {
    init_logging();
    let mut c = Controller::new("c");
    c.register_sync("/boom", &[], |_| panic!("kaboom"));
    c.register_failure_sync("/*", &[], |ctx| {
        let failure = ctx.failure().unwrap();
        let body = json!({
            "kind": format!("{:?}", failure.kind()),
            "message": failure.message(),
        });
        ctx.send_json(&body, StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    });

    let router = Router::configure([c]).unwrap();
    let res = router.handle(req(Method::GET, "/boom")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(&res),
        json!({ "kind": "Unhandled", "message": "handler panicked: kaboom" })
    );
}

#[tokio::test]
async fn panicking_failure_handler_gives_default_500() {
    let mut c = Controller::new("c");
    c.register_sync("/", &[], |_| Err(Kind::Unhandled.into()));
    c.register_failure("/*", &[], |ctx| {
        Box::pin(async move {
            if ctx.failure().is_some() {
                panic!("again");
            }
            Ok(())
        })
    });

    let router = Router::configure([c]).unwrap();
    let res = router.handle(req(Method::GET, "/")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body(), "500 Internal Server Error");
}

#[tokio::test]
async fn second_signal_is_ignored() {
    let mut c = Controller::new("c");
    c.register_sync("/", &[], |ctx| {
        ctx.send_text("first", StatusCode::OK);
        ctx.send_text("second", StatusCode::CREATED);
        Err(Failure::new(Kind::Unhandled))
    });
    failure_text(&mut c, "/*", &[], "failure");

    let router = Router::configure([c]).unwrap();
    let res = router.handle(req(Method::GET, "/")).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.body(), "first");
}

#[tokio::test]
async fn silent_handler_gives_default_500() {
    let mut c = Controller::new("c");
    c.register_sync("/", &[], |_| Ok(()));

    let router = Router::configure([c]).unwrap();
    let res = router.handle(req(Method::GET, "/")).await;
    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[derive(Clone, Default)]
struct Gone(Arc<Mutex<Vec<Response<Bytes>>>>);

impl ResponseSink for Gone {
    fn is_closed(&self) -> bool {
        true
    }

    fn write(&mut self, response: Response<Bytes>) {
        self.0.lock().unwrap().push(response)
    }
}

#[tokio::test]
async fn closed_connection_skips_write() {
    let ran = counter();
    let mut c = Controller::new("c");
    let r = Arc::clone(&ran);
    c.register_sync("/", &[], move |ctx| {
        r.fetch_add(1, Ordering::SeqCst);
        assert!(ctx.is_closed());
        ctx.send_status(StatusCode::OK);
        Ok(())
    });

    let router = Router::configure([c]).unwrap();
    let sink = Gone::default();
    router.accept(req(Method::GET, "/"), sink.clone()).await;
    router.accept(req(Method::GET, "/missing"), sink.clone()).await;

    assert_eq!(ran.load(Ordering::SeqCst), 1);
    assert!(sink.0.lock().unwrap().is_empty());
}

#[tokio::test]
async fn suspended_handlers_interleave() {
    let notify = Arc::new(Notify::new());

    let mut c = Controller::new("c");
    let n = Arc::clone(&notify);
    c.get("/wait", move |ctx| {
        let n = Arc::clone(&n);
        Box::pin(async move {
            n.notified().await;
            tokio::task::yield_now().await;
            ctx.send_text("waited", StatusCode::OK);
            Ok(())
        })
    });
    let n = Arc::clone(&notify);
    c.get("/go", move |ctx| {
        n.notify_one();
        Box::pin(async move {
            ctx.send_text("went", StatusCode::OK);
            Ok(())
        })
    });

    let router = Router::configure([c]).unwrap();
    let (waited, went) = tokio::join!(
        router.handle(req(Method::GET, "/wait")),
        router.handle(req(Method::GET, "/go")),
    );
    assert_eq!(waited.body(), "waited");
    assert_eq!(went.body(), "went");
}

#[tokio::test]
async fn custom_not_found_body() {
    let config = RouterConfig::from_toml_str("not_found_body = \"nothing here\"").unwrap();
    let router = Router::configure_with(config, Vec::<Controller>::new()).unwrap();
    let res = router.handle(req(Method::GET, "/")).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(res.body(), "nothing here");
}

#[test]
fn find_is_idempotent() {
    let mut c = Controller::new("c");
    text_route(&mut c, "/a/:x", &[Method::GET], "a");
    text_route(&mut c, "/*", &[], "root");
    failure_text(&mut c, "/a/*", &[Kind::Http], "http");
    let router = Router::configure([c]).unwrap();

    let (r1, p1) = router.find(&Method::GET, "/a/1").unwrap();
    let (r2, p2) = router.find(&Method::GET, "/a/1").unwrap();
    assert!(std::ptr::eq(r1, r2));
    assert_eq!(p1.get("x"), p2.get("x"));
    assert_eq!(r1.pattern().as_str(), "/a/:x");

    let f1 = router.find_failure("/a/1", Kind::NotFound).unwrap();
    let f2 = router.find_failure("/a/1", Kind::NotFound).unwrap();
    assert!(std::ptr::eq(f1, f2));
    assert!(router.find_failure("/a/1", Kind::Io).is_none());
    assert!(router.find_failure("/b", Kind::NotFound).is_none());
}

#[test]
fn cross_controller_collision_is_fatal() {
    let mut a = Controller::new("a");
    text_route(&mut a, "/items/:id", &[Method::GET], "a");
    let mut b = Controller::new("b");
    text_route(&mut b, "/items/:item", &[], "b");

    let err = Router::configure([a, b]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "pattern collision occurred: pattern = \"/items/:item\", method = GET, owners = (\"a\", \"b\")"
    );
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Store {
    Any,
    Db,
    DbTimeout,
    Cache,
}

impl FailureKind for Store {
    fn parent(self) -> Option<Self> {
        match self {
            Store::Any => None,
            Store::Db | Store::Cache => Some(Store::Any),
            Store::DbTimeout => Some(Store::Db),
        }
    }

    fn unhandled() -> Self {
        Store::Any
    }

    fn status(self) -> StatusCode {
        match self {
            Store::DbTimeout => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[tokio::test]
async fn custom_failure_kinds() {
    let mut c: Controller<Store> = Controller::with_kinds("store");
    c.register_sync("/db", &[], |_| Err(Failure::new(Store::DbTimeout)));
    c.register_sync("/cache", &[], |_| Err(Failure::new(Store::Cache)));
    c.register_failure_sync("/*", &[Store::Db], |ctx: &mut RequestContext<Store>| {
        let status = ctx.failure_status();
        ctx.send_text("db", status);
        Ok(())
    });
    c.register_failure_sync("/*", &[], |ctx: &mut RequestContext<Store>| {
        ctx.send_text("any", StatusCode::INTERNAL_SERVER_ERROR);
        Ok(())
    });

    let router = Router::configure([c]).unwrap();
    let res = router.handle(req(Method::GET, "/db")).await;
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(res.body(), "db");
    let res = router.handle(req(Method::GET, "/cache")).await;
    assert_eq!(res.body(), "any");
}
