mod scan;

pub use self::scan::Scanned;

use crate::context::RequestContext;
use crate::handler::{AsyncFn, BoxFuture, BoxHandler, Handler, HandlerResult, SyncFn};
use crate::kind::{FailureKind, Kind};

use std::sync::Arc;

use http::Method;
use smallvec::SmallVec;

/// A named group of handler bindings.
///
/// Bindings are declared explicitly and validated by [`Controller::scan`].
/// A binding registered through one of the `register_failure*` methods is a
/// failure route; every other binding is a route.
pub struct Controller<K = Kind> {
    name: Arc<str>,
    entries: Vec<Entry<K>>,
}

enum Entry<K> {
    Binding(Binding<K>),
    Mount(Box<str>, Controller<K>),
}

struct Binding<K> {
    pattern: Box<str>,
    methods: SmallVec<[Method; 4]>,
    on_fail: Option<SmallVec<[K; 4]>>,
    handler: BoxHandler<K>,
}

impl Controller<Kind> {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self::with_kinds(name)
    }
}

impl<K: FailureKind> Controller<K> {
    pub fn with_kinds(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Binds `handler` to `pattern` for `methods`, or for any method when
    /// `methods` is empty.
    pub fn register<F>(&mut self, pattern: &str, methods: &[Method], handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut RequestContext<K>) -> BoxFuture<'a, HandlerResult<K>>
            + Send
            + Sync
            + 'static,
    {
        self.register_handler(pattern, methods, None, AsyncFn(handler))
    }

    pub fn register_sync<F>(&mut self, pattern: &str, methods: &[Method], handler: F) -> &mut Self
    where
        F: Fn(&mut RequestContext<K>) -> HandlerResult<K> + Send + Sync + 'static,
    {
        self.register_handler(pattern, methods, None, SyncFn(handler))
    }

    /// Binds a failure handler for failures whose kind is, or descends from,
    /// one of `kinds`. An empty `kinds` catches every failure.
    pub fn register_failure<F>(&mut self, pattern: &str, kinds: &[K], handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut RequestContext<K>) -> BoxFuture<'a, HandlerResult<K>>
            + Send
            + Sync
            + 'static,
    {
        self.register_handler(pattern, &[], Some(kinds), AsyncFn(handler))
    }

    pub fn register_failure_sync<F>(&mut self, pattern: &str, kinds: &[K], handler: F) -> &mut Self
    where
        F: Fn(&mut RequestContext<K>) -> HandlerResult<K> + Send + Sync + 'static,
    {
        self.register_handler(pattern, &[], Some(kinds), SyncFn(handler))
    }

    pub fn register_handler(
        &mut self,
        pattern: &str,
        methods: &[Method],
        on_fail: Option<&[K]>,
        handler: impl Handler<K>,
    ) -> &mut Self {
        self.entries.push(Entry::Binding(Binding {
            pattern: pattern.into(),
            methods: methods.iter().cloned().collect(),
            on_fail: on_fail.map(|kinds| kinds.iter().copied().collect()),
            handler: Arc::new(handler),
        }));
        self
    }

    pub fn endpoint<F>(&mut self, pattern: &str, handler: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut RequestContext<K>) -> BoxFuture<'a, HandlerResult<K>>
            + Send
            + Sync
            + 'static,
    {
        self.register(pattern, &[], handler)
    }

    pub fn mount(&mut self, prefix: &str, controller: Controller<K>) -> &mut Self {
        self.entries.push(Entry::Mount(prefix.into(), controller));
        self
    }

    /// Declares bindings under `prefix` on behalf of this controller.
    pub fn nest(&mut self, prefix: &str, f: impl FnOnce(&mut Controller<K>)) -> &mut Self {
        let mut sub = Self::with_kinds(Arc::clone(&self.name));
        f(&mut sub);
        self.mount(prefix, sub)
    }
}

macro_rules! define_method {
    ($name:tt, $method:tt) => {
        pub fn $name<F>(&mut self, pattern: &str, handler: F) -> &mut Self
        where
            F: for<'a> Fn(&'a mut RequestContext<K>) -> BoxFuture<'a, HandlerResult<K>>
                + Send
                + Sync
                + 'static,
        {
            self.register(pattern, &[Method::$method], handler)
        }
    };
}

impl<K: FailureKind> Controller<K> {
    define_method!(get, GET);
    define_method!(post, POST);
    define_method!(put, PUT);
    define_method!(delete, DELETE);
    define_method!(head, HEAD);
    define_method!(options, OPTIONS);
    define_method!(patch, PATCH);
}
