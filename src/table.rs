use crate::context::Params;
use crate::error::ConfigError;
use crate::handler::BoxHandler;
use crate::kind::FailureKind;
use crate::pattern::{split_path, RoutePattern};

use std::cmp::Reverse;
use std::fmt;
use std::sync::Arc;

use http::Method;
use smallvec::SmallVec;
use tracing::debug;

/// The methods a route accepts. Empty means any method.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSet(SmallVec<[Method; 4]>);

impl MethodSet {
    pub fn any() -> Self {
        Self(SmallVec::new())
    }

    pub fn new(methods: &[Method]) -> Self {
        let mut set: SmallVec<[Method; 4]> = SmallVec::with_capacity(methods.len());
        for m in methods {
            if !set.contains(m) {
                set.push(m.clone());
            }
        }
        Self(set)
    }

    pub fn is_any(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, method: &Method) -> bool {
        self.is_any() || self.0.contains(method)
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        self.is_any() || other.is_any() || self.0.iter().any(|m| other.0.contains(m))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Method> + '_ {
        self.0.iter()
    }

    fn shared(&self, other: &Self) -> Option<Method> {
        self.0
            .iter()
            .find(|m| other.contains(m))
            .or_else(|| other.0.iter().find(|m| self.contains(m)))
            .cloned()
    }
}

impl fmt::Display for MethodSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_any() {
            return f.write_str("*");
        }
        for (i, m) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(m.as_str())?;
        }
        Ok(())
    }
}

pub struct Route<K> {
    pattern: RoutePattern,
    methods: MethodSet,
    handler: BoxHandler<K>,
    owner: Arc<str>,
}

impl<K: FailureKind> Route<K> {
    pub fn new(
        pattern: RoutePattern,
        methods: MethodSet,
        handler: BoxHandler<K>,
        owner: Arc<str>,
    ) -> Self {
        Self {
            pattern,
            methods,
            handler,
            owner,
        }
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn methods(&self) -> &MethodSet {
        &self.methods
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub(crate) fn handler(&self) -> &BoxHandler<K> {
        &self.handler
    }

    pub(crate) fn owner_arc(&self) -> Arc<str> {
        Arc::clone(&self.owner)
    }
}

impl<K> fmt::Debug for Route<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("pattern", &self.pattern.as_str())
            .field("methods", &format_args!("{}", self.methods))
            .field("owner", &self.owner)
            .finish()
    }
}

pub struct FailureRoute<K> {
    pattern: RoutePattern,
    filter: SmallVec<[K; 4]>,
    handler: BoxHandler<K>,
    owner: Arc<str>,
}

impl<K: FailureKind> FailureRoute<K> {
    pub fn new(
        pattern: RoutePattern,
        filter: &[K],
        handler: BoxHandler<K>,
        owner: Arc<str>,
    ) -> Self {
        Self {
            pattern,
            filter: filter.iter().copied().collect(),
            handler,
            owner,
        }
    }

    pub fn pattern(&self) -> &RoutePattern {
        &self.pattern
    }

    pub fn filter(&self) -> &[K] {
        &self.filter
    }

    pub fn is_catch_all(&self) -> bool {
        self.filter.is_empty()
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn catches(&self, kind: K) -> bool {
        self.is_catch_all() || kind.lineage().any(|k| self.filter.contains(&k))
    }

    pub(crate) fn handler(&self) -> &BoxHandler<K> {
        &self.handler
    }
}

impl<K: fmt::Debug> fmt::Debug for FailureRoute<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FailureRoute")
            .field("pattern", &self.pattern.as_str())
            .field("filter", &self.filter)
            .field("owner", &self.owner)
            .finish()
    }
}

pub(crate) fn check_unique<K: FailureKind>(routes: &[Route<K>]) -> Result<(), ConfigError> {
    for (i, route) in routes.iter().enumerate() {
        let existing = routes[..i].iter().find(|prev| {
            prev.pattern.same_shape(&route.pattern) && prev.methods.overlaps(&route.methods)
        });
        if let Some(prev) = existing {
            return Err(ConfigError::Collision {
                pattern: route.pattern.as_str().into(),
                method: prev.methods.shared(&route.methods),
                existing: Box::from(&*prev.owner),
                owner: Box::from(&*route.owner),
            });
        }
    }
    Ok(())
}

/// Routes in descending specificity. Equal specificity keeps registration
/// order.
#[derive(Debug)]
pub struct RouteTable<K> {
    routes: Vec<Route<K>>,
}

impl<K: FailureKind> RouteTable<K> {
    pub fn build(mut routes: Vec<Route<K>>) -> Result<Self, ConfigError> {
        check_unique(&routes)?;
        routes.sort_by(|a, b| b.pattern.specificity().cmp(&a.pattern.specificity()));
        for r in &routes {
            debug!(
                pattern = %r.pattern,
                methods = %r.methods,
                owner = %r.owner,
                "route"
            );
        }
        Ok(Self { routes })
    }

    pub fn find<'s>(&'s self, method: &Method, path: &str) -> Option<(&'s Route<K>, Params)> {
        let parts = split_path(path);
        self.routes.iter().find_map(|route| {
            if !route.methods.contains(method) {
                return None;
            }
            let mut params = Params::default();
            if route.pattern.capture(&parts, &mut params) {
                Some((route, params))
            } else {
                None
            }
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Route<K>> + '_ {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

/// Failure routes in descending specificity, filtered routes ahead of
/// catch-all routes of equal specificity. Otherwise registration order.
#[derive(Debug)]
pub struct FailureTable<K> {
    routes: Vec<FailureRoute<K>>,
}

impl<K: FailureKind> FailureTable<K> {
    pub fn build(mut routes: Vec<FailureRoute<K>>) -> Self {
        routes.sort_by_key(|r| (Reverse(r.pattern.specificity()), r.is_catch_all()));
        for r in &routes {
            debug!(
                pattern = %r.pattern,
                filter = ?r.filter,
                owner = %r.owner,
                "failure route"
            );
        }
        Self { routes }
    }

    pub fn find(&self, path: &str, kind: K) -> Option<&FailureRoute<K>> {
        let parts = split_path(path);
        self.routes
            .iter()
            .find(|r| r.pattern.accepts(&parts) && r.catches(kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = &FailureRoute<K>> + '_ {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
