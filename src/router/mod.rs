mod dispatch;

use crate::config::RouterConfig;
use crate::context::Params;
use crate::controller::Controller;
use crate::error::ConfigError;
use crate::kind::{FailureKind, Kind};
use crate::table::{FailureRoute, FailureTable, Route, RouteTable};

use http::Method;
use tracing::info;

/// Dispatches requests to routes and failures to failure routes.
///
/// Built once from a set of controllers, then read-only. Share it with
/// `Arc` to serve concurrent requests.
#[derive(Debug)]
pub struct Router<K = Kind> {
    routes: RouteTable<K>,
    failures: FailureTable<K>,
    config: RouterConfig,
}

impl<K: FailureKind> Router<K> {
    pub fn configure<I>(controllers: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Controller<K>>,
    {
        Self::configure_with(RouterConfig::default(), controllers)
    }

    /// Scans every controller in order and builds both tables.
    ///
    /// Route uniqueness is checked across all controllers. Ties in
    /// specificity keep the order in which controllers are given.
    pub fn configure_with<I>(config: RouterConfig, controllers: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = Controller<K>>,
    {
        let mut routes = Vec::new();
        let mut failure_routes = Vec::new();
        for c in controllers {
            let scanned = c.scan()?;
            routes.extend(scanned.routes);
            failure_routes.extend(scanned.failure_routes);
        }
        let router = Self::from_tables(
            config,
            RouteTable::build(routes)?,
            FailureTable::build(failure_routes),
        );
        info!(
            routes = router.routes.len(),
            failure_routes = router.failures.len(),
            "routing configured"
        );
        Ok(router)
    }

    pub fn from_tables(config: RouterConfig, routes: RouteTable<K>, failures: FailureTable<K>) -> Self {
        Self {
            routes,
            failures,
            config,
        }
    }

    pub fn routes(&self) -> &RouteTable<K> {
        &self.routes
    }

    pub fn failures(&self) -> &FailureTable<K> {
        &self.failures
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    pub fn find<'s>(&'s self, method: &Method, path: &str) -> Option<(&'s Route<K>, Params)> {
        self.routes.find(method, path)
    }

    pub fn find_failure(&self, path: &str, kind: K) -> Option<&FailureRoute<K>> {
        self.failures.find(path, kind)
    }
}
