use super::{Binding, Controller, Entry};

use crate::error::ConfigError;
use crate::kind::FailureKind;
use crate::pattern::{PatternError, RoutePattern};
use crate::table::{check_unique, FailureRoute, MethodSet, Route};

use std::sync::Arc;

/// The routes and failure routes declared by one controller, in declaration
/// order.
pub struct Scanned<K> {
    pub routes: Vec<Route<K>>,
    pub failure_routes: Vec<FailureRoute<K>>,
}

impl<K> Default for Scanned<K> {
    fn default() -> Self {
        Self {
            routes: Vec::new(),
            failure_routes: Vec::new(),
        }
    }
}

impl<K: FailureKind> Controller<K> {
    /// Validates every binding and turns it into a route or failure route.
    ///
    /// Fails when a binding has no path or a malformed pattern, or when two
    /// routes of this controller (mounted ones included) collide.
    pub fn scan(&self) -> Result<Scanned<K>, ConfigError> {
        let mut scanned = Scanned::default();
        self.scan_into(None, &mut scanned)?;
        check_unique(&scanned.routes)?;
        Ok(scanned)
    }

    fn scan_into(&self, prefix: Option<&str>, out: &mut Scanned<K>) -> Result<(), ConfigError> {
        for entry in &self.entries {
            match entry {
                Entry::Binding(b) => self.scan_binding(prefix, b, out)?,
                Entry::Mount(sub_prefix, sub) => {
                    let full = match prefix {
                        Some(p) => RoutePattern::join(p, sub_prefix),
                        None => sub_prefix.to_string(),
                    };
                    let parsed = self.parse(&full)?;
                    if parsed.is_wildcard() {
                        return Err(self.malformed(
                            &full,
                            "wildcard pattern can not be used for router prefix",
                        ));
                    }
                    sub.scan_into(Some(&full), out)?;
                }
            }
        }
        Ok(())
    }

    fn scan_binding(
        &self,
        prefix: Option<&str>,
        binding: &Binding<K>,
        out: &mut Scanned<K>,
    ) -> Result<(), ConfigError> {
        if binding.pattern.is_empty() {
            return Err(ConfigError::MissingPath {
                owner: self.owner(),
            });
        }
        let full = match prefix {
            Some(p) => RoutePattern::join(p, &binding.pattern),
            None => binding.pattern.to_string(),
        };
        let pattern = self.parse(&full)?;
        let handler = Arc::clone(&binding.handler);
        let owner = Arc::clone(&self.name);

        match binding.on_fail {
            Some(ref kinds) => out
                .failure_routes
                .push(FailureRoute::new(pattern, kinds, handler, owner)),
            None => out.routes.push(Route::new(
                pattern,
                MethodSet::new(&binding.methods),
                handler,
                owner,
            )),
        }
        Ok(())
    }

    fn parse(&self, pattern: &str) -> Result<RoutePattern, ConfigError> {
        RoutePattern::parse(pattern).map_err(|e| match e {
            PatternError::Empty => ConfigError::MissingPath {
                owner: self.owner(),
            },
            _ => self.malformed(pattern, e.reason()),
        })
    }

    fn malformed(&self, pattern: &str, reason: &'static str) -> ConfigError {
        ConfigError::MalformedPattern {
            pattern: pattern.into(),
            owner: self.owner(),
            reason,
        }
    }

    fn owner(&self) -> Box<str> {
        Box::from(&*self.name)
    }
}
