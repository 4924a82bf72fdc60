use crate::context::{build_response, TEXT};
use crate::error::{ConfigError, Failure};
use crate::kind::FailureKind;

use std::fs;
use std::path::Path;

use bytes::Bytes;
use http::{Response, StatusCode};
use serde::Deserialize;

/// Router settings, loadable from TOML.
///
/// ```toml
/// not_found_body = "nothing here"
/// internal_error_body = "oops"
/// expose_failure_details = true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    pub not_found_body: String,
    pub internal_error_body: String,
    /// Appends the failure's description to the default 500 body.
    pub expose_failure_details: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            not_found_body: "404 Not Found".into(),
            internal_error_body: "500 Internal Server Error".into(),
            expose_failure_details: false,
        }
    }
}

impl RouterConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub(crate) fn not_found(&self) -> Response<Bytes> {
        build_response(StatusCode::NOT_FOUND, TEXT, self.not_found_body.clone())
    }

    pub(crate) fn internal_error<K: FailureKind>(
        &self,
        failure: Option<&Failure<K>>,
    ) -> Response<Bytes> {
        let body = match failure {
            Some(f) if self.expose_failure_details => {
                format!("{}: {}", self.internal_error_body, f)
            }
            _ => self.internal_error_body.clone(),
        };
        build_response(StatusCode::INTERNAL_SERVER_ERROR, TEXT, body)
    }
}
