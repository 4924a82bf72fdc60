#![forbid(unsafe_code)]

mod service;

pub use self::service::{serve, RouterService};
