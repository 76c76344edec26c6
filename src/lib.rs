//! snaplink - a URL shortener with expiring links and click analytics.
//!
//! The lifecycle engine lives in [`services`] and [`store`]; [`routes`] and
//! [`server`] expose it over HTTP.

pub mod admin;
pub mod config;
pub mod error;
pub mod jobs;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod services;
pub mod state;
pub mod store;
pub mod util;
