//! HTTP surface: the lookup page and a small JSON API.

pub mod routes;
pub mod ui;

pub use routes::{app, serve, AppState};
