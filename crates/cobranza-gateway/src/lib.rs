//! HTTP gateway exposing the reminder service to the billing frontend.

pub mod dashboard;
pub mod routes;
pub mod server;

pub use server::{AppState, build_router, start};
