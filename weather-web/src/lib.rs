//! HTTP front end for the city weather page.
//!
//! This crate focuses on:
//! - Routing the form and result pages
//! - Rendering the view model to HTML
//! - Logging setup shared by the binary

pub mod logging;
pub mod routes;
pub mod startup;
pub mod templates;

pub use logging::{get_log_level, setup_logger};
pub use startup::{AppState, app, build_app_state};
