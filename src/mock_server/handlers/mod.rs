//! HTTP request handlers for the mock server.

pub mod auth;
pub mod catalogs;
pub mod tickets;

pub use auth::*;
pub use catalogs::*;
pub use tickets::*;
