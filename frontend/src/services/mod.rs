//! Browser and backend services.
//!
//! This module provides the seams between controllers and the outside world:
//!
//! # Services
//!
//! - [`browser`] - object URLs, clock and navigation
//! - [`api`] - JSON and preview requests to the filedrop server
//! - [`transport`] - multipart upload with progress events
//!
//! Each service is a trait with one browser implementation; tests provide
//! recording fakes instead.

pub mod api;
pub mod browser;
pub mod transport;

pub use api::*;
pub use browser::*;
pub use transport::*;
