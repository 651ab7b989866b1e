//! Defines the data structures used throughout the application.
//!
//! This covers the proxy's request body, the WAQI response envelope and
//! search entries, and the simplified suggestion records sent to the browser.

mod waqi;

pub use waqi::*;
