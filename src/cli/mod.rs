//! Handles command-line and environment configuration.
//!
//! Includes the `clap` argument definitions (every flag can also be supplied via an
//! environment variable or a `.env` file) and the validated `Config` built from them.

mod config;

pub use config::*;
