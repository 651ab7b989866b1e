//! Provides the client for the upstream air-quality data provider.
//!
//! Includes:
//! - `waqi`: Client for the World Air Quality Index API (`api.waqi.info`).

mod waqi;
#[cfg(test)]
mod waqi_test;

pub use waqi::*;
