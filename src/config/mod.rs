//! # Configuration Module
//!
//! This module centralizes all configuration constants for gridstore. Wire
//! format constants and default capacities live here so that interdependent
//! values stay co-located and are checked at compile time.
//!
//! - [`constants`]: All numeric configuration values with dependency notes

pub mod constants;
pub use constants::*;
