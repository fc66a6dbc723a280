//! Configuration constants
//!
//! File names, environment variable names and default values shared by the
//! CLI and core layers.

pub mod defaults;
pub mod env;
