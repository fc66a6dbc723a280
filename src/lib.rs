//! spicebind - build the CSPICE Python extension
//!
//! This library turns a SWIG interface definition for the CSPICE toolkit
//! into a loadable Python extension by running the interface generator,
//! the C compiler and the linker as one validated pipeline.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`cli`] - Command-line interface parsing and output formatting
//! - [`core`] - Configuration, artifact naming and the build pipeline
//! - [`infra`] - Infrastructure layer (filesystem, processes)
//! - [`config`] - Configuration constants
//! - [`error`] - Error types and handling

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod infra;

#[cfg(test)]
pub mod test_utils;
