//! Core business logic module
//!
//! This module contains the build logic for spicebind. Process and
//! filesystem access go through [`crate::infra`].
//!
//! # Submodules
//!
//! - [`config`] - Configuration merging and validation
//! - [`platform`] - Per-platform link settings
//! - [`artifacts`] - Deterministic artifact naming
//! - [`pipeline`] - The generate/compile/link pipeline
//! - [`clean`] - Clean build artifacts logic
//! - [`doctor`] - Tool and configuration checks

pub mod artifacts;
pub mod clean;
pub mod config;
pub mod doctor;
pub mod pipeline;
pub mod platform;
