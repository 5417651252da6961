//! # rd3d Core Library
//!
//! Prepares, runs and reads back the RADDOSE-3D radiation-dose simulator for
//! macromolecular crystallography experiments.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer architecture:
//!
//! - **[`core`]: The Foundation.** Stateless data models, the pure derivation of
//!   simulator parameters, structure-reference resolution and file formats.
//!
//! - **[`engine`]: The Run Machinery.** Run configuration, working-directory
//!   layout and locking, the live-flux capability, simulator invocation with its
//!   per-run log, and progress reporting.
//!
//! - **[`workflows`]: The Public API.** Ties `engine` and `core` together into
//!   the complete dose calculation.

pub mod core;
pub mod engine;
pub mod workflows;
