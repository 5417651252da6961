//! # Core Module
//!
//! Stateless building blocks of a dose run: the parameter models, the pure
//! derivation from collection parameters to simulator parameters, structure
//! reference resolution and the simulator's file formats.
//!
//! - **Models** ([`models`]) - Collection, simulation and dose result types
//! - **Derivation** ([`derive`]) - Collection parameters to native simulator parameters
//! - **Structure** ([`structure`]) - Local file, registry code or bundled default model
//! - **File I/O** ([`io`]) - Input template patching and result readers

pub mod derive;
pub mod io;
pub mod models;
pub mod structure;
