//! # Core Models Module
//!
//! - [`collection`] - Collection parameters as entered by a user, and their validation
//! - [`simulation`] - The simulator's native parameter set and its input directives
//! - [`dose`] - Summary, histogram and dose-volume results of a run

pub mod collection;
pub mod dose;
pub mod simulation;
