//! # Engine Module
//!
//! The stateful side of a dose run: where files live, which flux to use, how
//! the external simulator is launched and what it leaves behind in the run log.
//!
//! - **Configuration** ([`config`]) - Run configuration and its builder
//! - **Paths** ([`paths`]) - Working-directory layout and the per-directory run lock
//! - **Flux** ([`flux`]) - The live-flux capability and its fallback
//! - **Runner** ([`runner`]) - Simulator invocation and the per-run log
//! - **Progress Monitoring** ([`progress`]) - Phase callbacks for front ends
//! - **Error Handling** ([`error`]) - The aggregated [`error::EngineError`]

pub mod config;
pub mod error;
pub mod flux;
pub mod paths;
pub mod progress;
pub mod runner;
