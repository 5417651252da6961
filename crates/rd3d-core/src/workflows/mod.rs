//! # Workflows Module
//!
//! - **Dose Workflow** ([`dose`]) - Validate, derive, patch the input, run the
//!   simulator and read the results back.

pub mod dose;
