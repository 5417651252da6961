//! Reading and writing the simulator's files.
//!
//! [`template`] patches the line-oriented input file in place; [`results`]
//! reads the summary CSV, the histogram in the summary text and the
//! per-voxel dose state.

pub mod results;
pub mod template;
