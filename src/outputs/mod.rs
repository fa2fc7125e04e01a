//! Output generation.
//!
//! - [`json`]: per-source batch artifacts named by run date
pub mod json;
