//! stainquant-test - Regression test framework for stainquant
//!
//! A small regression harness: every check increments an index, failures
//! are collected instead of panicking, and [`RegParams::cleanup`] reports
//! the outcome.
//!
//! # Usage
//!
//! ```ignore
//! use stainquant_test::RegParams;
//!
//! let mut rp = RegParams::new("particles");
//! rp.compare_values(4.0, area as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: "compare" (default) or "display" (keep artefacts)

mod error;
pub mod fixtures;
mod params;

pub use error::{TestError, TestResult};
pub use params::{RegParams, RegTestMode};

/// Get the path to the workspace root
fn workspace_root() -> String {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    // stainquant-test is at crates/stainquant-test, so go up two directories
    format!("{}/../..", manifest_dir)
}

/// Get the path to the regout (regression output) directory
pub fn regout_dir() -> String {
    format!("{}/tests/regout", workspace_root())
}
