#![forbid(unsafe_code)]

//! The `diagonal` terminal demo.
//!
//! Splits the terminal into a code panel on the left and a writing panel on
//! the right, then drives one animator per panel until `q`, `Esc`, `Ctrl+C`,
//! or the optional `--duration-secs` deadline.
//!
//! # Failure Modes
//! - Bad configuration exits with code 2 before the terminal is touched.
//! - Render and corpus failures restore the terminal, print the error, and
//!   exit with code 1.

pub mod app;
pub mod cli;
pub mod embedded;
pub mod error;

pub use cli::{Cli, run_from_env};
pub use error::{DemoError, Result};
