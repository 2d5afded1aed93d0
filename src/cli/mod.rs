//! Command Line Interface (CLI) layer for eoprep.
//!
//! This module defines argument parsing (`args`), error types (`errors`),
//! and the orchestration logic (`runner`) dispatching each subcommand to a
//! pipeline stage exposed via `eoprep::api`.
//!
//! If you are embedding eoprep into another application, prefer using
//! the high-level `eoprep::api` module instead of calling the CLI code.
pub mod args;
pub mod errors;
pub mod runner;

pub use args::CliArgs;
pub use runner::run;
