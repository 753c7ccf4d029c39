//! Pipeline entry points for the publication workflow.
//!
//! - `run_autopost`: detect candidates and publish them end to end

pub mod run;

pub use run::{Autoposter, ItemOutcome, RunSummary, run_autopost};
