// Run orchestration: load state -> fetch -> detect -> notify -> persist.

pub mod run;

pub use run::{deliver, run, Delivery, NotifyFailure, RunMode, RunSummary, StatePaths};
