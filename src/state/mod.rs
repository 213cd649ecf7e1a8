// Persisted run state — engagement history and the alerted-post ledger.
//
// Both are small JSON documents loaded once at run start and written back
// once at run end. Writes go to a temp file in the same directory and are
// renamed into place, so a crash mid-write leaves the previous file intact.

pub mod history;
pub mod ledger;
pub mod store;

pub use history::{EngagementHistory, EngagementSnapshot};
pub use ledger::AlertedLedger;
