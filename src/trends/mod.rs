// Trend detection — the decision core.
//
// `detector::detect` is a pure function of (posts, history, ledger,
// thresholds, now). Everything with side effects lives in the pipeline.

pub mod alert;
pub mod detector;

pub use alert::{AlertEvent, AlertKind};
pub use detector::{detect, Detection, MalformedRecord, Thresholds};
