// Trendwatch: trending post detection and email alerts for X
//
// This is the library root. Each module corresponds to one stage of a
// polling run: fetch posts, detect trends, notify, persist state.

pub mod config;
pub mod error;
pub mod notify;
pub mod output;
pub mod pipeline;
pub mod source;
pub mod state;
pub mod status;
pub mod trends;
