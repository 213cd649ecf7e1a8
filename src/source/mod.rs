// Post sources — where posts and their engagement counts come from.
//
// The PostSource trait is the seam; the official X API v2 and the RapidAPI
// proxy are the two implementations. Exactly one is selected from the
// configured credentials.

pub mod client;
pub mod official;
pub mod post;
pub mod rapidapi;
pub mod retry;
pub mod traits;
