pub mod cache;
pub mod client;
pub mod error;
pub mod extract;
pub mod search;

pub use cache::{SearchCache, SharedOutcome};
pub use client::FetchClient;
pub use error::{ExtractError, SearchError};
pub use search::{SearchClient, SearchConfig};
