pub mod feed;
pub mod snapshot;
pub mod types;

pub use feed::{FeedSource, FileFeedSource, HttpFeedSource};
pub use snapshot::{build_snapshot, ParseError};
pub use types::RawFeed;
