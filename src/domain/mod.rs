pub mod item;
pub mod snapshot;
pub mod source;

pub use item::{CandidateItem, NewItem};
pub use snapshot::{FeedEntry, FeedSnapshot};
pub use source::Source;
