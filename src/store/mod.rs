pub mod file;

use crate::app::Result;
use crate::domain::FeedSnapshot;

pub use file::FileSnapshotStore;

pub trait SnapshotStore {
    /// Last persisted snapshot for `source_id`, or `None` on the first run.
    fn load(&self, source_id: &str) -> Result<Option<FeedSnapshot>>;

    /// Replace the snapshot for `source_id`. Either the whole new snapshot is
    /// visible afterwards or the previous one is left untouched.
    fn save(&self, source_id: &str, snapshot: &FeedSnapshot) -> Result<()>;
}
