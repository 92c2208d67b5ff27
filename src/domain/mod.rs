pub mod source;
pub mod story;
pub mod sync_record;

pub use source::{Source, SourceBase, SourceSelection};
pub use story::{Story, StoryBase, StoryExtra};
pub use sync_record::SyncRecord;
