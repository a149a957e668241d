pub mod format;

pub use format::{AuthorView, SubmissionView, TagGroupView};
