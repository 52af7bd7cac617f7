pub mod categorize;
pub mod sections;

pub use categorize::{categorize_commit, detect_breaking_change, Category};
pub use sections::{build_release_notes, NoteEntry, ReleaseNotes, ReleaseSection};
