// Core modules
pub mod config;
pub mod error;
pub mod git;
pub mod notes;
pub mod pipeline;

pub use config::Config;
pub use error::{ReleaseError, Stage, StageError};
pub use git::{
    CommitRecord, DiscoveryRequest, GitRepo, RangeContext, RangeResolver, RangeResult, SinceRef,
    Tag, VersionKey,
};
pub use notes::{build_release_notes, Category, NoteEntry, ReleaseNotes, ReleaseSection};
pub use pipeline::{run_pipeline, PipelineReport};
