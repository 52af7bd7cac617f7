pub mod discovery;
pub mod repo;
pub mod tag;

pub use discovery::{
    resolve_range, CommitRecord, DiscoveryRequest, RangeContext, RangeResolver, RangeResult,
    SinceRef,
};
pub use repo::GitRepo;
pub use tag::{list_release_tags, Tag, VersionKey};
