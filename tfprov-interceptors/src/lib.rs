//! Cross-cutting interceptors shared by every resource type.

pub mod region;
pub mod tags;
pub mod identity;
pub mod importer;

pub use identity::IdentityInterceptor;
pub use region::{DefaultRegion, ForceNewIfRegionChanges, ImportRegion, InjectRegionAttribute, SetRegionInState, ValidateRegion};
pub use tags::{DataSourceTagging, SetTagsAll, TagsSpec, TransparentTagging, ValidateRequiredTags};
