//! Business services
//!
//! Handlers validate and delegate here; services own authorization,
//! cross-collection composition, and counter maintenance.

pub mod feed;
pub mod profile;
pub mod video;

pub use feed::{FeedPage, FeedService, FeedVideo, PageRequest, Pagination};
pub use profile::{NewProfile, ProfilePatch, ProfileService};
pub use video::{NewVideo, VideoPatch, VideoService};
