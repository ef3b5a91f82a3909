//! Application directory.
//!
//! - `packages`: the package-info collaborator trait and its entry type
//! - `builder`: concurrent labelling and canonical sorting

pub mod builder;
pub mod packages;

pub use builder::{DirectoryBuild, DirectoryBuilder};
pub use packages::{PackageEntry, PackageInfo};
