//! Filesystem helpers: staging areas, tree copies and destination listings.

pub mod listing;
pub mod metadata;
pub mod staging;
pub mod walker;

pub use listing::list_files;
pub use staging::StagingArea;
