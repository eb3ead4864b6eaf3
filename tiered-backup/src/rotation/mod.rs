//! Rotation core: tier classification, archive naming and retention.

pub mod naming;
pub mod retention;
pub mod tier;

pub use naming::{ArchiveDescriptor, BackupIdentity, CompressionKind, IdentityError, NameError};
pub use retention::{DeletionPlan, RetentionEngine, RetentionPolicy, TierPlan};
pub use tier::{classify, RotationTier};
