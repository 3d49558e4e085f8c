//! `ProfileStore` trait — single async interface over the append-only
//! profile history.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::profile::Profile;

/// Backend-agnostic profile persistence.
///
/// The store is append-only: completing the collection flow appends a new
/// record, and the "current" profile for a user is the most recently
/// appended record that still parses fully. Malformed historical rows are
/// skipped during lookup, never surfaced.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Durably append one completed profile record.
    async fn append(&self, profile: &Profile) -> Result<(), StorageError>;

    /// Most recent fully-valid record for `user_id`, scanning newest to
    /// oldest. Rows with missing or non-coercible fields are skipped.
    async fn latest_valid_for(&self, user_id: &str) -> Result<Option<Profile>, StorageError>;
}
