//! Storage contract for canvas records.

use crate::error::CanvasError;
use crate::record::{CanvasField, CanvasRecord};
use async_trait::async_trait;
use canvasmith_core::{CanvasRecordId, UserId};

/// Trait for canvas record storage.
///
/// Ownership checks live in the store so that "missing" and "not yours" are
/// indistinguishable to callers: both surface as [`CanvasError::NotFound`].
#[async_trait]
pub trait CanvasStore: Send + Sync {
    /// Persists a new record.
    async fn create(&self, record: &CanvasRecord) -> Result<(), CanvasError>;

    /// Fetches a record by ID regardless of visibility.
    async fn find_by_id(&self, id: CanvasRecordId) -> Result<Option<CanvasRecord>, CanvasError>;

    /// Lists all public records, newest first.
    async fn list_public(&self) -> Result<Vec<CanvasRecord>, CanvasError>;

    /// Replaces the full field list of a record owned by `owner`.
    ///
    /// Fails with [`CanvasError::NotFound`] when no record with that ID is
    /// owned by the caller. Full-replace semantics: the stored field list
    /// becomes exactly `fields`.
    async fn replace_fields(
        &self,
        id: CanvasRecordId,
        owner: UserId,
        fields: Vec<CanvasField>,
    ) -> Result<CanvasRecord, CanvasError>;

    /// Sets the visibility of a record owned by `owner`.
    ///
    /// Fails with [`CanvasError::NotFound`] when no record with that ID is
    /// owned by the caller.
    async fn set_public(
        &self,
        id: CanvasRecordId,
        owner: UserId,
        public: bool,
    ) -> Result<CanvasRecord, CanvasError>;
}
