//! Canvas record types.
//!
//! A canvas record is the structured artifact built up over a conversation:
//! an ordered list of tagged text fields owned by a single user. The domain
//! expects at most one field per semantic aspect, but tags are not enforced
//! to be unique.

use chrono::{DateTime, Utc};
use canvasmith_core::{CanvasRecordId, UserId};
use serde::{Deserialize, Serialize};

/// A single tagged field within a canvas record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanvasField {
    /// The semantic aspect this field covers (e.g. "Customer Segments").
    pub tag: String,
    /// The field content.
    pub content: String,
}

impl CanvasField {
    /// Creates a new field.
    #[must_use]
    pub fn new(tag: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            content: content.into(),
        }
    }
}

/// A canvas record: the ordered list of fields a conversation has elicited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasRecord {
    /// Unique record identifier.
    pub id: CanvasRecordId,
    /// The user who owns this record.
    pub user_id: UserId,
    /// Whether the record is publicly visible.
    pub public: bool,
    /// Ordered field list.
    pub fields: Vec<CanvasField>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last updated.
    pub updated_at: DateTime<Utc>,
}

impl CanvasRecord {
    /// Creates a new private record with the given fields.
    #[must_use]
    pub fn new(user_id: UserId, fields: Vec<CanvasField>) -> Self {
        let now = Utc::now();
        Self {
            id: CanvasRecordId::new(),
            user_id,
            public: false,
            fields,
            created_at: now,
            updated_at: now,
        }
    }

    /// Sets the record's visibility.
    pub fn set_public(&mut self, public: bool) {
        self.public = public;
        self.updated_at = Utc::now();
    }

    /// Replaces the full field list.
    ///
    /// This is a replace, not a merge: any tag omitted from `fields` is gone
    /// afterwards. Callers are responsible for submitting the union of
    /// previously known and newly learned fields.
    pub fn replace_fields(&mut self, fields: Vec<CanvasField>) {
        self.fields = fields;
        self.updated_at = Utc::now();
    }

    /// Looks up a field by tag, returning the first match.
    #[must_use]
    pub fn field(&self, tag: &str) -> Option<&CanvasField> {
        self.fields.iter().find(|f| f.tag == tag)
    }
}
