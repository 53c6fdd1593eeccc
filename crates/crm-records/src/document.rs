//! Uploaded document metadata
//!
//! Only the metadata lives here; `file_url` points at wherever the bytes are
//! kept.

use chrono::{DateTime, Utc};
use crm_rbac::{Owned, ResourceKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecordResult;
use crate::store::Record;
use crate::validate::{self, Validator};

/// A stored document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// MIME type or extension
    pub file_type: String,
    /// Location of the file contents
    pub file_url: String,
    /// Identity that uploaded it (owner)
    pub uploaded_by: Uuid,
    /// Upload time
    pub uploaded_at: DateTime<Utc>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Owned for Document {
    fn owner_id(&self) -> Uuid {
        self.uploaded_by
    }
}

impl Record for Document {
    const KIND: ResourceKind = ResourceKind::Document;

    fn id(&self) -> Uuid {
        self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn touch(&mut self, at: DateTime<Utc>) {
        self.updated_at = at;
    }
}

/// Input for registering an uploaded document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    /// Title
    pub title: Option<String>,
    /// Longer description
    pub description: Option<String>,
    /// MIME type or extension
    pub file_type: Option<String>,
    /// Location of the file contents
    pub file_url: Option<String>,
}

impl NewDocument {
    /// Check required fields.
    pub fn validate(&self) -> RecordResult<()> {
        Validator::new()
            .text("title", &self.title)
            .text("fileType", &self.file_type)
            .text("fileUrl", &self.file_url)
            .finish()
    }

    /// Validate and build the record, owned by `uploader`.
    pub fn into_document(self, uploader: Uuid) -> RecordResult<Document> {
        self.validate()?;
        let now = Utc::now();
        Ok(Document {
            id: Uuid::now_v7(),
            title: validate::required(self.title),
            description: validate::optional(self.description),
            file_type: validate::required(self.file_type),
            file_url: validate::required(self.file_url),
            uploaded_by: uploader,
            uploaded_at: now,
            created_at: now,
            updated_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uploader_owns_document() {
        let uploader = Uuid::now_v7();
        let doc = NewDocument {
            title: Some("Contrat".into()),
            file_type: Some("application/pdf".into()),
            file_url: Some("/uploads/contrat.pdf".into()),
            description: Some("  ".into()),
        }
        .into_document(uploader)
        .unwrap();

        assert_eq!(doc.owner_id(), uploader);
        assert!(doc.description.is_none());
        assert_eq!(doc.uploaded_at, doc.created_at);
    }

    #[test]
    fn test_serialized_owner_field() {
        let doc = NewDocument {
            title: Some("Contrat".into()),
            file_type: Some("pdf".into()),
            file_url: Some("/uploads/c.pdf".into()),
            ..Default::default()
        }
        .into_document(Uuid::now_v7())
        .unwrap();

        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get(ResourceKind::Document.owner_field()).is_some());
    }

    #[test]
    fn test_requires_file_fields() {
        let err = NewDocument {
            title: Some("Contrat".into()),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.details(), ["fileType is required", "fileUrl is required"]);
    }
}
