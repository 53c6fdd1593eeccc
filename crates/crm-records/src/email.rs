//! Recorded outgoing emails

use chrono::{DateTime, Utc};
use crm_rbac::{Owned, ResourceKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecordResult;
use crate::store::Record;
use crate::validate::{self, Validator};

/// An email composed by a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Email {
    /// Unique email ID
    pub id: Uuid,
    /// Subject line
    pub subject: String,
    /// Message body
    pub body: String,
    /// Recipient address
    pub recipient: String,
    /// Identity that composed the email
    pub created_by: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Owned for Email {
    fn owner_id(&self) -> Uuid {
        self.created_by
    }
}

impl Record for Email {
    const KIND: ResourceKind = ResourceKind::Email;

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

/// Input for recording an email.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEmail {
    /// Subject line
    pub subject: Option<String>,
    /// Message body
    pub body: Option<String>,
    /// Recipient address
    pub recipient: Option<String>,
}

impl NewEmail {
    /// Check required fields and formats.
    pub fn validate(&self) -> RecordResult<()> {
        Validator::new()
            .text("subject", &self.subject)
            .text("body", &self.body)
            .text("recipient", &self.recipient)
            .email("recipient", &self.recipient)
            .finish()
    }

    /// Validate and build the record, owned by `owner`.
    pub fn into_email(self, owner: Uuid) -> RecordResult<Email> {
        self.validate()?;
        let now = Utc::now();
        Ok(Email {
            id: Uuid::now_v7(),
            subject: validate::required(self.subject),
            body: validate::required(self.body),
            recipient: validate::normalize_email(&validate::required(self.recipient)),
            created_by: owner,
            created_at: now,
            updated_at: now,
        })
    }
}
