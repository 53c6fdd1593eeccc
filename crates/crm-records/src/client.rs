//! Client records
//!
//! A client is a company and its main contact, tracked through the sales
//! pipeline. The contact email is unique across all clients.

use chrono::{DateTime, Utc};
use crm_rbac::{Owned, ResourceKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecordResult;
use crate::store::Record;
use crate::validate::{self, Validator};

/// How warm a lead is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LeadPriority {
    /// Ready to buy.
    Hot,
    /// Interested.
    Warm,
    /// No signal yet.
    #[default]
    Cold,
}

/// Position in the sales pipeline.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PipelineStage {
    /// Not yet contacted.
    #[default]
    New,
    /// First contact made.
    Contacted,
    /// Expressed interest.
    Interested,
    /// Became a customer.
    Converted,
}

/// A stored client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    /// Unique client ID
    pub id: Uuid,
    /// Company name
    pub company_name: String,
    /// Main contact
    pub contact_name: String,
    /// Contact email (unique, lowercase)
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Postal address
    pub address: Option<String>,
    /// Sales region
    pub region: Option<String>,
    /// Annual revenue
    pub annual_revenue: Option<f64>,
    /// Free-form tags
    pub tags: Vec<String>,
    /// Lead priority
    pub lead_priority: LeadPriority,
    /// Pipeline stage
    pub pipeline_stage: PipelineStage,
    /// Identity that created the client
    pub created_by: Uuid,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Client {
    /// Case-insensitive match against company, contact, and email.
    ///
    /// `needle` must already be lowercase.
    pub fn matches(&self, needle: &str) -> bool {
        self.company_name.to_lowercase().contains(needle)
            || self.contact_name.to_lowercase().contains(needle)
            || self.email.contains(needle)
    }
}

impl Owned for Client {
    fn owner_id(&self) -> Uuid {
        self.created_by
    }
}

impl Record for Client {
    const KIND: ResourceKind = ResourceKind::Client;

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

/// Input for creating a client.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClient {
    /// Company name
    pub company_name: Option<String>,
    /// Main contact
    pub contact_name: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Sales region
    pub region: Option<String>,
    /// Annual revenue
    pub annual_revenue: Option<f64>,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Lead priority
    pub lead_priority: Option<LeadPriority>,
    /// Pipeline stage
    pub pipeline_stage: Option<PipelineStage>,
}

impl NewClient {
    /// Check required fields and formats.
    pub fn validate(&self) -> RecordResult<()> {
        Validator::new()
            .text("companyName", &self.company_name)
            .text("contactName", &self.contact_name)
            .text("email", &self.email)
            .email("email", &self.email)
            .text("phone", &self.phone)
            .check(
                self.annual_revenue.map_or(true, |r| r.is_finite() && r >= 0.0),
                "annualRevenue must be a non-negative number",
            )
            .finish()
    }

    /// Validate and build the record, owned by `owner`.
    pub fn into_client(self, owner: Uuid) -> RecordResult<Client> {
        self.validate()?;
        let now = Utc::now();
        Ok(Client {
            id: Uuid::now_v7(),
            company_name: validate::required(self.company_name),
            contact_name: validate::required(self.contact_name),
            email: validate::normalize_email(&validate::required(self.email)),
            phone: validate::required(self.phone),
            address: validate::optional(self.address),
            region: validate::optional(self.region),
            annual_revenue: self.annual_revenue,
            tags: clean_tags(self.tags),
            lead_priority: self.lead_priority.unwrap_or_default(),
            pipeline_stage: self.pipeline_stage.unwrap_or_default(),
            created_by: owner,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Editable client fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientPatch {
    /// Company name
    pub company_name: Option<String>,
    /// Main contact
    pub contact_name: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Postal address
    pub address: Option<String>,
    /// Sales region
    pub region: Option<String>,
    /// Annual revenue
    pub annual_revenue: Option<f64>,
    /// Free-form tags
    pub tags: Option<Vec<String>>,
    /// Lead priority
    pub lead_priority: Option<LeadPriority>,
    /// Pipeline stage
    pub pipeline_stage: Option<PipelineStage>,
}

impl ClientPatch {
    /// Apply the allow-listed fields.
    pub fn apply(self, client: &mut Client) -> RecordResult<()> {
        let mut check = Validator::new();
        for (field, value) in [
            ("companyName", &self.company_name),
            ("contactName", &self.contact_name),
            ("email", &self.email),
            ("phone", &self.phone),
        ] {
            if value.is_some() {
                check.text(field, value);
            }
        }
        check
            .email("email", &self.email)
            .check(
                self.annual_revenue.map_or(true, |r| r.is_finite() && r >= 0.0),
                "annualRevenue must be a non-negative number",
            )
            .finish()?;

        if let Some(v) = self.company_name {
            client.company_name = v.trim().to_string();
        }
        if let Some(v) = self.contact_name {
            client.contact_name = v.trim().to_string();
        }
        if let Some(v) = self.email {
            client.email = validate::normalize_email(&v);
        }
        if let Some(v) = self.phone {
            client.phone = v.trim().to_string();
        }
        if self.address.is_some() {
            client.address = validate::optional(self.address);
        }
        if self.region.is_some() {
            client.region = validate::optional(self.region);
        }
        if self.annual_revenue.is_some() {
            client.annual_revenue = self.annual_revenue;
        }
        if let Some(tags) = self.tags {
            client.tags = clean_tags(tags);
        }
        if let Some(v) = self.lead_priority {
            client.lead_priority = v;
        }
        if let Some(v) = self.pipeline_stage {
            client.pipeline_stage = v;
        }
        Ok(())
    }
}

fn clean_tags(tags: Vec<String>) -> Vec<String> {
    let mut cleaned: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !cleaned.contains(&tag) {
            cleaned.push(tag);
        }
    }
    cleaned
}

/// Region label for clients with no region, used in per-region statistics.
pub const UNASSIGNED_REGION: &str = "Unassigned";

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> NewClient {
        NewClient {
            company_name: Some("Acme".into()),
            contact_name: Some("Jane Roe".into()),
            email: Some(" Jane@Acme.test ".into()),
            phone: Some("0102030405".into()),
            tags: vec!["b2b".into(), " b2b ".into(), "".into()],
            ..Default::default()
        }
    }

    #[test]
    fn test_defaults_and_normalization() {
        let owner = Uuid::now_v7();
        let client = input().into_client(owner).unwrap();

        assert_eq!(client.email, "jane@acme.test");
        assert_eq!(client.lead_priority, LeadPriority::Cold);
        assert_eq!(client.pipeline_stage, PipelineStage::New);
        assert_eq!(client.tags, ["b2b"]);
        assert_eq!(client.owner_id(), owner);
    }

    #[test]
    fn test_missing_fields_are_all_reported() {
        let err = NewClient::default().into_client(Uuid::now_v7()).unwrap_err();
        assert_eq!(
            err.details(),
            [
                "companyName is required",
                "contactName is required",
                "email is required",
                "phone is required"
            ]
        );
    }

    #[test]
    fn test_patch_cannot_blank_required_field() {
        let mut client = input().into_client(Uuid::now_v7()).unwrap();
        let result = ClientPatch {
            company_name: Some(" ".into()),
            pipeline_stage: Some(PipelineStage::Converted),
            ..Default::default()
        }
        .apply(&mut client);

        assert!(result.is_err());
        assert_eq!(client.company_name, "Acme");
        assert_eq!(client.pipeline_stage, PipelineStage::New);
    }

    #[test]
    fn test_patch_ignores_owner_in_body() {
        let owner = Uuid::now_v7();
        let mut client = input().into_client(owner).unwrap();
        let patch: ClientPatch = serde_json::from_value(serde_json::json!({
            "createdBy": Uuid::now_v7(),
            "leadPriority": "Hot",
        }))
        .unwrap();
        patch.apply(&mut client).unwrap();

        assert_eq!(client.created_by, owner);
        assert_eq!(client.lead_priority, LeadPriority::Hot);
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let client = input().into_client(Uuid::now_v7()).unwrap();
        assert!(client.matches("acme"));
        assert!(client.matches("roe"));
        assert!(!client.matches("globex"));
    }
}
