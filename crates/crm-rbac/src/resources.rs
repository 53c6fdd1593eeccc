//! # Resource Kinds
//!
//! The CRM entities that access decisions are made about.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of CRM resource.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// User accounts.
    User,
    /// Client companies and their contacts.
    Client,
    /// Logged phone calls.
    Call,
    /// Scheduled client appointments.
    Appointment,
    /// Uploaded documents.
    Document,
    /// In-app notifications.
    Notification,
    /// Recorded outgoing emails.
    Email,
}

impl ResourceKind {
    /// Get the string representation of the resource kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::User => "user",
            ResourceKind::Client => "client",
            ResourceKind::Call => "call",
            ResourceKind::Appointment => "appointment",
            ResourceKind::Document => "document",
            ResourceKind::Notification => "notification",
            ResourceKind::Email => "email",
        }
    }

    /// Parse resource kind from string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" | "users" => Some(ResourceKind::User),
            "client" | "clients" => Some(ResourceKind::Client),
            "call" | "calls" => Some(ResourceKind::Call),
            "appointment" | "appointments" => Some(ResourceKind::Appointment),
            "document" | "documents" => Some(ResourceKind::Document),
            "notification" | "notifications" => Some(ResourceKind::Notification),
            "email" | "emails" => Some(ResourceKind::Email),
            _ => None,
        }
    }

    /// Name of the field that records the owning identity.
    ///
    /// Calls are owned by the agent who placed them and documents by their
    /// uploader; everything else by its creator.
    pub fn owner_field(&self) -> &'static str {
        match self {
            ResourceKind::Call => "agent",
            ResourceKind::Document => "uploadedBy",
            ResourceKind::User => "id",
            _ => "createdBy",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_plural_route_names() {
        assert_eq!(ResourceKind::parse("clients"), Some(ResourceKind::Client));
        assert_eq!(ResourceKind::parse("Call"), Some(ResourceKind::Call));
        assert_eq!(ResourceKind::parse("invoice"), None);
    }

    #[test]
    fn test_owner_field() {
        assert_eq!(ResourceKind::Call.owner_field(), "agent");
        assert_eq!(ResourceKind::Document.owner_field(), "uploadedBy");
        assert_eq!(ResourceKind::Client.owner_field(), "createdBy");
        assert_eq!(ResourceKind::Notification.owner_field(), "createdBy");
    }
}
