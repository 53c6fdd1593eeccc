//! Scheduled client appointments
//!
//! An appointment is visible to its creator and to the attending agent.
//! Only the creator or an administrator may update or delete it, so an agent
//! scheduled by someone else has read-only access.

use chrono::{DateTime, Utc};
use crm_rbac::{Owned, ResourceKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecordResult;
use crate::store::Record;
use crate::validate::{self, Validator};

/// Appointment lifecycle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Upcoming.
    #[default]
    Scheduled,
    /// Took place.
    Completed,
    /// Called off.
    Cancelled,
}

/// A stored appointment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    /// Unique appointment ID
    pub id: Uuid,
    /// Title
    pub title: String,
    /// Longer description
    pub description: Option<String>,
    /// Start time
    pub start_time: DateTime<Utc>,
    /// End time, not before `start_time`
    pub end_time: DateTime<Utc>,
    /// Client met
    pub client: Uuid,
    /// Agent attending
    pub agent: Uuid,
    /// Lifecycle status
    pub status: AppointmentStatus,
    /// Where it takes place
    pub location: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Identity that scheduled it (owner)
    pub created_by: Uuid,
    /// Identity that last edited it
    pub updated_by: Option<Uuid>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Owned for Appointment {
    fn owner_id(&self) -> Uuid {
        self.created_by
    }

    fn visible_to(&self, identity: Uuid) -> bool {
        self.created_by == identity || self.agent == identity
    }
}

impl Record for Appointment {
    const KIND: ResourceKind = ResourceKind::Appointment;

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

/// Input for scheduling an appointment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    /// Title
    pub title: Option<String>,
    /// Longer description
    pub description: Option<String>,
    /// Start time
    #[serde(alias = "start")]
    pub start_time: Option<DateTime<Utc>>,
    /// End time
    #[serde(alias = "end")]
    pub end_time: Option<DateTime<Utc>>,
    /// Client met
    pub client: Option<Uuid>,
    /// Agent attending; defaults to the creator
    pub agent: Option<Uuid>,
    /// Lifecycle status
    pub status: Option<AppointmentStatus>,
    /// Where it takes place
    pub location: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl NewAppointment {
    /// Check required fields and rules.
    pub fn validate(&self) -> RecordResult<()> {
        Validator::new()
            .text("title", &self.title)
            .present("startTime", &self.start_time)
            .present("endTime", &self.end_time)
            .present("client", &self.client)
            .check(
                ordered(self.start_time, self.end_time),
                "endTime must not be before startTime",
            )
            .finish()
    }

    /// Validate and build the record.
    ///
    /// `agent` attends; `creator` owns the appointment.
    pub fn into_appointment(self, agent: Uuid, creator: Uuid) -> RecordResult<Appointment> {
        self.validate()?;
        let now = Utc::now();
        let start_time = self.start_time.unwrap_or(now);
        Ok(Appointment {
            id: Uuid::now_v7(),
            title: validate::required(self.title),
            description: validate::optional(self.description),
            start_time,
            end_time: self.end_time.unwrap_or(start_time),
            client: self.client.unwrap_or_default(),
            agent,
            status: self.status.unwrap_or_default(),
            location: validate::optional(self.location),
            notes: validate::optional(self.notes),
            created_by: creator,
            updated_by: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Editable appointment fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    /// Title
    pub title: Option<String>,
    /// Longer description
    pub description: Option<String>,
    /// Start time
    #[serde(alias = "start")]
    pub start_time: Option<DateTime<Utc>>,
    /// End time
    #[serde(alias = "end")]
    pub end_time: Option<DateTime<Utc>>,
    /// Lifecycle status
    pub status: Option<AppointmentStatus>,
    /// Where it takes place
    pub location: Option<String>,
    /// Free-form notes
    pub notes: Option<String>,
}

impl AppointmentPatch {
    /// Apply the allow-listed fields, recording `editor`.
    pub fn apply(self, appointment: &mut Appointment, editor: Uuid) -> RecordResult<()> {
        let start_time = self.start_time.unwrap_or(appointment.start_time);
        let end_time = self.end_time.unwrap_or(appointment.end_time);

        let mut check = Validator::new();
        if self.title.is_some() {
            check.text("title", &self.title);
        }
        check
            .check(
                ordered(Some(start_time), Some(end_time)),
                "endTime must not be before startTime",
            )
            .finish()?;

        if let Some(title) = self.title {
            appointment.title = title.trim().to_string();
        }
        if self.description.is_some() {
            appointment.description = validate::optional(self.description);
        }
        appointment.start_time = start_time;
        appointment.end_time = end_time;
        if let Some(status) = self.status {
            appointment.status = status;
        }
        if self.location.is_some() {
            appointment.location = validate::optional(self.location);
        }
        if self.notes.is_some() {
            appointment.notes = validate::optional(self.notes);
        }
        appointment.updated_by = Some(editor);
        Ok(())
    }
}

fn ordered(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => end >= start,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn input() -> NewAppointment {
        let start = Utc::now() + Duration::days(1);
        NewAppointment {
            title: Some("Démo".into()),
            start_time: Some(start),
            end_time: Some(start + Duration::hours(1)),
            client: Some(Uuid::now_v7()),
            ..Default::default()
        }
    }

    #[test]
    fn test_accepts_start_and_end_aliases() {
        let parsed: NewAppointment = serde_json::from_value(serde_json::json!({
            "title": "Démo",
            "start": "2026-03-01T09:00:00Z",
            "end": "2026-03-01T10:00:00Z",
            "client": Uuid::now_v7(),
        }))
        .unwrap();
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_end_before_start_is_rejected() {
        let mut bad = input();
        bad.end_time = bad.start_time.map(|s| s - Duration::minutes(1));
        assert_eq!(
            bad.validate().unwrap_err().details(),
            ["endTime must not be before startTime"]
        );
    }

    #[test]
    fn test_creator_owns_and_agent_can_see() {
        let admin = Uuid::now_v7();
        let agent = Uuid::now_v7();
        let appointment = input().into_appointment(agent, admin).unwrap();

        assert_eq!(appointment.owner_id(), admin);
        assert!(appointment.visible_to(agent));
        assert!(appointment.visible_to(admin));
        assert!(!appointment.visible_to(Uuid::now_v7()));
        assert_eq!(appointment.status, AppointmentStatus::Scheduled);
    }

    #[test]
    fn test_patch_moves_slot_consistently() {
        let owner = Uuid::now_v7();
        let mut appointment = input().into_appointment(owner, owner).unwrap();
        let later = appointment.end_time + Duration::hours(2);

        let result = AppointmentPatch {
            start_time: Some(later),
            ..Default::default()
        }
        .apply(&mut appointment, owner);
        assert!(result.is_err());

        AppointmentPatch {
            start_time: Some(later),
            end_time: Some(later + Duration::hours(1)),
            status: Some(AppointmentStatus::Completed),
            ..Default::default()
        }
        .apply(&mut appointment, owner)
        .unwrap();
        assert_eq!(appointment.start_time, later);
        assert_eq!(appointment.status, AppointmentStatus::Completed);
    }
}
