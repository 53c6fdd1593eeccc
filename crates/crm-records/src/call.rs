//! Logged phone calls
//!
//! A call belongs to the agent who placed it, not to whoever entered it.

use chrono::{DateTime, Utc};
use crm_rbac::{Owned, ResourceKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::RecordResult;
use crate::store::Record;
use crate::validate::{self, Validator};

/// Outcome of a call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum CallResult {
    /// The client picked up.
    Answered,
    /// Nobody picked up.
    NoAnswer,
    /// Line busy.
    Busy,
    /// Client asked to be called back.
    Callback,
    /// Number did not reach the client.
    WrongNumber,
    /// Client declined.
    NotInterested,
}

impl CallResult {
    /// Whether the call reached the client.
    pub fn is_success(&self) -> bool {
        matches!(self, CallResult::Answered)
    }
}

/// A stored call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Call {
    /// Unique call ID
    pub id: Uuid,
    /// Client called
    pub client: Uuid,
    /// Agent who placed the call (owner)
    pub agent: Uuid,
    /// When the call took place
    pub date: DateTime<Utc>,
    /// Outcome
    pub result: CallResult,
    /// Free-form notes
    pub notes: Option<String>,
    /// Agreed callback time, after `date`
    pub callback_date: Option<DateTime<Utc>>,
    /// Duration in seconds
    #[serde(rename = "duration")]
    pub duration_secs: Option<u32>,
    /// Identity that logged the call
    pub created_by: Uuid,
    /// Identity that last edited the call
    pub updated_by: Option<Uuid>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Owned for Call {
    fn owner_id(&self) -> Uuid {
        self.agent
    }
}

impl Record for Call {
    const KIND: ResourceKind = ResourceKind::Call;

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

/// Input for logging a call.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCall {
    /// Client called
    pub client: Option<Uuid>,
    /// When the call took place
    pub date: Option<DateTime<Utc>>,
    /// Outcome
    pub result: Option<CallResult>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Agreed callback time
    pub callback_date: Option<DateTime<Utc>>,
    /// Duration in seconds
    pub duration: Option<i64>,
}

impl NewCall {
    /// Check required fields and rules.
    pub fn validate(&self) -> RecordResult<()> {
        Validator::new()
            .present("client", &self.client)
            .present("date", &self.date)
            .present("result", &self.result)
            .check(
                callback_after(self.date, self.callback_date),
                "callbackDate must be after date",
            )
            .check(
                self.duration.map_or(true, duration_ok),
                "duration must be a non-negative number of seconds",
            )
            .finish()
    }

    /// Validate and build the record.
    ///
    /// `agent` owns the call; `creator` is whoever logged it.
    pub fn into_call(self, agent: Uuid, creator: Uuid) -> RecordResult<Call> {
        self.validate()?;
        let now = Utc::now();
        Ok(Call {
            id: Uuid::now_v7(),
            client: self.client.unwrap_or_default(),
            agent,
            date: self.date.unwrap_or(now),
            result: self.result.unwrap_or(CallResult::NoAnswer),
            notes: validate::optional(self.notes),
            callback_date: self.callback_date,
            duration_secs: self.duration.and_then(|d| u32::try_from(d).ok()),
            created_by: creator,
            updated_by: None,
            created_at: now,
            updated_at: now,
        })
    }
}

/// Editable call fields.
///
/// The client and agent of a call are fixed once logged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallPatch {
    /// When the call took place
    pub date: Option<DateTime<Utc>>,
    /// Outcome
    pub result: Option<CallResult>,
    /// Free-form notes
    pub notes: Option<String>,
    /// Agreed callback time
    pub callback_date: Option<DateTime<Utc>>,
    /// Duration in seconds
    pub duration: Option<i64>,
}

impl CallPatch {
    /// Apply the allow-listed fields, recording `editor`.
    pub fn apply(self, call: &mut Call, editor: Uuid) -> RecordResult<()> {
        let date = self.date.unwrap_or(call.date);
        let callback = self.callback_date.or(call.callback_date);

        Validator::new()
            .check(callback_after(Some(date), callback), "callbackDate must be after date")
            .check(
                self.duration.map_or(true, duration_ok),
                "duration must be a non-negative number of seconds",
            )
            .finish()?;

        call.date = date;
        call.callback_date = callback;
        if let Some(result) = self.result {
            call.result = result;
        }
        if self.notes.is_some() {
            call.notes = validate::optional(self.notes);
        }
        if let Some(d) = self.duration {
            call.duration_secs = u32::try_from(d).ok();
        }
        call.updated_by = Some(editor);
        Ok(())
    }
}

fn callback_after(date: Option<DateTime<Utc>>, callback: Option<DateTime<Utc>>) -> bool {
    match (date, callback) {
        (Some(date), Some(callback)) => callback > date,
        _ => true,
    }
}

fn duration_ok(seconds: i64) -> bool {
    u32::try_from(seconds).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn input() -> NewCall {
        NewCall {
            client: Some(Uuid::now_v7()),
            date: Some(Utc::now()),
            result: Some(CallResult::Answered),
            ..Default::default()
        }
    }

    #[test]
    fn test_agent_owns_the_call() {
        let agent = Uuid::now_v7();
        let admin = Uuid::now_v7();
        let call = input().into_call(agent, admin).unwrap();

        assert_eq!(call.owner_id(), agent);
        assert_eq!(call.created_by, admin);
    }

    #[test]
    fn test_callback_must_follow_call() {
        let mut call = input();
        call.callback_date = call.date.map(|d| d - Duration::hours(1));
        assert_eq!(
            call.validate().unwrap_err().details(),
            ["callbackDate must be after date"]
        );
    }

    #[test]
    fn test_negative_duration_is_rejected() {
        let call = NewCall {
            duration: Some(-5),
            ..input()
        };
        assert!(call.validate().is_err());
    }

    #[test]
    fn test_result_uses_snake_case() {
        let parsed: CallResult = serde_json::from_str("\"no_answer\"").unwrap();
        assert_eq!(parsed, CallResult::NoAnswer);
        assert!(serde_json::from_str::<CallResult>("\"maybe\"").is_err());
    }

    #[test]
    fn test_patch_checks_callback_against_stored_date() {
        let agent = Uuid::now_v7();
        let mut call = input().into_call(agent, agent).unwrap();
        let before = call.date - Duration::minutes(5);

        let result = CallPatch {
            callback_date: Some(before),
            ..Default::default()
        }
        .apply(&mut call, agent);
        assert!(result.is_err());

        CallPatch {
            result: Some(CallResult::Callback),
            callback_date: Some(call.date + Duration::days(1)),
            ..Default::default()
        }
        .apply(&mut call, agent)
        .unwrap();
        assert_eq!(call.result, CallResult::Callback);
        assert_eq!(call.updated_by, Some(agent));
    }
}
