use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        format_system_time,
        validation::{validate_identity, validate_photo_ref},
    },
    state::{
        contest::{Entry, Vote},
        guard::DenialReason,
    },
};

/// Entry submission.
#[derive(Debug, Deserialize, ToSchema)]
pub struct JoinRequest {
    /// Email address, or username when the deployment runs in username-only mode.
    pub identity: String,
    /// Handle of the already uploaded photo.
    pub photo_ref: String,
}

/// Vote for an existing entry.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VoteRequest {
    /// Voter identity.
    pub identity: String,
    /// Photo handle of the entry being voted for.
    pub photo_ref: String,
}

fn validate_participation(identity: &str, photo_ref: &str) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::new();

    if let Err(e) = validate_identity(identity) {
        errors.add("identity", e);
    }
    if let Err(e) = validate_photo_ref(photo_ref) {
        errors.add("photo_ref", e);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

impl Validate for JoinRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_participation(&self.identity, &self.photo_ref)
    }
}

impl Validate for VoteRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        validate_participation(&self.identity, &self.photo_ref)
    }
}

/// Identity an eligibility check or vote lookup is about.
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IdentityQuery {
    /// Participant identity.
    pub identity: String,
}

/// Outcome of a join or vote eligibility check.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct GateResponse {
    /// Whether the action would be accepted.
    pub allowed: bool,
    /// Machine-readable denial code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human readable explanation of the refusal.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<Result<(), DenialReason>> for GateResponse {
    fn from(value: Result<(), DenialReason>) -> Self {
        match value {
            Ok(()) => Self {
                allowed: true,
                reason: None,
                message: None,
            },
            Err(reason) => Self {
                allowed: false,
                reason: Some(reason.code().to_owned()),
                message: Some(reason.to_string()),
            },
        }
    }
}

/// Stored entry.
#[derive(Debug, Serialize, ToSchema)]
pub struct EntrySummary {
    /// Contest the entry belongs to.
    pub contest_title: String,
    /// Submitting identity.
    pub identity: String,
    /// Submitted photo handle.
    pub photo_ref: String,
    /// Submission time.
    pub created_at: String,
}

impl From<Entry> for EntrySummary {
    fn from(value: Entry) -> Self {
        Self {
            contest_title: value.contest_title,
            identity: value.identity,
            photo_ref: value.photo_ref,
            created_at: format_system_time(value.created_at),
        }
    }
}

/// Stored vote.
#[derive(Debug, Serialize, ToSchema)]
pub struct VoteSummary {
    /// Contest the vote belongs to.
    pub contest_title: String,
    /// Voting identity.
    pub identity: String,
    /// Photo the vote went to.
    pub photo_ref: String,
    /// Cast time.
    pub created_at: String,
}

impl From<Vote> for VoteSummary {
    fn from(value: Vote) -> Self {
        Self {
            contest_title: value.contest_title,
            identity: value.identity,
            photo_ref: value.photo_ref,
            created_at: format_system_time(value.created_at),
        }
    }
}
