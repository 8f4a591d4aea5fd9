use std::time::SystemTime;

use serde::Deserialize;
use serde::Serialize;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{
        format_system_time,
        phase::{ControlModeDto, VisiblePhase},
        validation::{validate_description, validate_timestamp, validate_title},
    },
    state::contest::Contest,
};

/// Payload used to create a contest.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateContestRequest {
    /// Unique title, used as the contest key.
    pub title: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Defaults to the deployment's `manual_control_default`.
    #[serde(default)]
    pub control_mode: Option<ControlModeDto>,
    /// RFC 3339 window start; required for scheduled contests.
    #[serde(default)]
    pub start_date: Option<String>,
    /// RFC 3339 window end; required for scheduled contests.
    #[serde(default)]
    pub end_date: Option<String>,
}

impl Validate for CreateContestRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_title(&self.title) {
            errors.add("title", e);
        }
        if let Err(e) = validate_description(&self.description) {
            errors.add("description", e);
        }
        if let Some(ref start) = self.start_date {
            if let Err(e) = validate_timestamp(start) {
                errors.add("start_date", e);
            }
        }
        if let Some(ref end) = self.end_date {
            if let Err(e) = validate_timestamp(end) {
                errors.add("end_date", e);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Partial update of a contest; omitted fields stay unchanged.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateContestRequest {
    /// Replacement description.
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement window start (scheduled contests only, together with `end_date`).
    #[serde(default)]
    pub start_date: Option<String>,
    /// Replacement window end (scheduled contests only, together with `start_date`).
    #[serde(default)]
    pub end_date: Option<String>,
}

impl Validate for UpdateContestRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Some(ref description) = self.description {
            if let Err(e) = validate_description(description) {
                errors.add("description", e);
            }
        }
        for (field, value) in [("start_date", &self.start_date), ("end_date", &self.end_date)] {
            if let Some(value) = value {
                if let Err(e) = validate_timestamp(value) {
                    errors.add(field, e);
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Query string accepted by the contest listing.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ContestListQuery {
    /// Only return contests currently in this phase.
    pub phase: Option<VisiblePhase>,
}

/// Contest as returned by the API, with its phase derived at request time.
#[derive(Debug, Serialize, ToSchema)]
pub struct ContestSummary {
    /// Stable identifier.
    pub id: Uuid,
    /// Unique title.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Lifecycle strategy fixed at creation.
    pub control_mode: ControlModeDto,
    /// Phase at request time.
    pub phase: VisiblePhase,
    /// Window start, scheduled contests only.
    pub start_date: Option<String>,
    /// Window end, scheduled contests only.
    pub end_date: Option<String>,
    /// Whether votes are accepted.
    pub voting_open: bool,
    /// First time voting opened.
    pub voting_opened_at: Option<String>,
    /// Creation time.
    pub created_at: String,
}

impl ContestSummary {
    /// Render a contest with its phase at `now`.
    pub fn from_contest(contest: &Contest, now: SystemTime) -> Self {
        let window = contest.window();
        Self {
            id: contest.id,
            title: contest.title.clone(),
            description: contest.description.clone(),
            control_mode: contest.control_mode().into(),
            phase: contest.phase(now).into(),
            start_date: window.map(|w| format_system_time(w.start())),
            end_date: window.map(|w| format_system_time(w.end())),
            voting_open: contest.voting.open,
            voting_opened_at: contest.voting.opened_at.map(format_system_time),
            created_at: format_system_time(contest.created_at),
        }
    }
}
