use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::contest::{ContestPhase, ControlMode};

/// Contest phase exposed to clients.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// Upcoming contest.
    NotStarted,
    /// Ongoing contest.
    Active,
    /// Past contest.
    Ended,
}

impl From<ContestPhase> for VisiblePhase {
    fn from(value: ContestPhase) -> Self {
        match value {
            ContestPhase::NotStarted => VisiblePhase::NotStarted,
            ContestPhase::Active => VisiblePhase::Active,
            ContestPhase::Ended => VisiblePhase::Ended,
        }
    }
}

/// Lifecycle strategy of a contest on the wire.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ControlModeDto {
    /// Phase follows the date window.
    Scheduled,
    /// Phase follows administrator commands.
    Manual,
}

impl From<ControlMode> for ControlModeDto {
    fn from(value: ControlMode) -> Self {
        match value {
            ControlMode::Scheduled => ControlModeDto::Scheduled,
            ControlMode::Manual => ControlModeDto::Manual,
        }
    }
}

impl From<ControlModeDto> for ControlMode {
    fn from(value: ControlModeDto) -> Self {
        match value {
            ControlModeDto::Scheduled => ControlMode::Scheduled,
            ControlModeDto::Manual => ControlMode::Manual,
        }
    }
}
