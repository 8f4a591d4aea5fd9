use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use uuid::Uuid;

/// Persisted lifecycle status, only meaningful for manually controlled contests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContestStatusEntity {
    /// Default for every new contest.
    #[default]
    NotStarted,
    /// Opened by an administrator.
    Active,
    /// Closed by an administrator.
    Ended,
}

impl ContestStatusEntity {
    /// Storage representation of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ContestStatusEntity::NotStarted => "not_started",
            ContestStatusEntity::Active => "active",
            ContestStatusEntity::Ended => "ended",
        }
    }
}

/// Mutable command-controlled part of a contest, updated with compare-and-set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ContestStateEntity {
    /// Manual lifecycle status.
    pub status: ContestStatusEntity,
    /// Whether voting is open.
    pub voting_open: bool,
    /// When voting last switched from closed to open.
    pub voting_opened_at: Option<SystemTime>,
}

/// Contest record persisted by the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContestEntity {
    /// Opaque identifier.
    pub id: Uuid,
    /// Unique natural key.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// True for command-driven contests.
    pub manual_control: bool,
    /// Window start for scheduled contests.
    pub start_date: Option<SystemTime>,
    /// Window end for scheduled contests.
    pub end_date: Option<SystemTime>,
    /// Command-controlled state.
    pub state: ContestStateEntity,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

/// Editable descriptive fields of a contest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContestDetailsEntity {
    /// Replacement description.
    pub description: String,
    /// Replacement window bounds (`None` for manual contests).
    pub window: Option<(SystemTime, SystemTime)>,
}

/// Entry record, unique per `(contest_title, identity)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntryEntity {
    /// Contest the entry belongs to.
    pub contest_title: String,
    /// Participant key.
    pub identity: String,
    /// Opaque photo handle.
    pub photo_ref: String,
    /// Submission time.
    pub created_at: SystemTime,
}

/// Vote record, unique per `(contest_title, identity)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct VoteEntity {
    /// Contest the vote belongs to.
    pub contest_title: String,
    /// Voter key.
    pub identity: String,
    /// Photo handle of the chosen entry.
    pub photo_ref: String,
    /// Cast time.
    pub created_at: SystemTime,
}
