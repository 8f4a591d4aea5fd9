use std::{fmt, time::SystemTime};

use thiserror::Error;
use uuid::Uuid;

use crate::dao::models::{
    ContestEntity, ContestStateEntity, ContestStatusEntity, EntryEntity, VoteEntity,
};

/// Persisted lifecycle status of a manually controlled contest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestStatus {
    /// Created but not yet opened by an administrator.
    NotStarted,
    /// Opened by an administrator; entries are accepted.
    Active,
    /// Closed by an administrator.
    Ended,
}

/// Lifecycle phase of a contest, always derived and never cached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestPhase {
    /// The contest has not opened yet.
    NotStarted,
    /// The contest is running and accepts entries.
    Active,
    /// The contest is over.
    Ended,
}

impl fmt::Display for ContestPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContestPhase::NotStarted => "not_started",
            ContestPhase::Active => "active",
            ContestPhase::Ended => "ended",
        };
        f.write_str(label)
    }
}

impl From<ContestStatus> for ContestPhase {
    fn from(value: ContestStatus) -> Self {
        match value {
            ContestStatus::NotStarted => ContestPhase::NotStarted,
            ContestStatus::Active => ContestPhase::Active,
            ContestStatus::Ended => ContestPhase::Ended,
        }
    }
}

/// Lifecycle strategy of a contest, chosen at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    /// Phase follows the configured date window.
    Scheduled,
    /// Phase follows administrator commands.
    Manual,
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlMode::Scheduled => f.write_str("scheduled"),
            ControlMode::Manual => f.write_str("manual"),
        }
    }
}

/// Error returned when a date window is empty or inverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("contest window must start before it ends")]
pub struct InvalidWindow;

/// Half-open `[start, end)` interval during which a scheduled contest is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    start: SystemTime,
    end: SystemTime,
}

impl Window {
    /// Build a window, rejecting `start >= end`.
    pub fn new(start: SystemTime, end: SystemTime) -> Result<Self, InvalidWindow> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(InvalidWindow)
        }
    }

    /// Inclusive lower bound.
    pub fn start(&self) -> SystemTime {
        self.start
    }

    /// Exclusive upper bound.
    pub fn end(&self) -> SystemTime {
        self.end
    }
}

/// Tagged lifecycle data: a scheduled contest carries its window, a manual one its status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestSchedule {
    /// Date-driven contest.
    Scheduled(Window),
    /// Command-driven contest.
    Manual(ContestStatus),
}

impl ContestSchedule {
    /// Control mode matching this schedule variant.
    pub fn control_mode(&self) -> ControlMode {
        match self {
            ContestSchedule::Scheduled(_) => ControlMode::Scheduled,
            ContestSchedule::Manual(_) => ControlMode::Manual,
        }
    }
}

/// Derive the phase of a contest.
///
/// Manual contests report their stored status verbatim and never look at the clock.
/// Scheduled contests compare `now` against the window: active from `start`
/// (inclusive) until `end` (exclusive).
pub fn phase(schedule: &ContestSchedule, now: SystemTime) -> ContestPhase {
    match schedule {
        ContestSchedule::Manual(status) => (*status).into(),
        ContestSchedule::Scheduled(window) => {
            if now >= window.end {
                ContestPhase::Ended
            } else if now >= window.start {
                ContestPhase::Active
            } else {
                ContestPhase::NotStarted
            }
        }
    }
}

/// Voting flags, independent from the contest phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VotingState {
    /// Whether votes are currently accepted.
    pub open: bool,
    /// When voting last switched from closed to open.
    pub opened_at: Option<SystemTime>,
}

/// Domain view of a contest record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contest {
    /// Opaque identifier.
    pub id: Uuid,
    /// Natural key used by every command.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Lifecycle strategy and its data.
    pub schedule: ContestSchedule,
    /// Voting gate.
    pub voting: VotingState,
    /// Creation timestamp.
    pub created_at: SystemTime,
}

impl Contest {
    /// Build a fresh contest with voting closed.
    pub fn new(
        title: String,
        description: String,
        schedule: ContestSchedule,
        created_at: SystemTime,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            description,
            schedule,
            voting: VotingState::default(),
            created_at,
        }
    }

    /// Control mode fixed at creation.
    pub fn control_mode(&self) -> ControlMode {
        self.schedule.control_mode()
    }

    /// Current phase as seen at `now`.
    pub fn phase(&self, now: SystemTime) -> ContestPhase {
        phase(&self.schedule, now)
    }

    /// Date window for scheduled contests.
    pub fn window(&self) -> Option<Window> {
        match self.schedule {
            ContestSchedule::Scheduled(window) => Some(window),
            ContestSchedule::Manual(_) => None,
        }
    }
}

/// Error raised when a stored contest violates the window/mode invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("stored contest `{title}` is inconsistent: {problem}")]
pub struct CorruptContest {
    /// Title of the offending record.
    pub title: String,
    /// What is wrong with it.
    pub problem: &'static str,
}

impl From<ContestStatusEntity> for ContestStatus {
    fn from(value: ContestStatusEntity) -> Self {
        match value {
            ContestStatusEntity::NotStarted => ContestStatus::NotStarted,
            ContestStatusEntity::Active => ContestStatus::Active,
            ContestStatusEntity::Ended => ContestStatus::Ended,
        }
    }
}

impl From<ContestStatus> for ContestStatusEntity {
    fn from(value: ContestStatus) -> Self {
        match value {
            ContestStatus::NotStarted => ContestStatusEntity::NotStarted,
            ContestStatus::Active => ContestStatusEntity::Active,
            ContestStatus::Ended => ContestStatusEntity::Ended,
        }
    }
}

impl TryFrom<ContestEntity> for Contest {
    type Error = CorruptContest;

    fn try_from(value: ContestEntity) -> Result<Self, Self::Error> {
        let corrupt = |problem| CorruptContest {
            title: value.title.clone(),
            problem,
        };

        let schedule = if value.manual_control {
            if value.start_date.is_some() || value.end_date.is_some() {
                return Err(corrupt("manual contest carries a date window"));
            }
            ContestSchedule::Manual(value.state.status.into())
        } else {
            let (Some(start), Some(end)) = (value.start_date, value.end_date) else {
                return Err(corrupt("scheduled contest is missing its date window"));
            };
            let window = Window::new(start, end).map_err(|_| corrupt("inverted date window"))?;
            ContestSchedule::Scheduled(window)
        };

        Ok(Self {
            id: value.id,
            title: value.title,
            description: value.description,
            schedule,
            voting: VotingState {
                open: value.state.voting_open,
                opened_at: value.state.voting_opened_at,
            },
            created_at: value.created_at,
        })
    }
}

impl From<Contest> for ContestEntity {
    fn from(value: Contest) -> Self {
        let (manual_control, status, window) = match value.schedule {
            ContestSchedule::Manual(status) => (true, status, None),
            ContestSchedule::Scheduled(window) => (false, ContestStatus::NotStarted, Some(window)),
        };

        Self {
            id: value.id,
            title: value.title,
            description: value.description,
            manual_control,
            start_date: window.map(|w| w.start),
            end_date: window.map(|w| w.end),
            state: ContestStateEntity {
                status: status.into(),
                voting_open: value.voting.open,
                voting_opened_at: value.voting.opened_at,
            },
            created_at: value.created_at,
        }
    }
}

/// A participant's submission into a contest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Contest the entry belongs to.
    pub contest_title: String,
    /// Participant key.
    pub identity: String,
    /// Opaque handle of the uploaded photo.
    pub photo_ref: String,
    /// Submission time.
    pub created_at: SystemTime,
}

/// A participant's single vote in a contest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vote {
    /// Contest the vote belongs to.
    pub contest_title: String,
    /// Voter key.
    pub identity: String,
    /// Photo of the entry the vote goes to.
    pub photo_ref: String,
    /// Cast time.
    pub created_at: SystemTime,
}

impl From<EntryEntity> for Entry {
    fn from(value: EntryEntity) -> Self {
        Self {
            contest_title: value.contest_title,
            identity: value.identity,
            photo_ref: value.photo_ref,
            created_at: value.created_at,
        }
    }
}

impl From<Entry> for EntryEntity {
    fn from(value: Entry) -> Self {
        Self {
            contest_title: value.contest_title,
            identity: value.identity,
            photo_ref: value.photo_ref,
            created_at: value.created_at,
        }
    }
}

impl From<VoteEntity> for Vote {
    fn from(value: VoteEntity) -> Self {
        Self {
            contest_title: value.contest_title,
            identity: value.identity,
            photo_ref: value.photo_ref,
            created_at: value.created_at,
        }
    }
}

impl From<Vote> for VoteEntity {
    fn from(value: Vote) -> Self {
        Self {
            contest_title: value.contest_title,
            identity: value.identity,
            photo_ref: value.photo_ref,
            created_at: value.created_at,
        }
    }
}
