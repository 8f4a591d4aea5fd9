use std::time::SystemTime;

use thiserror::Error;

use crate::{
    dao::models::ContestStateEntity,
    state::contest::{Contest, ContestSchedule, ContestStatus, ControlMode},
};

/// Administrator commands addressed to a single contest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestCommand {
    /// Force a manual contest into the active phase.
    StartContest,
    /// Force a manual contest into the ended phase.
    StopContest,
    /// Open the voting gate.
    StartVoting,
    /// Close the voting gate.
    StopVoting,
}

/// Effect of a legal command that actually changes the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContestChange {
    /// Replace the manual status.
    SetStatus(ContestStatus),
    /// Open voting, stamping the transition time.
    OpenVoting {
        /// Time at which voting switched from closed to open.
        at: SystemTime,
    },
    /// Close voting, keeping the last opening time.
    CloseVoting,
}

/// Error returned when a command does not apply to the contest's control mode.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid operation: {command:?} cannot be applied to {mode} contest `{title}`")]
pub struct InvalidCommand {
    /// Title of the targeted contest.
    pub title: String,
    /// Control mode that forbids the command.
    pub mode: ControlMode,
    /// The rejected command.
    pub command: ContestCommand,
}

/// Decide what `command` does to `contest`.
///
/// Returns `Ok(None)` when the command is legal but the contest is already in the
/// requested state. `now` is only used to stamp a voting opening.
pub fn plan(
    contest: &Contest,
    command: ContestCommand,
    now: SystemTime,
) -> Result<Option<ContestChange>, InvalidCommand> {
    let change = match (contest.schedule, command) {
        (
            ContestSchedule::Scheduled(_),
            ContestCommand::StartContest | ContestCommand::StopContest,
        ) => {
            return Err(InvalidCommand {
                title: contest.title.clone(),
                mode: ControlMode::Scheduled,
                command,
            });
        }
        (ContestSchedule::Manual(ContestStatus::Active), ContestCommand::StartContest) => None,
        (ContestSchedule::Manual(_), ContestCommand::StartContest) => {
            Some(ContestChange::SetStatus(ContestStatus::Active))
        }
        (ContestSchedule::Manual(ContestStatus::Ended), ContestCommand::StopContest) => None,
        (ContestSchedule::Manual(_), ContestCommand::StopContest) => {
            Some(ContestChange::SetStatus(ContestStatus::Ended))
        }
        (_, ContestCommand::StartVoting) if contest.voting.open => None,
        (_, ContestCommand::StartVoting) => Some(ContestChange::OpenVoting { at: now }),
        (_, ContestCommand::StopVoting) if !contest.voting.open => None,
        (_, ContestCommand::StopVoting) => Some(ContestChange::CloseVoting),
    };

    Ok(change)
}

impl Contest {
    /// Apply a planned change to the in-memory snapshot.
    pub fn apply(&mut self, change: ContestChange) {
        match change {
            ContestChange::SetStatus(status) => {
                if let ContestSchedule::Manual(current) = &mut self.schedule {
                    *current = status;
                }
            }
            ContestChange::OpenVoting { at } => {
                self.voting.open = true;
                self.voting.opened_at = Some(at);
            }
            ContestChange::CloseVoting => self.voting.open = false,
        }
    }
}

impl ContestChange {
    /// Compute the persisted state that results from applying this change to `current`.
    pub fn apply_to_entity(&self, current: &ContestStateEntity) -> ContestStateEntity {
        let mut next = current.clone();
        match *self {
            ContestChange::SetStatus(status) => next.status = status.into(),
            ContestChange::OpenVoting { at } => {
                next.voting_open = true;
                next.voting_opened_at = Some(at);
            }
            ContestChange::CloseVoting => next.voting_open = false,
        }
        next
    }
}
