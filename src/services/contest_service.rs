//! Contest administration: creation, edits, deletion and the lifecycle commands.
//!
//! Lifecycle commands are planned against a fresh snapshot and written back with a
//! conditional update on the previously read state. When another writer got there
//! first the snapshot is re-read and the command re-planned.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    dao::{
        contest_store::Store,
        models::{ContestDetailsEntity, ContestEntity},
        storage::StorageError,
    },
    dto::{
        contest::{ContestSummary, CreateContestRequest, UpdateContestRequest},
        mode::ModeConfigResponse,
        parse_timestamp,
        phase::VisiblePhase,
    },
    error::ServiceError,
    state::{
        SharedState,
        contest::{Contest, ContestSchedule, ContestStatus, ControlMode, Window},
        state_machine::{ContestCommand, plan},
    },
};

/// Attempts made by a lifecycle command before reporting a conflict.
const MAX_COMMAND_ATTEMPTS: usize = 3;

fn not_found(title: &str) -> ServiceError {
    ServiceError::NotFound(format!("contest `{title}` not found"))
}

/// Load a contest and its raw record, if it exists.
pub(crate) async fn find_contest(
    store: &Arc<dyn Store>,
    title: &str,
) -> Result<Option<(ContestEntity, Contest)>, ServiceError> {
    let Some(entity) = store.find_contest(title).await? else {
        return Ok(None);
    };
    let contest = Contest::try_from(entity.clone())?;
    Ok(Some((entity, contest)))
}

async fn require_contest(
    store: &Arc<dyn Store>,
    title: &str,
) -> Result<(ContestEntity, Contest), ServiceError> {
    find_contest(store, title)
        .await?
        .ok_or_else(|| not_found(title))
}

fn parse_window(start: &str, end: &str) -> Result<Window, ServiceError> {
    let parse = |value: &str, field: &str| {
        parse_timestamp(value)
            .map_err(|err| ServiceError::Validation(format!("invalid {field}: {err}")))
    };
    Window::new(parse(start, "start_date")?, parse(end, "end_date")?)
        .map_err(|err| ServiceError::Validation(err.to_string()))
}

/// All contests with their current phase, optionally only those in `phase`.
pub async fn list_contests(
    state: &SharedState,
    phase: Option<VisiblePhase>,
) -> Result<Vec<ContestSummary>, ServiceError> {
    let store = state.require_store().await?;
    let now = state.now();

    let mut contests = Vec::new();
    for entity in store.list_contests().await? {
        let contest = match Contest::try_from(entity) {
            Ok(contest) => contest,
            Err(err) => {
                warn!(error = %err, "skipping inconsistent contest record");
                continue;
            }
        };
        let summary = ContestSummary::from_contest(&contest, now);
        if phase.is_none_or(|wanted| wanted == summary.phase) {
            contests.push(summary);
        }
    }

    Ok(contests)
}

/// One contest by title.
pub async fn get_contest(state: &SharedState, title: &str) -> Result<ContestSummary, ServiceError> {
    let store = state.require_store().await?;
    let (_, contest) = require_contest(&store, title).await?;
    Ok(ContestSummary::from_contest(&contest, state.now()))
}

/// Create a contest; the control mode defaults to the deployment setting.
pub async fn create_contest(
    state: &SharedState,
    request: CreateContestRequest,
) -> Result<ContestSummary, ServiceError> {
    let store = state.require_store().await?;
    let title = request.title.trim().to_owned();

    let mode = request.control_mode.map(ControlMode::from).unwrap_or(
        if state.mode().manual_control_default {
            ControlMode::Manual
        } else {
            ControlMode::Scheduled
        },
    );

    let schedule = match (mode, request.start_date, request.end_date) {
        (ControlMode::Manual, None, None) => ContestSchedule::Manual(ContestStatus::NotStarted),
        (ControlMode::Manual, _, _) => {
            return Err(ServiceError::Validation(
                "manual contests do not take a date window".into(),
            ));
        }
        (ControlMode::Scheduled, Some(start), Some(end)) => {
            ContestSchedule::Scheduled(parse_window(&start, &end)?)
        }
        (ControlMode::Scheduled, _, _) => {
            return Err(ServiceError::Validation(
                "scheduled contests require start_date and end_date".into(),
            ));
        }
    };

    let now = state.now();
    let contest = Contest::new(title.clone(), request.description, schedule, now);

    store
        .insert_contest(contest.clone().into())
        .await
        .map_err(|err| match err {
            StorageError::DuplicateKey { .. } => {
                ServiceError::AlreadyExists(format!("contest `{title}` already exists"))
            }
            other => other.into(),
        })?;

    info!(title = %contest.title, mode = %mode, "contest created");
    Ok(ContestSummary::from_contest(&contest, now))
}

/// Edit the description, or replace the window of a scheduled contest.
pub async fn update_contest(
    state: &SharedState,
    title: &str,
    request: UpdateContestRequest,
) -> Result<ContestSummary, ServiceError> {
    let store = state.require_store().await?;
    let (_, mut contest) = require_contest(&store, title).await?;

    match (request.start_date, request.end_date) {
        (None, None) => {}
        (Some(start), Some(end)) => match &mut contest.schedule {
            ContestSchedule::Scheduled(window) => *window = parse_window(&start, &end)?,
            ContestSchedule::Manual(_) => {
                return Err(ServiceError::Validation(
                    "manual contests do not take a date window".into(),
                ));
            }
        },
        _ => {
            return Err(ServiceError::Validation(
                "start_date and end_date must be supplied together".into(),
            ));
        }
    }

    if let Some(description) = request.description {
        contest.description = description;
    }

    let details = ContestDetailsEntity {
        description: contest.description.clone(),
        window: contest.window().map(|w| (w.start(), w.end())),
    };
    if !store.update_contest_details(title, details).await? {
        return Err(not_found(title));
    }

    info!(title, "contest updated");
    Ok(ContestSummary::from_contest(&contest, state.now()))
}

/// Remove a contest together with its entries and votes.
///
/// Votes and entries go first so a failure leaves the contest in place and a retry
/// redoes the whole cascade. A second sweep after the contest record is gone catches
/// rows inserted while the first one ran.
pub async fn delete_contest(state: &SharedState, title: &str) -> Result<(), ServiceError> {
    let store = state.require_store().await?;

    let mut votes = store.delete_votes(title).await?;
    let mut entries = store.delete_entries(title).await?;
    if !store.delete_contest(title).await? {
        if votes > 0 || entries > 0 {
            warn!(title, votes, entries, "removed rows left behind by an earlier delete");
        }
        return Err(not_found(title));
    }
    votes += store.delete_votes(title).await?;
    entries += store.delete_entries(title).await?;

    info!(title, votes, entries, "contest deleted");
    Ok(())
}

async fn run_command(
    state: &SharedState,
    title: &str,
    command: ContestCommand,
) -> Result<ContestSummary, ServiceError> {
    let store = state.require_store().await?;

    for attempt in 1..=MAX_COMMAND_ATTEMPTS {
        let (entity, mut contest) = require_contest(&store, title).await?;
        let now = state.now();

        let Some(change) = plan(&contest, command, now)? else {
            debug!(title, ?command, "command left contest unchanged");
            return Ok(ContestSummary::from_contest(&contest, now));
        };

        let expected = entity.state;
        let next = change.apply_to_entity(&expected);
        if store.update_contest_state(title, expected, next).await? {
            contest.apply(change);
            let summary = ContestSummary::from_contest(&contest, now);
            info!(
                title,
                ?command,
                phase = ?summary.phase,
                voting_open = summary.voting_open,
                "contest command applied"
            );
            return Ok(summary);
        }

        debug!(title, ?command, attempt, "contest changed concurrently; re-reading");
    }

    Err(ServiceError::Conflict(format!(
        "contest `{title}` kept changing while applying {command:?}"
    )))
}

/// Open a manual contest.
pub async fn start_contest(state: &SharedState, title: &str) -> Result<ContestSummary, ServiceError> {
    run_command(state, title, ContestCommand::StartContest).await
}

/// Close a manual contest.
pub async fn stop_contest(state: &SharedState, title: &str) -> Result<ContestSummary, ServiceError> {
    run_command(state, title, ContestCommand::StopContest).await
}

/// Open voting; the first opening time is kept.
pub async fn start_voting(state: &SharedState, title: &str) -> Result<ContestSummary, ServiceError> {
    run_command(state, title, ContestCommand::StartVoting).await
}

/// Close voting.
pub async fn stop_voting(state: &SharedState, title: &str) -> Result<ContestSummary, ServiceError> {
    run_command(state, title, ContestCommand::StopVoting).await
}

/// Deployment flags as exposed to clients.
pub fn get_mode_config(state: &SharedState) -> ModeConfigResponse {
    state.mode().into()
}
