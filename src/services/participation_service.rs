//! Joining contests and voting, gated by [`ParticipationGuard`].
//!
//! The guard decides on a snapshot; the unique `(contest_title, identity)` constraint
//! in storage settles races between identical requests.

use tracing::{debug, info};
use validator::ValidateEmail;

use crate::{
    config::ModeConfig,
    dao::storage::StorageError,
    dto::participation::{EntrySummary, GateResponse, JoinRequest, VoteRequest, VoteSummary},
    error::ServiceError,
    services::contest_service::find_contest,
    state::{
        SharedState,
        contest::{Entry, Vote},
        guard::{Denial, DenialReason, ParticipationGuard},
    },
};

/// Canonical form of an identity under the deployment's identity rules.
///
/// Identities are trimmed and otherwise kept verbatim; in email mode they must be
/// syntactically valid addresses.
pub fn normalize_identity(mode: &ModeConfig, raw: &str) -> Result<String, ServiceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation("identity must not be blank".into()));
    }

    if mode.username_only_mode {
        return Ok(trimmed.to_owned());
    }

    if !trimmed.validate_email() {
        return Err(ServiceError::Validation(format!(
            "identity `{trimmed}` is not a valid email address"
        )));
    }
    Ok(trimmed.to_owned())
}

fn denied(title: &str, reason: DenialReason) -> ServiceError {
    ServiceError::Denied(Denial {
        title: title.to_owned(),
        reason,
    })
}

async fn join_decision(
    state: &SharedState,
    title: &str,
    identity: &str,
) -> Result<Result<(), DenialReason>, ServiceError> {
    let store = state.require_store().await?;
    let contest = find_contest(&store, title).await?.map(|(_, contest)| contest);

    let already_joined = match contest {
        Some(_) => store.find_entry(title, identity).await?.is_some(),
        None => false,
    };

    let decision =
        ParticipationGuard::new(state.mode(), state.now()).can_join(contest.as_ref(), already_joined);
    if let Err(reason) = decision {
        debug!(title, identity, reason = reason.code(), "join denied");
    }
    Ok(decision)
}

async fn vote_decision(
    state: &SharedState,
    title: &str,
    identity: &str,
) -> Result<Result<(), DenialReason>, ServiceError> {
    let store = state.require_store().await?;
    let contest = find_contest(&store, title).await?.map(|(_, contest)| contest);

    let already_voted = match contest {
        Some(_) => store.find_vote(title, identity).await?.is_some(),
        None => false,
    };

    let decision =
        ParticipationGuard::new(state.mode(), state.now()).can_vote(contest.as_ref(), already_voted);
    if let Err(reason) = decision {
        debug!(title, identity, reason = reason.code(), "vote denied");
    }
    Ok(decision)
}

/// Whether `identity` may submit an entry right now.
pub async fn can_join(
    state: &SharedState,
    title: &str,
    identity: &str,
) -> Result<GateResponse, ServiceError> {
    let identity = normalize_identity(state.mode(), identity)?;
    Ok(join_decision(state, title, &identity).await?.into())
}

/// Submit an entry; storage settles concurrent duplicates.
pub async fn join(
    state: &SharedState,
    title: &str,
    request: JoinRequest,
) -> Result<EntrySummary, ServiceError> {
    let identity = normalize_identity(state.mode(), &request.identity)?;
    join_decision(state, title, &identity)
        .await?
        .map_err(|reason| denied(title, reason))?;

    let entry = Entry {
        contest_title: title.to_owned(),
        identity,
        photo_ref: request.photo_ref.trim().to_owned(),
        created_at: state.now(),
    };

    let store = state.require_store().await?;
    store
        .insert_entry(entry.clone().into())
        .await
        .map_err(|err| match err {
            StorageError::DuplicateKey { .. } => denied(title, DenialReason::AlreadyJoined),
            other => other.into(),
        })?;

    info!(title, identity = %entry.identity, "entry submitted");
    Ok(entry.into())
}

/// Whether `identity` may vote right now.
pub async fn can_vote(
    state: &SharedState,
    title: &str,
    identity: &str,
) -> Result<GateResponse, ServiceError> {
    let identity = normalize_identity(state.mode(), identity)?;
    Ok(vote_decision(state, title, &identity).await?.into())
}

/// Vote for an existing entry; storage settles concurrent duplicates.
pub async fn vote(
    state: &SharedState,
    title: &str,
    request: VoteRequest,
) -> Result<VoteSummary, ServiceError> {
    let identity = normalize_identity(state.mode(), &request.identity)?;
    vote_decision(state, title, &identity)
        .await?
        .map_err(|reason| denied(title, reason))?;

    let photo_ref = request.photo_ref.trim().to_owned();
    let store = state.require_store().await?;
    if store.find_entry_by_photo(title, &photo_ref).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "no entry with photo `{photo_ref}` in contest `{title}`"
        )));
    }

    let vote = Vote {
        contest_title: title.to_owned(),
        identity,
        photo_ref,
        created_at: state.now(),
    };

    store
        .insert_vote(vote.clone().into())
        .await
        .map_err(|err| match err {
            StorageError::DuplicateKey { .. } => denied(title, DenialReason::AlreadyVoted),
            other => other.into(),
        })?;

    info!(title, identity = %vote.identity, "vote cast");
    Ok(vote.into())
}

/// The vote an identity already cast in a contest, showing which photo it went to.
pub async fn get_vote(
    state: &SharedState,
    title: &str,
    identity: &str,
) -> Result<VoteSummary, ServiceError> {
    let identity = normalize_identity(state.mode(), identity)?;
    let store = state.require_store().await?;
    if store.find_contest(title).await?.is_none() {
        return Err(ServiceError::NotFound(format!("contest `{title}` not found")));
    }

    store
        .find_vote(title, &identity)
        .await?
        .map(|vote| Vote::from(vote).into())
        .ok_or_else(|| {
            ServiceError::NotFound(format!("`{identity}` has not voted in contest `{title}`"))
        })
}

/// Entries of an existing contest, oldest first.
pub async fn list_entries(
    state: &SharedState,
    title: &str,
) -> Result<Vec<EntrySummary>, ServiceError> {
    let store = state.require_store().await?;
    if store.find_contest(title).await?.is_none() {
        return Err(ServiceError::NotFound(format!("contest `{title}` not found")));
    }

    let entries = store.list_entries(title).await?;
    Ok(entries
        .into_iter()
        .map(|entry| Entry::from(entry).into())
        .collect())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        dto::{contest::CreateContestRequest, phase::ControlModeDto},
        services::{
            contest_service::{create_contest, start_contest, start_voting, stop_contest},
            test_support::{DAY, memory_state, t0},
        },
    };

    fn join_request(identity: &str, photo_ref: &str) -> JoinRequest {
        JoinRequest {
            identity: identity.into(),
            photo_ref: photo_ref.into(),
        }
    }

    fn vote_request(identity: &str, photo_ref: &str) -> VoteRequest {
        VoteRequest {
            identity: identity.into(),
            photo_ref: photo_ref.into(),
        }
    }

    fn reason_of(err: ServiceError) -> DenialReason {
        match err {
            ServiceError::Denied(denial) => denial.reason,
            other => panic!("expected a denial, got {other:?}"),
        }
    }

    async fn create_manual(state: &SharedState, title: &str) {
        create_contest(
            state,
            CreateContestRequest {
                title: title.into(),
                description: String::new(),
                control_mode: Some(ControlModeDto::Manual),
                start_date: None,
                end_date: None,
            },
        )
        .await
        .unwrap();
    }

    #[test]
    fn identities_are_normalized_per_mode() {
        let email = ModeConfig::default();
        assert_eq!(normalize_identity(&email, "  A@X.com ").unwrap(), "A@X.com");
        assert!(normalize_identity(&email, "alice").is_err());
        assert!(normalize_identity(&email, "   ").is_err());

        let usernames = ModeConfig {
            username_only_mode: true,
            ..ModeConfig::default()
        };
        assert_eq!(normalize_identity(&usernames, " Alice ").unwrap(), "Alice");
        assert!(normalize_identity(&usernames, "").is_err());
    }

    #[tokio::test]
    async fn scheduled_contest_accepts_joins_only_inside_window() {
        let (state, clock) = memory_state(ModeConfig::default()).await;
        clock.set(t0() - DAY);
        create_contest(
            &state,
            CreateContestRequest {
                title: "Fall".into(),
                description: String::new(),
                control_mode: Some(ControlModeDto::Scheduled),
                start_date: Some("2023-11-14T22:13:20Z".into()),
                end_date: Some("2023-11-17T22:13:20Z".into()),
            },
        )
        .await
        .unwrap();

        let early = can_join(&state, "Fall", "a@x.com").await.unwrap();
        assert!(!early.allowed);
        assert_eq!(early.reason.as_deref(), Some("contest_not_active"));

        clock.set(t0() + Duration::from_secs(1));
        assert!(can_join(&state, "Fall", "a@x.com").await.unwrap().allowed);
        join(&state, "Fall", join_request("a@x.com", "url1"))
            .await
            .unwrap();

        clock.set(t0() + 3 * DAY);
        let late = join(&state, "Fall", join_request("b@x.com", "url2"))
            .await
            .unwrap_err();
        assert_eq!(
            reason_of(late),
            DenialReason::ContestNotActive(crate::state::contest::ContestPhase::Ended)
        );
    }

    #[tokio::test]
    async fn manual_contest_full_cycle() {
        let (state, _clock) = memory_state(ModeConfig::default()).await;
        create_manual(&state, "Halloween").await;

        assert!(!can_join(&state, "Halloween", "a@x.com").await.unwrap().allowed);
        start_contest(&state, "Halloween").await.unwrap();
        join(&state, "Halloween", join_request("a@x.com", "url1"))
            .await
            .unwrap();

        assert!(!can_vote(&state, "Halloween", "b@x.com").await.unwrap().allowed);
        start_voting(&state, "Halloween").await.unwrap();
        stop_contest(&state, "Halloween").await.unwrap();

        assert!(can_vote(&state, "Halloween", "b@x.com").await.unwrap().allowed);
        let cast = vote(&state, "Halloween", vote_request("b@x.com", "url1"))
            .await
            .unwrap();
        assert_eq!(cast.photo_ref, "url1");
    }

    #[tokio::test]
    async fn second_join_is_a_conflict() {
        let (state, _clock) = memory_state(ModeConfig::default()).await;
        create_manual(&state, "Halloween").await;
        start_contest(&state, "Halloween").await.unwrap();

        join(&state, "Halloween", join_request("a@x.com", "url1"))
            .await
            .unwrap();
        let err = join(&state, "Halloween", join_request(" a@x.com ", "url2"))
            .await
            .unwrap_err();
        assert_eq!(reason_of(err), DenialReason::AlreadyJoined);
        assert_eq!(list_entries(&state, "Halloween").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cast_vote_can_be_looked_up_by_identity() {
        let (state, _clock) = memory_state(ModeConfig::default()).await;
        create_manual(&state, "Halloween").await;
        start_contest(&state, "Halloween").await.unwrap();
        join(&state, "Halloween", join_request("a@x.com", "url1"))
            .await
            .unwrap();
        join(&state, "Halloween", join_request("b@x.com", "url2"))
            .await
            .unwrap();
        start_voting(&state, "Halloween").await.unwrap();

        assert!(matches!(
            get_vote(&state, "Halloween", "c@x.com").await,
            Err(ServiceError::NotFound(_))
        ));

        vote(&state, "Halloween", vote_request("c@x.com", "url2"))
            .await
            .unwrap();
        let found = get_vote(&state, "Halloween", " c@x.com ").await.unwrap();
        assert_eq!(found.photo_ref, "url2");
        assert_eq!(found.identity, "c@x.com");

        assert!(matches!(
            get_vote(&state, "Nope", "c@x.com").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            get_vote(&state, "Halloween", "not-an-email").await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn identities_differing_in_case_are_distinct_participants() {
        let (state, _clock) = memory_state(ModeConfig::default()).await;
        create_manual(&state, "Halloween").await;
        start_contest(&state, "Halloween").await.unwrap();

        let first = join(&state, "Halloween", join_request("Alice@X.com", "url1"))
            .await
            .unwrap();
        assert_eq!(first.identity, "Alice@X.com");
        join(&state, "Halloween", join_request("alice@x.com", "url2"))
            .await
            .unwrap();

        assert_eq!(list_entries(&state, "Halloween").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn second_vote_is_a_conflict() {
        let (state, _clock) = memory_state(ModeConfig::default()).await;
        create_manual(&state, "Halloween").await;
        start_contest(&state, "Halloween").await.unwrap();
        join(&state, "Halloween", join_request("a@x.com", "url1"))
            .await
            .unwrap();
        join(&state, "Halloween", join_request("b@x.com", "url2"))
            .await
            .unwrap();
        start_voting(&state, "Halloween").await.unwrap();

        vote(&state, "Halloween", vote_request("c@x.com", "url1"))
            .await
            .unwrap();
        let err = vote(&state, "Halloween", vote_request("c@x.com", "url2"))
            .await
            .unwrap_err();
        assert_eq!(reason_of(err), DenialReason::AlreadyVoted);
    }

    #[tokio::test]
    async fn join_closes_when_voting_opens_if_configured() {
        let mode = ModeConfig {
            disable_join_when_voting_starts: true,
            ..ModeConfig::default()
        };
        let (state, _clock) = memory_state(mode).await;
        create_manual(&state, "Halloween").await;
        start_contest(&state, "Halloween").await.unwrap();
        start_voting(&state, "Halloween").await.unwrap();

        let gate = can_join(&state, "Halloween", "c@x.com").await.unwrap();
        assert!(!gate.allowed);
        assert_eq!(gate.reason.as_deref(), Some("join_closed_by_voting"));

        let err = join(&state, "Halloween", join_request("c@x.com", "url3"))
            .await
            .unwrap_err();
        assert_eq!(reason_of(err), DenialReason::JoinClosedByVoting);
    }

    #[tokio::test]
    async fn vote_requires_existing_photo() {
        let (state, _clock) = memory_state(ModeConfig::default()).await;
        create_manual(&state, "Halloween").await;
        start_voting(&state, "Halloween").await.unwrap();

        let err = vote(&state, "Halloween", vote_request("a@x.com", "missing"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn unknown_contest_is_reported_by_gates() {
        let (state, _clock) = memory_state(ModeConfig::default()).await;

        let gate = can_vote(&state, "Nope", "a@x.com").await.unwrap();
        assert_eq!(gate.reason.as_deref(), Some("contest_not_found"));

        let err = join(&state, "Nope", join_request("a@x.com", "url1"))
            .await
            .unwrap_err();
        assert_eq!(reason_of(err), DenialReason::ContestNotFound);
        assert!(matches!(
            list_entries(&state, "Nope").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_joins_store_one_entry() {
        let (state, _clock) = memory_state(ModeConfig::default()).await;
        create_manual(&state, "Halloween").await;
        start_contest(&state, "Halloween").await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let state = state.clone();
                tokio::spawn(async move {
                    join(&state, "Halloween", join_request("a@x.com", &format!("url{i}"))).await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) => assert_eq!(reason_of(err), DenialReason::AlreadyJoined),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(list_entries(&state, "Halloween").await.unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_duplicate_votes_store_one_vote() {
        let (state, _clock) = memory_state(ModeConfig::default()).await;
        create_manual(&state, "Halloween").await;
        start_contest(&state, "Halloween").await.unwrap();
        join(&state, "Halloween", join_request("a@x.com", "url1"))
            .await
            .unwrap();
        start_voting(&state, "Halloween").await.unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move {
                    vote(&state, "Halloween", vote_request("b@x.com", "url1")).await
                })
            })
            .collect();

        let mut accepted = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => accepted += 1,
                Err(err) => assert_eq!(reason_of(err), DenialReason::AlreadyVoted),
            }
        }
        assert_eq!(accepted, 1);
    }
}
