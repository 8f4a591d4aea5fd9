//! Participation gate deciding whether an identity may join or vote right now.

use std::time::SystemTime;

use thiserror::Error;

use crate::{
    config::ModeConfig,
    state::contest::{Contest, ContestPhase},
};

/// Why a join or vote was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DenialReason {
    /// No contest carries the requested title.
    #[error("contest not found")]
    ContestNotFound,
    /// Joining requires the active phase.
    #[error("contest is not active (phase {0})")]
    ContestNotActive(ContestPhase),
    /// Voting has opened and the deployment forbids late entries.
    #[error("joining is closed because voting has started")]
    JoinClosedByVoting,
    /// The identity already has an entry in this contest.
    #[error("identity has already joined this contest")]
    AlreadyJoined,
    /// Voting is closed for this contest.
    #[error("voting is not open for this contest")]
    VotingClosed,
    /// The identity already voted in this contest.
    #[error("identity has already voted in this contest")]
    AlreadyVoted,
}

/// Broad category of a denial, used to pick the outward error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    /// The target does not exist.
    NotFound,
    /// The operation was already performed.
    Conflict,
    /// Policy forbids the operation right now.
    Forbidden,
}

impl DenialReason {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            DenialReason::ContestNotFound => "contest_not_found",
            DenialReason::ContestNotActive(_) => "contest_not_active",
            DenialReason::JoinClosedByVoting => "join_closed_by_voting",
            DenialReason::AlreadyJoined => "already_joined",
            DenialReason::VotingClosed => "voting_closed",
            DenialReason::AlreadyVoted => "already_voted",
        }
    }

    /// Category of this denial.
    pub fn kind(&self) -> DenialKind {
        match self {
            DenialReason::ContestNotFound => DenialKind::NotFound,
            DenialReason::AlreadyJoined | DenialReason::AlreadyVoted => DenialKind::Conflict,
            DenialReason::ContestNotActive(_)
            | DenialReason::JoinClosedByVoting
            | DenialReason::VotingClosed => DenialKind::Forbidden,
        }
    }
}

/// A refused participation attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason} (contest `{title}`)")]
pub struct Denial {
    /// Contest the request targeted.
    pub title: String,
    /// Why it was refused.
    pub reason: DenialReason,
}

/// Evaluates join and vote eligibility against a contest snapshot.
#[derive(Debug, Clone, Copy)]
pub struct ParticipationGuard<'a> {
    mode: &'a ModeConfig,
    now: SystemTime,
}

impl<'a> ParticipationGuard<'a> {
    /// Guard evaluating at `now` under the process-wide mode flags.
    pub fn new(mode: &'a ModeConfig, now: SystemTime) -> Self {
        Self { mode, now }
    }

    /// Whether an identity may submit an entry.
    ///
    /// `already_joined` must reflect the entry store for the same identity; it is
    /// ignored when the contest is missing.
    pub fn can_join(
        &self,
        contest: Option<&Contest>,
        already_joined: bool,
    ) -> Result<(), DenialReason> {
        let contest = contest.ok_or(DenialReason::ContestNotFound)?;

        if already_joined {
            return Err(DenialReason::AlreadyJoined);
        }

        let phase = contest.phase(self.now);
        if phase != ContestPhase::Active {
            return Err(DenialReason::ContestNotActive(phase));
        }

        if self.mode.disable_join_when_voting_starts && contest.voting.open {
            return Err(DenialReason::JoinClosedByVoting);
        }

        Ok(())
    }

    /// Whether an identity may cast a vote. The contest phase plays no role.
    pub fn can_vote(
        &self,
        contest: Option<&Contest>,
        already_voted: bool,
    ) -> Result<(), DenialReason> {
        let contest = contest.ok_or(DenialReason::ContestNotFound)?;

        if already_voted {
            return Err(DenialReason::AlreadyVoted);
        }

        if !contest.voting.open {
            return Err(DenialReason::VotingClosed);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::contest::{ContestSchedule, ContestStatus, Window};

    fn t0() -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000)
    }

    fn manual(status: ContestStatus, voting_open: bool) -> Contest {
        let mut contest = Contest::new(
            "Halloween".into(),
            "".into(),
            ContestSchedule::Manual(status),
            t0(),
        );
        contest.voting.open = voting_open;
        contest
    }

    fn fall() -> Contest {
        let window = Window::new(t0(), t0() + Duration::from_secs(3 * 86_400)).unwrap();
        Contest::new("Fall".into(), "".into(), ContestSchedule::Scheduled(window), t0())
    }

    #[test]
    fn join_requires_existing_contest() {
        let mode = ModeConfig::default();
        let guard = ParticipationGuard::new(&mode, t0());
        assert_eq!(guard.can_join(None, false), Err(DenialReason::ContestNotFound));
    }

    #[test]
    fn join_follows_scheduled_window() {
        let mode = ModeConfig::default();
        let contest = fall();

        let before = ParticipationGuard::new(&mode, t0() - Duration::from_secs(1));
        assert_eq!(
            before.can_join(Some(&contest), false),
            Err(DenialReason::ContestNotActive(ContestPhase::NotStarted))
        );

        let during = ParticipationGuard::new(&mode, t0() + Duration::from_secs(1));
        assert_eq!(during.can_join(Some(&contest), false), Ok(()));

        let after = ParticipationGuard::new(&mode, t0() + Duration::from_secs(3 * 86_400));
        assert_eq!(
            after.can_join(Some(&contest), false),
            Err(DenialReason::ContestNotActive(ContestPhase::Ended))
        );
    }

    #[test]
    fn join_follows_manual_status() {
        let mode = ModeConfig::default();
        let guard = ParticipationGuard::new(&mode, t0());

        assert!(
            guard
                .can_join(Some(&manual(ContestStatus::NotStarted, false)), false)
                .is_err()
        );
        assert!(
            guard
                .can_join(Some(&manual(ContestStatus::Active, false)), false)
                .is_ok()
        );
        assert!(
            guard
                .can_join(Some(&manual(ContestStatus::Ended, false)), false)
                .is_err()
        );
    }

    #[test]
    fn duplicate_join_is_reported_as_already_done() {
        let mode = ModeConfig::default();
        let guard = ParticipationGuard::new(&mode, t0());
        let contest = manual(ContestStatus::Active, false);

        let reason = guard.can_join(Some(&contest), true).unwrap_err();
        assert_eq!(reason, DenialReason::AlreadyJoined);
        assert_eq!(reason.kind(), DenialKind::Conflict);
    }

    #[test]
    fn open_voting_closes_join_only_when_flag_is_set() {
        let contest = manual(ContestStatus::Active, true);

        let permissive = ModeConfig::default();
        let guard = ParticipationGuard::new(&permissive, t0());
        assert_eq!(guard.can_join(Some(&contest), false), Ok(()));

        let strict = ModeConfig {
            disable_join_when_voting_starts: true,
            ..ModeConfig::default()
        };
        let guard = ParticipationGuard::new(&strict, t0());
        let reason = guard.can_join(Some(&contest), false).unwrap_err();
        assert_eq!(reason, DenialReason::JoinClosedByVoting);
        assert_eq!(reason.kind(), DenialKind::Forbidden);
    }

    #[test]
    fn vote_requires_open_voting_regardless_of_phase() {
        let mode = ModeConfig::default();
        let guard = ParticipationGuard::new(&mode, t0());

        assert_eq!(
            guard.can_vote(Some(&manual(ContestStatus::Active, false)), false),
            Err(DenialReason::VotingClosed)
        );
        assert_eq!(
            guard.can_vote(Some(&manual(ContestStatus::Ended, true)), false),
            Ok(())
        );
        assert_eq!(
            guard.can_vote(Some(&manual(ContestStatus::NotStarted, true)), false),
            Ok(())
        );
    }

    #[test]
    fn second_vote_is_refused() {
        let mode = ModeConfig::default();
        let guard = ParticipationGuard::new(&mode, t0());
        assert_eq!(
            guard.can_vote(Some(&manual(ContestStatus::Active, true)), true),
            Err(DenialReason::AlreadyVoted)
        );
        assert_eq!(guard.can_vote(None, false), Err(DenialReason::ContestNotFound));
    }

    #[test]
    fn denial_codes_are_stable() {
        assert_eq!(DenialReason::JoinClosedByVoting.code(), "join_closed_by_voting");
        assert_eq!(
            DenialReason::ContestNotActive(ContestPhase::Ended).to_string(),
            "contest is not active (phase ended)"
        );
    }
}
