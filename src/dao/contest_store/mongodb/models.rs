use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use super::error::{MongoDaoError, MongoResult};
use crate::dao::models::{
    ContestEntity, ContestStateEntity, ContestStatusEntity, EntryEntity, VoteEntity,
};

/// Contest as stored in the `contests` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoContestDocument {
    #[serde(rename = "_id")]
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    start_date: Option<DateTime>,
    #[serde(default)]
    end_date: Option<DateTime>,
    #[serde(default)]
    contest_status: ContestStatusEntity,
    #[serde(default)]
    voting_open: bool,
    #[serde(rename = "votingOpenedAt", default)]
    voting_opened_at: Option<DateTime>,
    #[serde(default)]
    manual_control: bool,
    created_at: DateTime,
}

impl From<ContestEntity> for MongoContestDocument {
    fn from(value: ContestEntity) -> Self {
        Self {
            id: value.id.to_string(),
            title: value.title,
            description: value.description,
            start_date: value.start_date.map(DateTime::from_system_time),
            end_date: value.end_date.map(DateTime::from_system_time),
            contest_status: value.state.status,
            voting_open: value.state.voting_open,
            voting_opened_at: value.state.voting_opened_at.map(DateTime::from_system_time),
            manual_control: value.manual_control,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl TryFrom<MongoContestDocument> for ContestEntity {
    type Error = MongoDaoError;

    fn try_from(value: MongoContestDocument) -> MongoResult<Self> {
        let id = Uuid::parse_str(&value.id).map_err(|source| MongoDaoError::MalformedDocument {
            title: value.title.clone(),
            source,
        })?;

        Ok(Self {
            id,
            title: value.title,
            description: value.description,
            manual_control: value.manual_control,
            start_date: value.start_date.map(DateTime::to_system_time),
            end_date: value.end_date.map(DateTime::to_system_time),
            state: ContestStateEntity {
                status: value.contest_status,
                voting_open: value.voting_open,
                voting_opened_at: value.voting_opened_at.map(DateTime::to_system_time),
            },
            created_at: value.created_at.to_system_time(),
        })
    }
}

/// Shared shape of entry and vote documents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoParticipationDocument {
    contest_title: String,
    identity: String,
    photo_ref: String,
    created_at: DateTime,
}

impl From<EntryEntity> for MongoParticipationDocument {
    fn from(value: EntryEntity) -> Self {
        Self {
            contest_title: value.contest_title,
            identity: value.identity,
            photo_ref: value.photo_ref,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoParticipationDocument> for EntryEntity {
    fn from(value: MongoParticipationDocument) -> Self {
        Self {
            contest_title: value.contest_title,
            identity: value.identity,
            photo_ref: value.photo_ref,
            created_at: value.created_at.to_system_time(),
        }
    }
}

impl From<VoteEntity> for MongoParticipationDocument {
    fn from(value: VoteEntity) -> Self {
        Self {
            contest_title: value.contest_title,
            identity: value.identity,
            photo_ref: value.photo_ref,
            created_at: DateTime::from_system_time(value.created_at),
        }
    }
}

impl From<MongoParticipationDocument> for VoteEntity {
    fn from(value: MongoParticipationDocument) -> Self {
        Self {
            contest_title: value.contest_title,
            identity: value.identity,
            photo_ref: value.photo_ref,
            created_at: value.created_at.to_system_time(),
        }
    }
}

/// BSON date for an optional timestamp.
pub fn optional_date(value: Option<std::time::SystemTime>) -> Option<DateTime> {
    value.map(DateTime::from_system_time)
}

/// Convert listed documents, skipping and logging the ones that no longer map onto a contest.
pub fn contests_from_documents(documents: Vec<MongoContestDocument>) -> Vec<ContestEntity> {
    documents
        .into_iter()
        .filter_map(|document| match ContestEntity::try_from(document) {
            Ok(contest) => Some(contest),
            Err(err) => {
                warn!(error = %err, "skipping malformed contest document");
                None
            }
        })
        .collect()
}
