use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::{open, ping},
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        MongoContestDocument, MongoParticipationDocument, contests_from_documents, optional_date,
    },
};
use crate::dao::{
    contest_store::{ContestStore, EntryStore, Store, VoteStore},
    models::{ContestDetailsEntity, ContestEntity, ContestStateEntity, EntryEntity, VoteEntity},
    storage::StorageResult,
};

const CONTEST_COLLECTION_NAME: &str = "contests";
const ENTRY_COLLECTION_NAME: &str = "entries";
const VOTE_COLLECTION_NAME: &str = "votes";

/// MongoDB implementation of [`Store`].
#[derive(Clone)]
pub struct MongoContestStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        ping(&database)
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = open(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

fn participant_filter(contest_title: &str, identity: &str) -> Document {
    doc! { "contest_title": contest_title, "identity": identity }
}

impl MongoContestStore {
    /// Establish a connection to MongoDB and ensure the unique indexes exist.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = open(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let unique_indexes: [(&'static str, &'static str, Document); 3] = [
            (CONTEST_COLLECTION_NAME, "title", doc! { "title": 1 }),
            (
                ENTRY_COLLECTION_NAME,
                "contest_title,identity",
                doc! { "contest_title": 1, "identity": 1 },
            ),
            (
                VOTE_COLLECTION_NAME,
                "contest_title,identity",
                doc! { "contest_title": 1, "identity": 1 },
            ),
        ];

        for (collection, index, keys) in unique_indexes {
            let model = IndexModel::builder()
                .keys(keys)
                .options(
                    IndexOptions::builder()
                        .name(Some(format!("{collection}_unique_idx")))
                        .unique(Some(true))
                        .build(),
                )
                .build();

            database
                .collection::<Document>(collection)
                .create_index(model)
                .await
                .map_err(|source| MongoDaoError::EnsureIndex {
                    collection,
                    index,
                    source,
                })?;
        }

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn contests(&self) -> Collection<MongoContestDocument> {
        self.database().await.collection(CONTEST_COLLECTION_NAME)
    }

    async fn participation(&self, name: &str) -> Collection<MongoParticipationDocument> {
        self.database().await.collection(name)
    }

    async fn insert_contest(&self, contest: ContestEntity) -> MongoResult<()> {
        let title = contest.title.clone();
        let document: MongoContestDocument = contest.into();
        self.contests()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::Duplicate {
                        collection: CONTEST_COLLECTION_NAME,
                        key: title,
                    }
                } else {
                    MongoDaoError::Write {
                        collection: CONTEST_COLLECTION_NAME,
                        source,
                    }
                }
            })?;
        Ok(())
    }

    async fn find_contest(&self, title: String) -> MongoResult<Option<ContestEntity>> {
        let document = self
            .contests()
            .await
            .find_one(doc! { "title": title.as_str() })
            .await
            .map_err(|source| MongoDaoError::Read {
                collection: CONTEST_COLLECTION_NAME,
                source,
            })?;

        document.map(ContestEntity::try_from).transpose()
    }

    async fn list_contests(&self) -> MongoResult<Vec<ContestEntity>> {
        let read_error = |source: mongodb::error::Error| MongoDaoError::Read {
            collection: CONTEST_COLLECTION_NAME,
            source,
        };

        let documents: Vec<MongoContestDocument> = self
            .contests()
            .await
            .find(doc! {})
            .sort(doc! { "created_at": 1, "title": 1 })
            .await
            .map_err(read_error)?
            .try_collect()
            .await
            .map_err(read_error)?;

        Ok(contests_from_documents(documents))
    }

    async fn update_contest_details(
        &self,
        title: String,
        details: ContestDetailsEntity,
    ) -> MongoResult<bool> {
        let (start, end) = details.window.unzip();
        let update = doc! {
            "$set": {
                "description": details.description,
                "start_date": optional_date(start),
                "end_date": optional_date(end),
            }
        };

        let result = self
            .contests()
            .await
            .update_one(doc! { "title": title.as_str() }, update)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: CONTEST_COLLECTION_NAME,
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn update_contest_state(
        &self,
        title: String,
        expected: ContestStateEntity,
        next: ContestStateEntity,
    ) -> MongoResult<bool> {
        let filter = doc! {
            "title": title.as_str(),
            "contest_status": expected.status.as_str(),
            "voting_open": expected.voting_open,
        };
        let update = doc! {
            "$set": {
                "contest_status": next.status.as_str(),
                "voting_open": next.voting_open,
                "votingOpenedAt": optional_date(next.voting_opened_at),
            }
        };

        let result = self
            .contests()
            .await
            .update_one(filter, update)
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: CONTEST_COLLECTION_NAME,
                source,
            })?;
        Ok(result.matched_count > 0)
    }

    async fn delete_contest(&self, title: String) -> MongoResult<bool> {
        let result = self
            .contests()
            .await
            .delete_one(doc! { "title": title.as_str() })
            .await
            .map_err(|source| MongoDaoError::Write {
                collection: CONTEST_COLLECTION_NAME,
                source,
            })?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_participation(
        &self,
        collection: &'static str,
        document: MongoParticipationDocument,
        key: String,
    ) -> MongoResult<()> {
        self.participation(collection)
            .await
            .insert_one(&document)
            .await
            .map_err(|source| {
                if is_duplicate_key(&source) {
                    MongoDaoError::Duplicate { collection, key }
                } else {
                    MongoDaoError::Write { collection, source }
                }
            })?;
        Ok(())
    }

    async fn find_participation(
        &self,
        collection: &'static str,
        filter: Document,
    ) -> MongoResult<Option<MongoParticipationDocument>> {
        self.participation(collection)
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })
    }

    async fn list_participation(
        &self,
        collection: &'static str,
        contest_title: String,
    ) -> MongoResult<Vec<MongoParticipationDocument>> {
        self.participation(collection)
            .await
            .find(doc! { "contest_title": contest_title.as_str() })
            .sort(doc! { "created_at": 1 })
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Read { collection, source })
    }

    async fn delete_participation(
        &self,
        collection: &'static str,
        contest_title: String,
    ) -> MongoResult<u64> {
        let result = self
            .participation(collection)
            .await
            .delete_many(doc! { "contest_title": contest_title.as_str() })
            .await
            .map_err(|source| MongoDaoError::Write { collection, source })?;
        Ok(result.deleted_count)
    }
}

impl ContestStore for MongoContestStore {
    fn insert_contest(&self, contest: ContestEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_contest(contest).await.map_err(Into::into) })
    }

    fn find_contest(&self, title: &str) -> BoxFuture<'static, StorageResult<Option<ContestEntity>>> {
        let store = self.clone();
        let title = title.to_owned();
        Box::pin(async move { store.find_contest(title).await.map_err(Into::into) })
    }

    fn list_contests(&self) -> BoxFuture<'static, StorageResult<Vec<ContestEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_contests().await.map_err(Into::into) })
    }

    fn update_contest_details(
        &self,
        title: &str,
        details: ContestDetailsEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let title = title.to_owned();
        Box::pin(async move {
            store
                .update_contest_details(title, details)
                .await
                .map_err(Into::into)
        })
    }

    fn update_contest_state(
        &self,
        title: &str,
        expected: ContestStateEntity,
        next: ContestStateEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let title = title.to_owned();
        Box::pin(async move {
            store
                .update_contest_state(title, expected, next)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_contest(&self, title: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let title = title.to_owned();
        Box::pin(async move { store.delete_contest(title).await.map_err(Into::into) })
    }
}

impl EntryStore for MongoContestStore {
    fn insert_entry(&self, entry: EntryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let key = format!("{}/{}", entry.contest_title, entry.identity);
            store
                .insert_participation(ENTRY_COLLECTION_NAME, entry.into(), key)
                .await
                .map_err(Into::into)
        })
    }

    fn find_entry(
        &self,
        contest_title: &str,
        identity: &str,
    ) -> BoxFuture<'static, StorageResult<Option<EntryEntity>>> {
        let store = self.clone();
        let filter = participant_filter(contest_title, identity);
        Box::pin(async move {
            let document = store
                .find_participation(ENTRY_COLLECTION_NAME, filter)
                .await?;
            Ok(document.map(EntryEntity::from))
        })
    }

    fn find_entry_by_photo(
        &self,
        contest_title: &str,
        photo_ref: &str,
    ) -> BoxFuture<'static, StorageResult<Option<EntryEntity>>> {
        let store = self.clone();
        let filter = doc! { "contest_title": contest_title, "photo_ref": photo_ref };
        Box::pin(async move {
            let document = store
                .find_participation(ENTRY_COLLECTION_NAME, filter)
                .await?;
            Ok(document.map(EntryEntity::from))
        })
    }

    fn list_entries(
        &self,
        contest_title: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<EntryEntity>>> {
        let store = self.clone();
        let contest_title = contest_title.to_owned();
        Box::pin(async move {
            let documents = store
                .list_participation(ENTRY_COLLECTION_NAME, contest_title)
                .await?;
            Ok(documents.into_iter().map(EntryEntity::from).collect())
        })
    }

    fn delete_entries(&self, contest_title: &str) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        let contest_title = contest_title.to_owned();
        Box::pin(async move {
            store
                .delete_participation(ENTRY_COLLECTION_NAME, contest_title)
                .await
                .map_err(Into::into)
        })
    }
}

impl VoteStore for MongoContestStore {
    fn insert_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let key = format!("{}/{}", vote.contest_title, vote.identity);
            store
                .insert_participation(VOTE_COLLECTION_NAME, vote.into(), key)
                .await
                .map_err(Into::into)
        })
    }

    fn find_vote(
        &self,
        contest_title: &str,
        identity: &str,
    ) -> BoxFuture<'static, StorageResult<Option<VoteEntity>>> {
        let store = self.clone();
        let filter = participant_filter(contest_title, identity);
        Box::pin(async move {
            let document = store
                .find_participation(VOTE_COLLECTION_NAME, filter)
                .await?;
            Ok(document.map(VoteEntity::from))
        })
    }

    fn delete_votes(&self, contest_title: &str) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        let contest_title = contest_title.to_owned();
        Box::pin(async move {
            store
                .delete_participation(VOTE_COLLECTION_NAME, contest_title)
                .await
                .map_err(Into::into)
        })
    }
}

impl Store for MongoContestStore {
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
