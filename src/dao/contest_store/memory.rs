//! Process-local store backed by concurrent maps.
//!
//! Uniqueness is enforced through the map entry API so concurrent inserts for the
//! same key resolve to exactly one winner.

use std::sync::Arc;

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;

use crate::dao::{
    contest_store::{ContestStore, EntryStore, Store, VoteStore},
    models::{ContestDetailsEntity, ContestEntity, ContestStateEntity, EntryEntity, VoteEntity},
    storage::{StorageError, StorageResult},
};

type ParticipantKey = (String, String);

/// In-memory implementation of [`Store`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    contests: DashMap<String, ContestEntity>,
    entries: DashMap<ParticipantKey, EntryEntity>,
    votes: DashMap<ParticipantKey, VoteEntity>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn participant_key(contest_title: &str, identity: &str) -> ParticipantKey {
    (contest_title.to_owned(), identity.to_owned())
}

fn remove_by_contest<V>(map: &DashMap<ParticipantKey, V>, contest_title: &str) -> u64 {
    let keys: Vec<ParticipantKey> = map
        .iter()
        .filter(|item| item.key().0 == contest_title)
        .map(|item| item.key().clone())
        .collect();

    keys.iter().filter(|key| map.remove(*key).is_some()).count() as u64
}

impl ContestStore for MemoryStore {
    fn insert_contest(&self, contest: ContestEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            match store.inner.contests.entry(contest.title.clone()) {
                Entry::Occupied(_) => Err(StorageError::duplicate("contests", contest.title)),
                Entry::Vacant(slot) => {
                    slot.insert(contest);
                    Ok(())
                }
            }
        })
    }

    fn find_contest(&self, title: &str) -> BoxFuture<'static, StorageResult<Option<ContestEntity>>> {
        let store = self.clone();
        let title = title.to_owned();
        Box::pin(async move {
            Ok(store
                .inner
                .contests
                .get(&title)
                .map(|entry| entry.value().clone()))
        })
    }

    fn list_contests(&self) -> BoxFuture<'static, StorageResult<Vec<ContestEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let mut contests: Vec<ContestEntity> = store
                .inner
                .contests
                .iter()
                .map(|entry| entry.value().clone())
                .collect();
            contests.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.title.cmp(&b.title)));
            Ok(contests)
        })
    }

    fn update_contest_details(
        &self,
        title: &str,
        details: ContestDetailsEntity,
    ) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let title = title.to_owned();
        Box::pin(async move {
            let Some(mut contest) = store.inner.contests.get_mut(&title) else {
                return Ok(false);
            };
            contest.description = details.description;
            contest.start_date = details.window.map(|(start, _)| start);
            contest.end_date = details.window.map(|(_, end)| end);
            Ok(true)
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
            let Some(mut contest) = store.inner.contests.get_mut(&title) else {
                return Ok(false);
            };
            if contest.state.status != expected.status
                || contest.state.voting_open != expected.voting_open
            {
                return Ok(false);
            }
            contest.state = next;
            Ok(true)
        })
    }

    fn delete_contest(&self, title: &str) -> BoxFuture<'static, StorageResult<bool>> {
        let store = self.clone();
        let title = title.to_owned();
        Box::pin(async move { Ok(store.inner.contests.remove(&title).is_some()) })
    }
}

impl EntryStore for MemoryStore {
    fn insert_entry(&self, entry: EntryEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let key = participant_key(&entry.contest_title, &entry.identity);
            match store.inner.entries.entry(key) {
                Entry::Occupied(occupied) => {
                    let (title, identity) = occupied.key();
                    Err(StorageError::duplicate("entries", format!("{title}/{identity}")))
                }
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                    Ok(())
                }
            }
        })
    }

    fn find_entry(
        &self,
        contest_title: &str,
        identity: &str,
    ) -> BoxFuture<'static, StorageResult<Option<EntryEntity>>> {
        let store = self.clone();
        let key = participant_key(contest_title, identity);
        Box::pin(async move {
            Ok(store
                .inner
                .entries
                .get(&key)
                .map(|entry| entry.value().clone()))
        })
    }

    fn find_entry_by_photo(
        &self,
        contest_title: &str,
        photo_ref: &str,
    ) -> BoxFuture<'static, StorageResult<Option<EntryEntity>>> {
        let store = self.clone();
        let contest_title = contest_title.to_owned();
        let photo_ref = photo_ref.to_owned();
        Box::pin(async move {
            Ok(store
                .inner
                .entries
                .iter()
                .find(|entry| {
                    entry.contest_title == contest_title && entry.photo_ref == photo_ref
                })
                .map(|entry| entry.value().clone()))
        })
    }

    fn list_entries(
        &self,
        contest_title: &str,
    ) -> BoxFuture<'static, StorageResult<Vec<EntryEntity>>> {
        let store = self.clone();
        let contest_title = contest_title.to_owned();
        Box::pin(async move {
            let mut entries: Vec<EntryEntity> = store
                .inner
                .entries
                .iter()
                .filter(|entry| entry.contest_title == contest_title)
                .map(|entry| entry.value().clone())
                .collect();
            entries.sort_by(|a, b| a.created_at.cmp(&b.created_at));
            Ok(entries)
        })
    }

    fn delete_entries(&self, contest_title: &str) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        let contest_title = contest_title.to_owned();
        Box::pin(async move { Ok(remove_by_contest(&store.inner.entries, &contest_title)) })
    }
}

impl VoteStore for MemoryStore {
    fn insert_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let key = participant_key(&vote.contest_title, &vote.identity);
            match store.inner.votes.entry(key) {
                Entry::Occupied(occupied) => {
                    let (title, identity) = occupied.key();
                    Err(StorageError::duplicate("votes", format!("{title}/{identity}")))
                }
                Entry::Vacant(slot) => {
                    slot.insert(vote);
                    Ok(())
                }
            }
        })
    }

    fn find_vote(
        &self,
        contest_title: &str,
        identity: &str,
    ) -> BoxFuture<'static, StorageResult<Option<VoteEntity>>> {
        let store = self.clone();
        let key = participant_key(contest_title, identity);
        Box::pin(async move {
            Ok(store
                .inner
                .votes
                .get(&key)
                .map(|vote| vote.value().clone()))
        })
    }

    fn delete_votes(&self, contest_title: &str) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        let contest_title = contest_title.to_owned();
        Box::pin(async move { Ok(remove_by_contest(&store.inner.votes, &contest_title)) })
    }
}

impl Store for MemoryStore {
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, SystemTime};

    use uuid::Uuid;

    use super::*;
    use crate::dao::models::ContestStatusEntity;

    fn contest(title: &str) -> ContestEntity {
        ContestEntity {
            id: Uuid::new_v4(),
            title: title.into(),
            description: "desc".into(),
            manual_control: true,
            start_date: None,
            end_date: None,
            state: ContestStateEntity::default(),
            created_at: SystemTime::UNIX_EPOCH + Duration::from_secs(10),
        }
    }

    fn entry(title: &str, identity: &str, photo_ref: &str) -> EntryEntity {
        EntryEntity {
            contest_title: title.into(),
            identity: identity.into(),
            photo_ref: photo_ref.into(),
            created_at: SystemTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn duplicate_contest_title_is_rejected() {
        let store = MemoryStore::new();
        store.insert_contest(contest("Fall")).await.unwrap();

        let err = store.insert_contest(contest("Fall")).await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::DuplicateKey {
                collection: "contests",
                ..
            }
        ));
    }

    #[tokio::test]
    async fn state_update_requires_expected_state() {
        let store = MemoryStore::new();
        store.insert_contest(contest("Halloween")).await.unwrap();

        let stale = ContestStateEntity {
            status: ContestStatusEntity::Active,
            ..ContestStateEntity::default()
        };
        let next = ContestStateEntity {
            voting_open: true,
            ..ContestStateEntity::default()
        };
        assert!(
            !store
                .update_contest_state("Halloween", stale, next.clone())
                .await
                .unwrap()
        );
        assert!(
            store
                .update_contest_state("Halloween", ContestStateEntity::default(), next.clone())
                .await
                .unwrap()
        );

        let stored = store.find_contest("Halloween").await.unwrap().unwrap();
        assert_eq!(stored.state, next);
    }

    #[tokio::test]
    async fn concurrent_duplicate_entries_produce_one_row() {
        let store = MemoryStore::new();
        let mut handles = Vec::new();
        for attempt in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .insert_entry(entry("Halloween", "a@x.com", &format!("url{attempt}")))
                    .await
            }));
        }

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(store.list_entries("Halloween").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn cascade_helpers_only_touch_one_contest() {
        let store = MemoryStore::new();
        store.insert_entry(entry("Fall", "a@x.com", "url1")).await.unwrap();
        store.insert_entry(entry("Fall", "b@x.com", "url2")).await.unwrap();
        store.insert_entry(entry("Halloween", "a@x.com", "url3")).await.unwrap();

        assert_eq!(store.delete_entries("Fall").await.unwrap(), 2);
        assert!(store.list_entries("Fall").await.unwrap().is_empty());
        assert_eq!(store.list_entries("Halloween").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn entries_can_be_found_by_photo() {
        let store = MemoryStore::new();
        store.insert_entry(entry("Fall", "a@x.com", "url1")).await.unwrap();

        assert!(store.find_entry_by_photo("Fall", "url1").await.unwrap().is_some());
        assert!(store.find_entry_by_photo("Fall", "url2").await.unwrap().is_none());
        assert!(
            store
                .find_entry_by_photo("Halloween", "url1")
                .await
                .unwrap()
                .is_none()
        );
    }
}
