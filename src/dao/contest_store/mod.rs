/// In-process backend used by tests and `STORAGE_BACKEND=memory`.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{
    ContestDetailsEntity, ContestEntity, ContestStateEntity, EntryEntity, VoteEntity,
};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Durable contest records keyed by title.
pub trait ContestStore: Send + Sync {
    /// Insert a new contest; fails with `DuplicateKey` when the title is taken.
    fn insert_contest(&self, contest: ContestEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Contest stored under `title`, if any.
    fn find_contest(&self, title: &str) -> BoxFuture<'static, StorageResult<Option<ContestEntity>>>;
    /// All contests ordered by creation time.
    fn list_contests(&self) -> BoxFuture<'static, StorageResult<Vec<ContestEntity>>>;
    /// Replace the editable fields; returns `false` when no contest matched.
    fn update_contest_details(
        &self,
        title: &str,
        details: ContestDetailsEntity,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Conditionally replace the command-controlled state.
    ///
    /// The write only happens when the stored status and voting flag still equal
    /// `expected`; returns whether it happened.
    fn update_contest_state(
        &self,
        title: &str,
        expected: ContestStateEntity,
        next: ContestStateEntity,
    ) -> BoxFuture<'static, StorageResult<bool>>;
    /// Remove a contest record; returns `false` when no contest matched.
    fn delete_contest(&self, title: &str) -> BoxFuture<'static, StorageResult<bool>>;
}

/// Durable entries, unique per `(contest_title, identity)`.
pub trait EntryStore: Send + Sync {
    /// Atomically insert an entry; fails with `DuplicateKey` when one exists.
    fn insert_entry(&self, entry: EntryEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Entry submitted by `identity`, if any.
    fn find_entry(
        &self,
        contest_title: &str,
        identity: &str,
    ) -> BoxFuture<'static, StorageResult<Option<EntryEntity>>>;
    /// Entry carrying `photo_ref`, if any.
    fn find_entry_by_photo(
        &self,
        contest_title: &str,
        photo_ref: &str,
    ) -> BoxFuture<'static, StorageResult<Option<EntryEntity>>>;
    /// Entries of a contest ordered by submission time.
    fn list_entries(&self, contest_title: &str)
    -> BoxFuture<'static, StorageResult<Vec<EntryEntity>>>;
    /// Cascade helper removing every entry of a contest; returns the count.
    fn delete_entries(&self, contest_title: &str) -> BoxFuture<'static, StorageResult<u64>>;
}

/// Durable votes, unique per `(contest_title, identity)`.
pub trait VoteStore: Send + Sync {
    /// Atomically insert a vote; fails with `DuplicateKey` when one exists.
    fn insert_vote(&self, vote: VoteEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Vote cast by `identity`, if any.
    fn find_vote(
        &self,
        contest_title: &str,
        identity: &str,
    ) -> BoxFuture<'static, StorageResult<Option<VoteEntity>>>;
    /// Cascade helper removing every vote of a contest; returns the count.
    fn delete_votes(&self, contest_title: &str) -> BoxFuture<'static, StorageResult<u64>>;
}

/// Complete persistence backend installed into the application state.
pub trait Store: ContestStore + EntryStore + VoteStore {
    /// Cheap liveness probe of the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection in place.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
