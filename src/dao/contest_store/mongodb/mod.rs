mod config;
mod connection;
mod error;
mod models;
/// Store implementation over the `contests`, `entries` and `votes` collections.
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoContestStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::Duplicate { collection, key } => StorageError::duplicate(collection, key),
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
