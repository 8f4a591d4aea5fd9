/// Contest, entry and vote storage contract with its backends.
pub mod contest_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
