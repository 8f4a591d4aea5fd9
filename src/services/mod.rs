/// Contest administration and lifecycle commands.
pub mod contest_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Joining and voting.
pub mod participation_service;
/// Background supervision of the storage connection.
pub mod storage_supervisor;
