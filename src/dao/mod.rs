/// Lease-capable storage backends holding the game record.
pub mod lease_store;
/// Persisted document model for the game record.
pub mod models;
/// Storage error taxonomy shared by every backend.
pub mod storage;
