/// Database model definitions.
pub mod models;
/// Photo file storage used during onboarding.
pub mod photo_store;
/// Player identities, score ledger and leaderboard queries.
pub mod player_store;
/// Storage abstraction layer for database operations.
pub mod storage;
