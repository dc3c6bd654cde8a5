//! Errors raised by the MongoDB player store before they are folded into `StorageError`.

use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

/// Result alias used throughout the MongoDB backend.
pub type MongoResult<T> = Result<T, MongoDaoError>;

/// Server error code reported when a unique index rejects a write.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Failures of the MongoDB backend, one variant per operation.
///
/// Every variant wrapping a driver error keeps it as `source`.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// A required connection variable is not set.
    #[error("missing MongoDB environment variable `{var}`")]
    MissingEnvVar {
        /// Name of the variable.
        var: &'static str,
    },
    /// The connection string could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// Rejected connection string.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The driver refused the parsed client options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The server never answered the startup ping.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// Pings tried before giving up.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A periodic ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// An index could not be created at startup.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Index name.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Incrementing an id sequence failed.
    #[error("failed to allocate next value of sequence `{sequence}`")]
    NextSequence {
        /// Sequence (counter document) name.
        sequence: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The counter upsert returned nothing.
    #[error("sequence `{sequence}` returned no document after upsert")]
    SequenceMissing {
        /// Sequence (counter document) name.
        sequence: &'static str,
    },
    /// Looking a player up by name failed.
    #[error("failed to resolve player `{name}`")]
    ResolvePlayer {
        /// Name looked up.
        name: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Looking a player up by id failed.
    #[error("failed to load player `{id}`")]
    LoadPlayer {
        /// Player id looked up.
        id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Inserting a player failed for a reason other than a duplicate name.
    #[error("failed to create player `{name}`")]
    CreatePlayer {
        /// Name being registered.
        name: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The unique name index rejected the insert.
    #[error("player name `{name}` is already registered")]
    DuplicateName {
        /// Name already taken.
        name: String,
    },
    /// A score referenced a player that does not exist.
    #[error("player `{id}` does not exist")]
    UnknownPlayer {
        /// Missing player id.
        id: i64,
    },
    /// Inserting a score event failed.
    #[error("failed to append score for player `{player_id}`")]
    AppendScore {
        /// Player the score belongs to.
        player_id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Counting the score ledger failed.
    #[error("failed to count score events")]
    CountScores {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The leaderboard aggregation failed.
    #[error("failed to aggregate leaderboard")]
    Leaderboard {
        /// Driver error.
        #[source]
        source: MongoError,
    },
}

/// Whether the server rejected a write because of a unique index.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE
    )
}
