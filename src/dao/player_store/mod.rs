/// Process-local backend.
pub mod memory;
/// MongoDB backend.
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{LeaderboardEntryEntity, PlayerEntity, ScoreEventEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the durable store holding player identities and their score ledger.
///
/// Backends must guarantee that `create` is atomic per name (exactly one concurrent caller
/// wins, the others see [`StorageError::DuplicateName`]) and that appended scores are never
/// lost, duplicated or observed half-written by `top_scores`.
///
/// Leaderboard ties on `best_score` are broken by ascending player id.
///
/// [`StorageError::DuplicateName`]: crate::dao::storage::StorageError::DuplicateName
pub trait PlayerStore: Send + Sync {
    /// Look a player up by exact name.
    fn resolve(&self, name: String) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Look a player up by id.
    fn get(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>>;
    /// Register a new player, failing with `DuplicateName` when the name is taken.
    fn create(
        &self,
        name: String,
        photo_ref: Option<String>,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>>;
    /// Append one score event; the player must exist.
    fn append_score(
        &self,
        player_id: i64,
        score: i64,
    ) -> BoxFuture<'static, StorageResult<ScoreEventEntity>>;
    /// Best score per player, highest first, at most `limit` rows.
    fn top_scores(&self, limit: usize)
    -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>>;
    /// Number of events in the score ledger.
    fn score_count(&self) -> BoxFuture<'static, StorageResult<u64>>;
    /// Cheap round trip to the backend.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
