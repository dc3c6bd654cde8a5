//! Process-local [`PlayerStore`] used for development runs and tests.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
    time::SystemTime,
};

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    models::{LeaderboardEntryEntity, PlayerEntity, ScoreEventEntity},
    player_store::PlayerStore,
    storage::{StorageError, StorageResult},
};

/// In-memory tables behind a single lock; every write is serialized.
#[derive(Clone, Default)]
pub struct MemoryPlayerStore {
    inner: Arc<RwLock<MemoryTables>>,
}

#[derive(Default)]
struct MemoryTables {
    players: BTreeMap<i64, PlayerEntity>,
    names: HashMap<String, i64>,
    scores: Vec<ScoreEventEntity>,
    last_player_id: i64,
    last_score_id: i64,
}

impl MemoryTables {
    fn create(&mut self, name: String, photo_ref: Option<String>) -> StorageResult<PlayerEntity> {
        if self.names.contains_key(&name) {
            return Err(StorageError::DuplicateName { name });
        }

        self.last_player_id += 1;
        let player = PlayerEntity {
            id: self.last_player_id,
            name: name.clone(),
            photo_ref,
        };
        self.names.insert(name, player.id);
        self.players.insert(player.id, player.clone());
        Ok(player)
    }

    fn append_score(&mut self, player_id: i64, score: i64) -> StorageResult<ScoreEventEntity> {
        if !self.players.contains_key(&player_id) {
            return Err(StorageError::UnknownPlayer { id: player_id });
        }

        self.last_score_id += 1;
        let event = ScoreEventEntity {
            id: self.last_score_id,
            player_id,
            score,
            recorded_at: SystemTime::now(),
        };
        self.scores.push(event.clone());
        Ok(event)
    }

    fn top_scores(&self, limit: usize) -> Vec<LeaderboardEntryEntity> {
        // BTreeMap keeps player ids ascending, which the stable sort below preserves on ties.
        let mut best: BTreeMap<i64, i64> = BTreeMap::new();
        for event in &self.scores {
            best.entry(event.player_id)
                .and_modify(|current| *current = (*current).max(event.score))
                .or_insert(event.score);
        }

        let mut ranked: Vec<(i64, i64)> = best.into_iter().collect();
        ranked.sort_by(|(_, a), (_, b)| b.cmp(a));

        ranked
            .into_iter()
            .filter_map(|(player_id, best_score)| {
                self.players
                    .get(&player_id)
                    .cloned()
                    .map(|player| LeaderboardEntryEntity::from_player(player, best_score))
            })
            .take(limit)
            .collect()
    }
}

impl MemoryPlayerStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl PlayerStore for MemoryPlayerStore {
    fn resolve(&self, name: String) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move {
            let tables = inner.read().await;
            Ok(tables
                .names
                .get(&name)
                .and_then(|id| tables.players.get(id))
                .cloned())
        })
    }

    fn get(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.players.get(&id).cloned()) })
    }

    fn create(
        &self,
        name: String,
        photo_ref: Option<String>,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.write().await.create(name, photo_ref) })
    }

    fn append_score(
        &self,
        player_id: i64,
        score: i64,
    ) -> BoxFuture<'static, StorageResult<ScoreEventEntity>> {
        let inner = self.inner.clone();
        Box::pin(async move { inner.write().await.append_score(player_id, score) })
    }

    fn top_scores(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.top_scores(limit)) })
    }

    fn score_count(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let inner = self.inner.clone();
        Box::pin(async move { Ok(inner.read().await.scores.len() as u64) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}
