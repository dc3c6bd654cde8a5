use std::{sync::Arc, time::SystemTime};

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::doc,
    options::{IndexOptions, ReturnDocument},
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{
        MongoCounterDocument, MongoLeaderboardRow, MongoPlayerDocument, MongoScoreDocument,
    },
};
use crate::dao::{
    models::{LeaderboardEntryEntity, PlayerEntity, ScoreEventEntity},
    player_store::PlayerStore,
    storage::StorageResult,
};

const PLAYER_COLLECTION_NAME: &str = "players";
const SCORE_COLLECTION_NAME: &str = "scores";
const COUNTER_COLLECTION_NAME: &str = "counters";
const PLAYER_SEQUENCE: &str = "player_id";
const SCORE_SEQUENCE: &str = "score_id";

/// [`PlayerStore`] persisted in MongoDB, with a unique index on player names.
#[derive(Clone)]
pub struct MongoPlayerStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoPlayerStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        // The unique index on `name` is what makes concurrent registrations race-safe.
        let name_index = IndexModel::builder()
            .keys(doc! {"name": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("player_name_unique_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();

        self.player_collection()
            .await
            .create_index(name_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: PLAYER_COLLECTION_NAME,
                index: "name",
                source,
            })?;

        let player_index = IndexModel::builder()
            .keys(doc! {"player_id": 1, "score": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("score_player_idx".to_owned()))
                    .build(),
            )
            .build();

        self.score_collection()
            .await
            .create_index(player_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "player_id,score",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn player_collection(&self) -> Collection<MongoPlayerDocument> {
        self.database()
            .await
            .collection::<MongoPlayerDocument>(PLAYER_COLLECTION_NAME)
    }

    async fn score_collection(&self) -> Collection<MongoScoreDocument> {
        self.database()
            .await
            .collection::<MongoScoreDocument>(SCORE_COLLECTION_NAME)
    }

    /// Atomically increment and return the named sequence.
    async fn next_id(&self, sequence: &'static str) -> MongoResult<i64> {
        let counters = self
            .database()
            .await
            .collection::<MongoCounterDocument>(COUNTER_COLLECTION_NAME);

        let counter = counters
            .find_one_and_update(doc! {"_id": sequence}, doc! {"$inc": {"seq": 1_i64}})
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::NextSequence { sequence, source })?
            .ok_or(MongoDaoError::SequenceMissing { sequence })?;

        Ok(counter.seq)
    }

    async fn resolve(&self, name: String) -> MongoResult<Option<PlayerEntity>> {
        let document = self
            .player_collection()
            .await
            .find_one(doc! {"name": &name})
            .await
            .map_err(|source| MongoDaoError::ResolvePlayer { name, source })?;

        Ok(document.map(Into::into))
    }

    async fn get(&self, id: i64) -> MongoResult<Option<PlayerEntity>> {
        let document = self
            .player_collection()
            .await
            .find_one(doc! {"_id": id})
            .await
            .map_err(|source| MongoDaoError::LoadPlayer { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn create(&self, name: String, photo_ref: Option<String>) -> MongoResult<PlayerEntity> {
        let player = PlayerEntity {
            id: self.next_id(PLAYER_SEQUENCE).await?,
            name,
            photo_ref,
        };
        let document: MongoPlayerDocument = player.clone().into();

        match self.player_collection().await.insert_one(&document).await {
            Ok(_) => Ok(player),
            Err(source) if is_duplicate_key(&source) => {
                Err(MongoDaoError::DuplicateName { name: player.name })
            }
            Err(source) => Err(MongoDaoError::CreatePlayer {
                name: player.name,
                source,
            }),
        }
    }

    async fn append_score(&self, player_id: i64, score: i64) -> MongoResult<ScoreEventEntity> {
        // Players are never deleted, so checking existence before the insert is sufficient.
        if self.get(player_id).await?.is_none() {
            return Err(MongoDaoError::UnknownPlayer { id: player_id });
        }

        let event = ScoreEventEntity {
            id: self.next_id(SCORE_SEQUENCE).await?,
            player_id,
            score,
            recorded_at: SystemTime::now(),
        };
        let document: MongoScoreDocument = event.clone().into();

        self.score_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::AppendScore { player_id, source })?;

        Ok(event)
    }

    async fn top_scores(&self, limit: usize) -> MongoResult<Vec<LeaderboardEntryEntity>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let pipeline = vec![
            doc! {"$group": {"_id": "$player_id", "best_score": {"$max": "$score"}}},
            doc! {"$sort": {"best_score": -1, "_id": 1}},
            doc! {"$lookup": {
                "from": PLAYER_COLLECTION_NAME,
                "localField": "_id",
                "foreignField": "_id",
                "as": "player",
            }},
            doc! {"$unwind": "$player"},
            doc! {"$limit": limit},
        ];

        let rows: Vec<MongoLeaderboardRow> = self
            .score_collection()
            .await
            .aggregate(pipeline)
            .with_type::<MongoLeaderboardRow>()
            .await
            .map_err(|source| MongoDaoError::Leaderboard { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::Leaderboard { source })?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn score_count(&self) -> MongoResult<u64> {
        self.score_collection()
            .await
            .count_documents(doc! {})
            .await
            .map_err(|source| MongoDaoError::CountScores { source })
    }
}

impl PlayerStore for MongoPlayerStore {
    fn resolve(&self, name: String) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.resolve(name).await.map_err(Into::into) })
    }

    fn get(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<PlayerEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.get(id).await.map_err(Into::into) })
    }

    fn create(
        &self,
        name: String,
        photo_ref: Option<String>,
    ) -> BoxFuture<'static, StorageResult<PlayerEntity>> {
        let store = self.clone();
        Box::pin(async move { store.create(name, photo_ref).await.map_err(Into::into) })
    }

    fn append_score(
        &self,
        player_id: i64,
        score: i64,
    ) -> BoxFuture<'static, StorageResult<ScoreEventEntity>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .append_score(player_id, score)
                .await
                .map_err(Into::into)
        })
    }

    fn top_scores(
        &self,
        limit: usize,
    ) -> BoxFuture<'static, StorageResult<Vec<LeaderboardEntryEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.top_scores(limit).await.map_err(Into::into) })
    }

    fn score_count(&self) -> BoxFuture<'static, StorageResult<u64>> {
        let store = self.clone();
        Box::pin(async move { store.score_count().await.map_err(Into::into) })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
