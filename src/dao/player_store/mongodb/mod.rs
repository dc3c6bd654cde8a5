mod config;
mod connection;
mod error;
mod models;
/// Store implementation over the players, scores and counters collections.
pub mod store;

pub use config::MongoConfig;
pub use error::MongoDaoError;
pub use store::MongoPlayerStore;

use crate::dao::storage::StorageError;

impl From<MongoDaoError> for StorageError {
    fn from(err: MongoDaoError) -> Self {
        match err {
            MongoDaoError::DuplicateName { name } => StorageError::DuplicateName { name },
            MongoDaoError::UnknownPlayer { id } => StorageError::UnknownPlayer { id },
            other => StorageError::unavailable(other.to_string(), other),
        }
    }
}
