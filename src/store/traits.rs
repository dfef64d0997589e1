use crate::model::{Id, User, UserAudio, UserAudioFilter, UserFilter};
use crate::store::StoreResult;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert the user, or update it if its id is already stored. Returns the
    /// row as reloaded after commit.
    async fn save_user(&self, user: User) -> StoreResult<User>;
    /// Users matching every field set on the filter, oldest first
    async fn find_users(&self, filter: &UserFilter) -> StoreResult<Vec<User>>;
    /// Fails with `NotFound` when no user has this id
    async fn get_user_by_id(&self, user_id: &Id) -> StoreResult<User>;
    /// Delete the user along with all of its audio records
    async fn delete_user(&self, user: &User) -> StoreResult<()>;
}

#[async_trait::async_trait]
pub trait UserAudioRepository: Send + Sync {
    /// Insert or update an audio record. Fails with `Conflict` when the write
    /// breaks a uniqueness constraint, in which case nothing is stored.
    async fn save_user_audio(&self, audio: UserAudio) -> StoreResult<UserAudio>;
    async fn find_user_audios(&self, filter: &UserAudioFilter) -> StoreResult<Vec<UserAudio>>;
    /// Both ids must match: an audio owned by another user is `NotFound`.
    async fn get_user_audio_by_id(&self, user_id: &Id, audio_id: &Id) -> StoreResult<UserAudio>;
}

#[async_trait::async_trait]
pub trait HealthStore: Send + Sync {
    /// Cheapest possible round trip to the backing store
    async fn ping(&self) -> anyhow::Result<()>;
}

pub trait Store: UserRepository + UserAudioRepository + HealthStore + Send + Sync {}
