use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::model::{Id, Resource, User, UserAudio, UserAudioFilter, UserFilter};
use crate::store::traits::{HealthStore, Store, UserAudioRepository, UserRepository};
use crate::store::{StoreError, StoreResult};

/// Rows kept in insertion order, mirroring the relational tables.
#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    audios: Vec<UserAudio>,
}

/// Store held entirely in process memory.
///
/// Enforces the same rules as the PostgreSQL schema: unique `session_id`,
/// unique `(step_count, session_id)`, owner must exist, cascade on user
/// delete. Every write checks all constraints before touching a row, so a
/// rejected save leaves the tables unchanged.
#[derive(Debug)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
    online: AtomicBool,
    ping_delay: Mutex<Option<Duration>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
            online: AtomicBool::new(true),
            ping_delay: Mutex::new(None),
        }
    }

    /// Simulate losing (or regaining) the connection to the store
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Make every ping take at least `delay`
    pub fn set_ping_delay(&self, delay: Option<Duration>) {
        *self.ping_delay.lock() = delay;
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl UserRepository for InMemoryStore {
    async fn save_user(&self, mut user: User) -> StoreResult<User> {
        user.touch();

        let mut tables = self.tables.write();
        match tables.users.iter_mut().find(|stored| stored.id == user.id) {
            Some(stored) => {
                user.created_at = stored.created_at;
                *stored = user.clone();
            }
            None => tables.users.push(user.clone()),
        }

        Ok(user)
    }

    async fn find_users(&self, filter: &UserFilter) -> StoreResult<Vec<User>> {
        let tables = self.tables.read();
        Ok(tables
            .users
            .iter()
            .filter(|user| filter.matches(user))
            .cloned()
            .collect())
    }

    async fn get_user_by_id(&self, user_id: &Id) -> StoreResult<User> {
        let tables = self.tables.read();
        tables
            .users
            .iter()
            .find(|user| &user.id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound(Resource::User))
    }

    async fn delete_user(&self, user: &User) -> StoreResult<()> {
        let mut tables = self.tables.write();
        let Some(position) = tables.users.iter().position(|stored| stored.id == user.id) else {
            return Err(StoreError::NotFound(Resource::User));
        };

        tables.users.remove(position);
        tables.audios.retain(|audio| audio.user_id != user.id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserAudioRepository for InMemoryStore {
    async fn save_user_audio(&self, mut audio: UserAudio) -> StoreResult<UserAudio> {
        audio.touch();

        let mut tables = self.tables.write();

        if !tables.users.iter().any(|user| user.id == audio.user_id) {
            return Err(StoreError::NotFound(Resource::User));
        }

        let conflicts = tables
            .audios
            .iter()
            .filter(|other| other.id != audio.id)
            .any(|other| {
                other.session_id == audio.session_id
                    || (other.step_count, other.session_id) == (audio.step_count, audio.session_id)
            });
        if conflicts {
            log::warn!("Audio {} conflicts on session {}", audio.id, audio.session_id);
            return Err(StoreError::Conflict(Resource::UserAudio));
        }

        match tables.audios.iter_mut().find(|stored| stored.id == audio.id) {
            Some(stored) => {
                audio.user_id = stored.user_id;
                audio.created_at = stored.created_at;
                *stored = audio.clone();
            }
            None => tables.audios.push(audio.clone()),
        }

        Ok(audio)
    }

    async fn find_user_audios(&self, filter: &UserAudioFilter) -> StoreResult<Vec<UserAudio>> {
        let tables = self.tables.read();
        Ok(tables
            .audios
            .iter()
            .filter(|audio| filter.matches(audio))
            .cloned()
            .collect())
    }

    async fn get_user_audio_by_id(&self, user_id: &Id, audio_id: &Id) -> StoreResult<UserAudio> {
        let tables = self.tables.read();
        tables
            .audios
            .iter()
            .find(|audio| &audio.id == audio_id && &audio.user_id == user_id)
            .cloned()
            .ok_or(StoreError::NotFound(Resource::UserAudio))
    }
}

#[async_trait::async_trait]
impl HealthStore for InMemoryStore {
    async fn ping(&self) -> anyhow::Result<()> {
        let delay = *self.ping_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if !self.online.load(Ordering::SeqCst) {
            anyhow::bail!("Connection refused");
        }
        Ok(())
    }
}

impl Store for InMemoryStore {}
