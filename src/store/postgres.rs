use anyhow::{Context, Result};
use sqlx::{
    postgres::{PgPoolOptions, PgRow},
    PgPool, Postgres, QueryBuilder, Row,
};

use crate::model::{Id, Resource, Ticks, User, UserAudio, UserAudioFilter, UserFilter};
use crate::store::traits::{HealthStore, Store, UserAudioRepository, UserRepository};
use crate::store::{StoreError, StoreResult};

const USER_COLUMNS: &str = "id, name, email, address, image, created_at, updated_at";
const USER_AUDIO_COLUMNS: &str =
    "id, user_id, ticks, selected_tick, session_id, step_count, created_at, updated_at";

/// Idempotent schema bootstrap, applied in order.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS "user" (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        address TEXT NOT NULL,
        image TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS ix_user_name ON "user" (name)"#,
    r#"CREATE INDEX IF NOT EXISTS ix_user_email ON "user" (email)"#,
    r#"CREATE INDEX IF NOT EXISTS ix_user_address ON "user" (address)"#,
    r#"
    CREATE TABLE IF NOT EXISTS user_audio (
        id UUID PRIMARY KEY,
        ticks JSONB NOT NULL,
        selected_tick INTEGER NOT NULL,
        session_id INTEGER NOT NULL,
        step_count INTEGER NOT NULL,
        user_id UUID NOT NULL REFERENCES "user" (id) ON DELETE CASCADE,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT user_audio_session_id_key UNIQUE (session_id),
        CONSTRAINT user_audio_step_count_session_id_key UNIQUE (step_count, session_id)
    )
    "#,
    r#"CREATE INDEX IF NOT EXISTS ix_user_audio_user_id ON user_audio (user_id)"#,
];

const SCHEMA_LOCK_KEY: i64 = 0x636f_6e63_6861;

#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new PostgreSQL store with the given database URL
    pub async fn new(database_url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .context("Failed to create PostgreSQL connection pool")?;

        Ok(Self { pool })
    }

    /// Create the tables, indexes and constraints if they do not exist yet.
    ///
    /// Holds an advisory lock for the duration, so processes starting
    /// together against one database apply the schema one at a time.
    pub async fn ensure_schema(&self) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(SCHEMA_LOCK_KEY)
            .execute(&mut *tx)
            .await
            .context("Failed to acquire schema lock")?;

        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&mut *tx)
                .await
                .context("Failed to apply database schema")?;
        }

        tx.commit().await?;
        log::debug!("Database schema is in place");
        Ok(())
    }
}

fn user_from_row(row: &PgRow) -> Result<User> {
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        address: row.try_get("address")?,
        image: row.try_get("image")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn user_audio_from_row(row: &PgRow) -> Result<UserAudio> {
    let ticks: Ticks = serde_json::from_value(row.try_get("ticks")?)
        .context("Failed to deserialize stored ticks")?;

    Ok(UserAudio {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        ticks,
        selected_tick: row.try_get("selected_tick")?,
        session_id: row.try_get("session_id")?,
        step_count: row.try_get("step_count")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait::async_trait]
impl UserRepository for PostgresStore {
    async fn save_user(&self, mut user: User) -> StoreResult<User> {
        user.touch();

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO "user" (id, name, email, address, image, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (id) DO UPDATE SET
                name = EXCLUDED.name,
                email = EXCLUDED.email,
                address = EXCLUDED.address,
                image = EXCLUDED.image,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.address)
        .bind(&user.image)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::from_write(e, Resource::User, None))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::from_write(e, Resource::User, None))?;

        log::debug!("Saved user {}", user.id);
        self.get_user_by_id(&user.id).await
    }

    async fn find_users(&self, filter: &UserFilter) -> StoreResult<Vec<User>> {
        let mut query =
            QueryBuilder::<Postgres>::new(format!(r#"SELECT {} FROM "user" WHERE TRUE"#, USER_COLUMNS));

        if let Some(name) = &filter.name {
            query.push(" AND name = ").push_bind(name.clone());
        }
        if let Some(email) = &filter.email {
            query.push(" AND email = ").push_bind(email.clone());
        }
        if let Some(address) = &filter.address {
            query.push(" AND address = ").push_bind(address.clone());
        }
        query.push(" ORDER BY created_at, id");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list users")?;

        let users = rows.iter().map(user_from_row).collect::<Result<Vec<_>>>()?;
        Ok(users)
    }

    async fn get_user_by_id(&self, user_id: &Id) -> StoreResult<User> {
        let row = sqlx::query(&format!(r#"SELECT {} FROM "user" WHERE id = $1"#, USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to fetch user")?;

        let Some(row) = row else {
            return Err(StoreError::NotFound(Resource::User));
        };

        Ok(user_from_row(&row)?)
    }

    async fn delete_user(&self, user: &User) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        // user_audio rows go with it through ON DELETE CASCADE
        let result = sqlx::query(r#"DELETE FROM "user" WHERE id = $1"#)
            .bind(user.id)
            .execute(&mut *tx)
            .await
            .context("Failed to delete user")?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(Resource::User));
        }

        tx.commit().await.context("Failed to commit user deletion")?;
        log::debug!("Deleted user {}", user.id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl UserAudioRepository for PostgresStore {
    async fn save_user_audio(&self, mut audio: UserAudio) -> StoreResult<UserAudio> {
        audio.touch();

        let ticks = serde_json::to_value(audio.ticks).context("Failed to serialize ticks")?;

        let mut tx = self
            .pool
            .begin()
            .await
            .context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO user_audio (id, user_id, ticks, selected_tick, session_id, step_count,
                                    created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (id) DO UPDATE SET
                ticks = EXCLUDED.ticks,
                selected_tick = EXCLUDED.selected_tick,
                session_id = EXCLUDED.session_id,
                step_count = EXCLUDED.step_count,
                updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(audio.id)
        .bind(audio.user_id)
        .bind(ticks)
        .bind(audio.selected_tick)
        .bind(audio.session_id)
        .bind(audio.step_count)
        .bind(audio.created_at)
        .bind(audio.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| StoreError::from_write(e, Resource::UserAudio, Some(Resource::User)))?;

        tx.commit()
            .await
            .map_err(|e| StoreError::from_write(e, Resource::UserAudio, Some(Resource::User)))?;

        log::debug!("Saved audio {} for user {}", audio.id, audio.user_id);
        self.get_user_audio_by_id(&audio.user_id, &audio.id).await
    }

    async fn find_user_audios(&self, filter: &UserAudioFilter) -> StoreResult<Vec<UserAudio>> {
        let mut query = QueryBuilder::<Postgres>::new(format!(
            "SELECT {} FROM user_audio WHERE TRUE",
            USER_AUDIO_COLUMNS
        ));

        if let Some(user_id) = filter.user_id {
            query.push(" AND user_id = ").push_bind(user_id);
        }
        if let Some(session_id) = filter.session_id {
            query.push(" AND session_id = ").push_bind(session_id);
        }
        if let Some(step_count) = filter.step_count {
            query.push(" AND step_count = ").push_bind(step_count);
        }
        if let Some(selected_tick) = filter.selected_tick {
            query.push(" AND selected_tick = ").push_bind(selected_tick);
        }
        query.push(" ORDER BY created_at, id");

        let rows = query
            .build()
            .fetch_all(&self.pool)
            .await
            .context("Failed to list user audios")?;

        let audios = rows
            .iter()
            .map(user_audio_from_row)
            .collect::<Result<Vec<_>>>()?;
        Ok(audios)
    }

    async fn get_user_audio_by_id(&self, user_id: &Id, audio_id: &Id) -> StoreResult<UserAudio> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM user_audio WHERE id = $1 AND user_id = $2",
            USER_AUDIO_COLUMNS
        ))
        .bind(audio_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user audio")?;

        let Some(row) = row else {
            return Err(StoreError::NotFound(Resource::UserAudio));
        };

        Ok(user_audio_from_row(&row)?)
    }
}

#[async_trait::async_trait]
impl HealthStore for PostgresStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }
}

impl Store for PostgresStore {}
