use crate::logic::validate::{self, UserAudioCreateRequest, UserAudioUpdateRequest};
use crate::logic::ServiceResult;
use crate::model::{Id, UserAudio, UserAudioFilter};
use crate::store::{UserAudioRepository, UserRepository};

/// Record a new calibration session for an existing user.
pub async fn create_user_audio<S>(
    store: &S,
    user_id: &Id,
    request: UserAudioCreateRequest,
) -> ServiceResult<UserAudio>
where
    S: UserRepository + UserAudioRepository + ?Sized,
{
    let new_audio = validate::new_user_audio(request)?;
    let user = store.get_user_by_id(user_id).await?;

    let audio = store
        .save_user_audio(UserAudio::new(user.id, new_audio))
        .await?;

    log::info!(
        "Created audio {} for user {} (session {})",
        audio.id,
        user.id,
        audio.session_id
    );
    Ok(audio)
}

/// Audios of one user. The owner is always part of the filter, whatever the
/// caller put in `filter.user_id`.
pub async fn list_user_audios<S>(
    store: &S,
    user_id: &Id,
    mut filter: UserAudioFilter,
) -> ServiceResult<Vec<UserAudio>>
where
    S: UserRepository + UserAudioRepository + ?Sized,
{
    let user = store.get_user_by_id(user_id).await?;
    filter.user_id = Some(user.id);

    Ok(store.find_user_audios(&filter).await?)
}

pub async fn get_user_audio<S>(store: &S, user_id: &Id, audio_id: &Id) -> ServiceResult<UserAudio>
where
    S: UserAudioRepository + ?Sized,
{
    Ok(store.get_user_audio_by_id(user_id, audio_id).await?)
}

/// Sparse update, last write wins. A change that collides with another
/// audio's `session_id` fails with a conflict and leaves the stored row as
/// it was.
pub async fn update_user_audio<S>(
    store: &S,
    user_id: &Id,
    audio_id: &Id,
    request: UserAudioUpdateRequest,
) -> ServiceResult<UserAudio>
where
    S: UserAudioRepository + ?Sized,
{
    let changes = validate::user_audio_changes(request)?;

    let mut audio = store.get_user_audio_by_id(user_id, audio_id).await?;
    changes.apply_to(&mut audio);

    let audio = store.save_user_audio(audio).await?;
    log::debug!("Updated audio {} for user {}", audio.id, audio.user_id);
    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::users::{create_user, delete_user};
    use crate::logic::ServiceError;
    use crate::model::{generate_id, Resource, User};
    use crate::store::{InMemoryStore, StoreError};
    use serde_json::{json, Value};

    fn audio_payload(session_id: i64) -> Value {
        json!({
            "ticks": [
                -96.33, -96.33, -93.47, -89.03999999999999, -84.61, -80.18, -75.75, -71.32,
                -66.89, -62.46, -58.03, -53.6, -49.17, -44.74, -40.31
            ],
            "selected_tick": 5,
            "session_id": session_id,
            "step_count": 1
        })
    }

    async fn create_lucas(store: &InMemoryStore) -> User {
        let request = serde_json::from_value(json!({
            "name": "Lucas Bernardes",
            "email": "lucascbernardes@live.com",
            "address": "Brazil",
            "image": "https://example.com/img.png"
        }))
        .unwrap();
        create_user(store, request).await.unwrap()
    }

    async fn create_audio(
        store: &InMemoryStore,
        user_id: &Id,
        payload: Value,
    ) -> ServiceResult<UserAudio> {
        create_user_audio(store, user_id, serde_json::from_value(payload).unwrap()).await
    }

    fn is_conflict(err: &ServiceError) -> bool {
        matches!(
            err,
            ServiceError::Store(StoreError::Conflict(Resource::UserAudio))
        )
    }

    #[tokio::test]
    async fn test_duplicate_session_scenario() {
        let store = InMemoryStore::new();
        let user = create_lucas(&store).await;

        let audio = create_audio(&store, &user.id, audio_payload(3448)).await.unwrap();
        assert_eq!(audio.user_id, user.id);
        assert_eq!(audio.session_id, 3448);
        assert_eq!(audio.selected_tick, 5);
        assert!(!audio.id.is_nil());

        let err = create_audio(&store, &user.id, audio_payload(3448))
            .await
            .unwrap_err();
        assert!(is_conflict(&err));

        let audios = list_user_audios(&store, &user.id, UserAudioFilter::default())
            .await
            .unwrap();
        assert_eq!(audios, vec![audio]);
    }

    #[tokio::test]
    async fn test_create_audio_for_unknown_user() {
        let store = InMemoryStore::new();
        let err = create_audio(&store, &generate_id(), audio_payload(1))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::NotFound(Resource::User))
        ));
    }

    #[tokio::test]
    async fn test_invalid_audio_is_not_stored() {
        let store = InMemoryStore::new();
        let user = create_lucas(&store).await;

        let mut payload = audio_payload(1);
        payload["step_count"] = json!(10);
        let err = create_audio(&store, &user.id, payload).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let audios = list_user_audios(&store, &user.id, UserAudioFilter::default())
            .await
            .unwrap();
        assert!(audios.is_empty());
    }

    #[tokio::test]
    async fn test_list_is_scoped_to_owner_and_filters() {
        let store = InMemoryStore::new();
        let lucas = create_lucas(&store).await;
        let other = create_lucas(&store).await;

        let first = create_audio(&store, &lucas.id, audio_payload(1)).await.unwrap();
        let second = create_audio(&store, &lucas.id, audio_payload(2)).await.unwrap();
        create_audio(&store, &other.id, audio_payload(3)).await.unwrap();

        let all = list_user_audios(&store, &lucas.id, UserAudioFilter::default())
            .await
            .unwrap();
        assert_eq!(all, vec![first, second.clone()]);

        let sneaky = UserAudioFilter::for_user(other.id);
        let scoped = list_user_audios(&store, &lucas.id, sneaky).await.unwrap();
        assert_eq!(scoped.len(), 2);

        let by_session = UserAudioFilter {
            session_id: Some(2),
            ..Default::default()
        };
        assert_eq!(
            list_user_audios(&store, &lucas.id, by_session).await.unwrap(),
            vec![second]
        );

        let missing = UserAudioFilter {
            session_id: Some(123),
            ..Default::default()
        };
        assert!(list_user_audios(&store, &lucas.id, missing)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_update_audio_is_isolated() {
        let store = InMemoryStore::new();
        let user = create_lucas(&store).await;
        let before = create_audio(&store, &user.id, audio_payload(3448)).await.unwrap();

        let request = serde_json::from_value(json!({"selected_tick": 14})).unwrap();
        let after = update_user_audio(&store, &user.id, &before.id, request)
            .await
            .unwrap();

        assert_eq!(after.selected_tick, 14);
        assert_eq!(after.ticks, before.ticks);
        assert_eq!(after.session_id, before.session_id);
        assert_eq!(after.step_count, before.step_count);
        assert_eq!(after.user_id, before.user_id);
        assert_eq!(after.id, before.id);
        assert_eq!(after.created_at, before.created_at);
        assert!(after.updated_at > before.updated_at);

        let stored = get_user_audio(&store, &user.id, &before.id).await.unwrap();
        assert_eq!(stored, after);
    }

    #[tokio::test]
    async fn test_update_into_taken_session_conflicts() {
        let store = InMemoryStore::new();
        let user = create_lucas(&store).await;
        let first = create_audio(&store, &user.id, audio_payload(3448)).await.unwrap();
        let second = create_audio(&store, &user.id, audio_payload(0)).await.unwrap();

        let request = serde_json::from_value(json!({"session_id": first.session_id})).unwrap();
        let err = update_user_audio(&store, &user.id, &second.id, request)
            .await
            .unwrap_err();
        assert!(is_conflict(&err));

        let stored = get_user_audio(&store, &user.id, &second.id).await.unwrap();
        assert_eq!(stored, second);
    }

    #[tokio::test]
    async fn test_update_through_wrong_owner_is_not_found() {
        let store = InMemoryStore::new();
        let owner = create_lucas(&store).await;
        let stranger = create_lucas(&store).await;
        let audio = create_audio(&store, &owner.id, audio_payload(1)).await.unwrap();

        let request = serde_json::from_value(json!({"session_id": 0})).unwrap();
        let err = update_user_audio(&store, &stranger.id, &audio.id, request)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::NotFound(Resource::UserAudio))
        ));
    }

    #[tokio::test]
    async fn test_deleting_user_removes_audios() {
        let store = InMemoryStore::new();
        let user = create_lucas(&store).await;
        let audio = create_audio(&store, &user.id, audio_payload(1)).await.unwrap();

        delete_user(&store, &user.id).await.unwrap();

        let err = get_user_audio(&store, &user.id, &audio.id).await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::Store(StoreError::NotFound(Resource::UserAudio))
        ));
        // the session id is free again
        let other = create_lucas(&store).await;
        assert!(create_audio(&store, &other.id, audio_payload(1)).await.is_ok());
    }
}
