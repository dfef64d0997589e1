use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

use crate::api::extract::{Filter, Payload};
use crate::api::handlers::{parse_id, service_error, ApiError, AppState};
use crate::logic::{self, UserAudioCreateRequest, UserAudioUpdateRequest};
use crate::model::{UserAudio, UserAudioFilter};
use crate::store::Store;

pub async fn create_user_audio<S: Store>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
    Payload(request): Payload<UserAudioCreateRequest>,
) -> Result<(StatusCode, Json<UserAudio>), ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let audio = logic::create_user_audio(&*state.store, &user_id, request)
        .await
        .map_err(service_error)?;

    Ok((StatusCode::CREATED, Json(audio)))
}

/// List a user's audios. Query parameters narrow the result further but
/// never widen it past the owner in the path.
pub async fn list_user_audios<S: Store>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
    Filter(filter): Filter<UserAudioFilter>,
) -> Result<Json<Vec<UserAudio>>, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let audios = logic::list_user_audios(&*state.store, &user_id, filter)
        .await
        .map_err(service_error)?;

    Ok(Json(audios))
}

pub async fn get_user_audio<S: Store>(
    State(state): State<AppState<S>>,
    Path((user_id, audio_id)): Path<(String, String)>,
) -> Result<Json<UserAudio>, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let audio_id = parse_id(&audio_id, "audio_id")?;
    let audio = logic::get_user_audio(&*state.store, &user_id, &audio_id)
        .await
        .map_err(service_error)?;

    Ok(Json(audio))
}

pub async fn update_user_audio<S: Store>(
    State(state): State<AppState<S>>,
    Path((user_id, audio_id)): Path<(String, String)>,
    Payload(request): Payload<UserAudioUpdateRequest>,
) -> Result<Json<UserAudio>, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let audio_id = parse_id(&audio_id, "audio_id")?;
    let audio = logic::update_user_audio(&*state.store, &user_id, &audio_id, request)
        .await
        .map_err(service_error)?;

    Ok(Json(audio))
}
