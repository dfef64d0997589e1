use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use crate::api::extract::{Filter, Payload};
use crate::logic::{self, FieldError, ServiceError, UserCreateRequest, UserUpdateRequest};
use crate::model::{Id, Resource, User, UserFilter};
use crate::store::{Store, StoreError};

/// Shared by every handler: the store client and the health probe budget.
pub struct AppState<S> {
    pub store: Arc<S>,
    pub ping_timeout: Duration,
}

impl<S> AppState<S> {
    pub fn new(store: Arc<S>, ping_timeout: Duration) -> Self {
        Self {
            store,
            ping_timeout,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            ping_timeout: self.ping_timeout,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: bool,
    pub timestamp: String,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub detail: ErrorDetail,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

impl ErrorResponse {
    pub fn new(message: &str) -> Self {
        Self {
            detail: ErrorDetail::Message(message.to_string()),
        }
    }

    pub fn fields(errors: Vec<FieldError>) -> Self {
        Self {
            detail: ErrorDetail::Fields(errors),
        }
    }
}

/// Map a failed resource operation to its HTTP response.
pub fn service_error(err: ServiceError) -> ApiError {
    match err {
        ServiceError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::fields(errors.0)),
        ),
        ServiceError::Store(err @ StoreError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, Json(ErrorResponse::new(&err.to_string())))
        }
        ServiceError::Store(StoreError::Conflict(Resource::UserAudio)) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse::new("Audio conflicts for user")),
        ),
        ServiceError::Store(err @ StoreError::Conflict(_)) => {
            (StatusCode::CONFLICT, Json(ErrorResponse::new(&err.to_string())))
        }
        ServiceError::Store(StoreError::Other(e)) => {
            log::error!("Unhandled store failure: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Internal server error")),
            )
        }
    }
}

/// Parse an identity path segment, rejecting it before any store access.
pub fn parse_id(raw: &str, param: &str) -> Result<Id, ApiError> {
    Id::parse_str(raw).map_err(|_| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(ErrorResponse::fields(vec![FieldError::new(
                vec!["path".into(), param.into()],
                "value is not a valid uuid",
            )])),
        )
    })
}

pub async fn health_check<S: Store>(
    State(state): State<AppState<S>>,
) -> (StatusCode, Json<HealthResponse>) {
    let online = logic::is_database_online(&*state.store, state.ping_timeout).await;
    let (status, label) = if online {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
    };

    (
        status,
        Json(HealthResponse {
            status: label.to_string(),
            database: online,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }),
    )
}

pub async fn create_user<S: Store>(
    State(state): State<AppState<S>>,
    Payload(request): Payload<UserCreateRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = logic::create_user(&*state.store, request)
        .await
        .map_err(service_error)?;

    Ok((StatusCode::CREATED, Json(user)))
}

pub async fn list_users<S: Store>(
    State(state): State<AppState<S>>,
    Filter(filter): Filter<UserFilter>,
) -> Result<Json<Vec<User>>, ApiError> {
    let users = logic::list_users(&*state.store, &filter)
        .await
        .map_err(service_error)?;

    Ok(Json(users))
}

pub async fn get_user<S: Store>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let user = logic::get_user(&*state.store, &user_id)
        .await
        .map_err(service_error)?;

    Ok(Json(user))
}

pub async fn update_user<S: Store>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
    Payload(request): Payload<UserUpdateRequest>,
) -> Result<Json<User>, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    let user = logic::update_user(&*state.store, &user_id, request)
        .await
        .map_err(service_error)?;

    Ok(Json(user))
}

pub async fn delete_user<S: Store>(
    State(state): State<AppState<S>>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_id(&user_id, "user_id")?;
    logic::delete_user(&*state.store, &user_id)
        .await
        .map_err(service_error)?;

    Ok(StatusCode::NO_CONTENT)
}
