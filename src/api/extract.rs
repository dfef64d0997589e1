use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest, FromRequestParts, Query, Request,
    },
    http::{request::Parts, StatusCode, Uri},
    response::Json,
};
use serde::de::DeserializeOwned;

use crate::api::handlers::{ApiError, ErrorResponse};
use crate::logic::{FieldError, LocSegment};

/// JSON request body extractor.
///
/// Behaves like `axum::Json`, but a body that cannot be read as the expected
/// payload is rejected with the same 422 error shape as a failed validation,
/// located at `["body"]`.
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => Err(body_rejection(rejection)),
        }
    }
}

fn body_rejection(rejection: JsonRejection) -> ApiError {
    log::debug!("Rejected request body: {}", rejection.body_text());
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse::fields(vec![FieldError::new(
            vec!["body".into()],
            rejection.body_text(),
        )])),
    )
}

/// Query string extractor for list filters.
///
/// A parameter that does not parse is rejected with the 422 error shape,
/// located at `["query", <param>]`.
pub struct Filter<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for Filter<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match Query::<T>::try_from_uri(&parts.uri) {
            Ok(Query(value)) => Ok(Filter(value)),
            Err(rejection) => Err(query_rejection::<T>(&parts.uri, rejection)),
        }
    }
}

/// First parameter that fails to parse on its own, if any
fn offending_param<T: DeserializeOwned>(uri: &Uri) -> Option<String> {
    uri.query()?
        .split('&')
        .filter(|pair| !pair.is_empty())
        .find_map(|pair| {
            let single: Uri = format!("/?{}", pair).parse().ok()?;
            Query::<T>::try_from_uri(&single).is_err().then(|| {
                pair.split_once('=')
                    .map_or(pair, |(key, _)| key)
                    .to_string()
            })
        })
}

fn query_rejection<T: DeserializeOwned>(uri: &Uri, rejection: QueryRejection) -> ApiError {
    log::debug!("Rejected query string: {}", rejection.body_text());

    let mut loc: Vec<LocSegment> = vec!["query".into()];
    if let Some(param) = offending_param::<T>(uri) {
        loc.push(param.as_str().into());
    }
    (
        StatusCode::UNPROCESSABLE_ENTITY,
        Json(ErrorResponse::fields(vec![FieldError::new(
            loc,
            rejection.body_text(),
        )])),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::UserCreateRequest;
    use crate::model::UserAudioFilter;
    use axum::body::Body;
    use axum::http::header::CONTENT_TYPE;

    fn json_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_well_formed_body() {
        let Payload(request) =
            Payload::<UserCreateRequest>::from_request(json_request(r#"{"name": "Lucas"}"#), &())
                .await
                .unwrap();
        assert_eq!(request.name, Some(Some("Lucas".to_string())));
        assert_eq!(request.email, None);
    }

    #[tokio::test]
    async fn test_malformed_body_is_unprocessable() {
        let rejection = Payload::<UserCreateRequest>::from_request(json_request("{\"name\":"), &())
            .await
            .err()
            .unwrap();

        let (status, Json(body)) = rejection;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = serde_json::to_value(body).unwrap();
        assert_eq!(body["detail"][0]["loc"], serde_json::json!(["body"]));
    }

    #[tokio::test]
    async fn test_wrong_field_type_is_unprocessable() {
        let rejection =
            Payload::<UserCreateRequest>::from_request(json_request(r#"{"name": 5}"#), &())
                .await
                .err()
                .unwrap();
        assert_eq!(rejection.0, StatusCode::UNPROCESSABLE_ENTITY);
    }

    async fn filter_from(uri: &str) -> Result<UserAudioFilter, ApiError> {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        Filter::<UserAudioFilter>::from_request_parts(&mut parts, &())
            .await
            .map(|Filter(filter)| filter)
    }

    #[tokio::test]
    async fn test_filter_from_query() {
        let filter = filter_from("/audios?session_id=3448&step_count=1").await.unwrap();
        assert_eq!(filter.session_id, Some(3448));
        assert_eq!(filter.step_count, Some(1));
        assert_eq!(filter.selected_tick, None);

        assert_eq!(filter_from("/audios").await.unwrap(), UserAudioFilter::default());
    }

    #[tokio::test]
    async fn test_unparsable_filter_names_the_param() {
        let (status, Json(body)) = filter_from("/audios?step_count=1&session_id=abc")
            .await
            .err()
            .unwrap();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let body = serde_json::to_value(body).unwrap();
        assert_eq!(body["detail"][0]["loc"], serde_json::json!(["query", "session_id"]));
    }
}
