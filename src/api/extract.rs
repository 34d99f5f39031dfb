//! Extractors that turn axum's built-in rejections into the API error shape.
//!
//! The stock `Path`/`Query`/`Json` extractors reply with plain-text bodies
//! when parsing fails; every error leaving this API must be the JSON
//! `{"error": ...}` envelope, so handlers use these wrappers instead.

use axum::async_trait;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use serde::de::DeserializeOwned;

use crate::error::AppError;

pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Path::<T>::from_request_parts(parts, state)
            .await
            .map(|Path(value)| ApiPath(value))
            .map_err(|rejection: PathRejection| AppError::Validation(rejection.body_text()))
    }
}

pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Query::<T>::from_request_parts(parts, state)
            .await
            .map(|Query(value)| ApiQuery(value))
            .map_err(|rejection: QueryRejection| AppError::Validation(rejection.body_text()))
    }
}

pub struct ApiJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        axum::Json::<T>::from_request(req, state)
            .await
            .map(|axum::Json(value)| ApiJson(value))
            .map_err(|rejection: JsonRejection| AppError::Validation(rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::handlers::{ConfirmRequest, ListAlertsQuery};
    use axum::body::Body;
    use axum::http;
    use uuid::Uuid;

    #[tokio::test]
    async fn malformed_json_body_becomes_validation_error() {
        let req = Request::builder()
            .method("PATCH")
            .uri("/api/alerts/some-id")
            .header(http::header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();

        let result = ApiJson::<ConfirmRequest>::from_request(req, &()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn wrong_content_type_becomes_validation_error() {
        let req = Request::builder()
            .method("PATCH")
            .uri("/api/alerts/some-id")
            .header(http::header::CONTENT_TYPE, "text/plain")
            .body(Body::from("confirmed=true"))
            .unwrap();

        let result = ApiJson::<ConfirmRequest>::from_request(req, &()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn unparseable_query_becomes_validation_error() {
        let req = http::Request::builder()
            .uri("/api/alerts?limit=plenty")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let result = ApiQuery::<ListAlertsQuery>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn path_rejection_becomes_validation_error() {
        // Parts built outside a router carry no captured params, which makes
        // Path extraction fail the same way a bad capture does.
        let req = http::Request::builder()
            .uri("/api/alerts/not-a-uuid")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();

        let result = ApiPath::<Uuid>::from_request_parts(&mut parts, &()).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
