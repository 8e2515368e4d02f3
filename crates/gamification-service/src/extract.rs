//! 请求提取器
//!
//! 包装 axum 的 Json / Query / Path，解析失败时返回统一的错误响应（VALIDATION_ERROR）

use axum::{
    Json,
    extract::{
        FromRequest, FromRequestParts, Path, Query, Request,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::request::Parts,
};
use serde::de::DeserializeOwned;

use crate::error::GamificationError;

/// JSON 请求体
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

/// 查询参数
#[derive(Debug, Clone)]
pub struct ApiQuery<T>(pub T);

/// 路径参数
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for GamificationError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for GamificationError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for GamificationError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = GamificationError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = GamificationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = GamificationError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Router,
        body::Body,
        http::{self, StatusCode},
        response::IntoResponse,
        routing::{get, post},
    };
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize)]
    struct Payload {
        #[allow(dead_code)]
        name: String,
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn app() -> Router {
        Router::new()
            .route(
                "/items",
                post(|ApiJson(_): ApiJson<Payload>| async { StatusCode::OK }),
            )
            .route(
                "/items/{id}",
                get(|ApiPath(id): ApiPath<i64>| async move { id.to_string().into_response() }),
            )
    }

    #[tokio::test]
    async fn test_missing_field_uses_error_envelope() {
        let response = app()
            .oneshot(
                http::Request::builder()
                    .method("POST")
                    .uri("/items")
                    .header("Content-Type", "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert!(body["message"].as_str().unwrap().contains("name"));
    }

    #[tokio::test]
    async fn test_invalid_path_uses_error_envelope() {
        let response = app()
            .oneshot(
                http::Request::builder()
                    .uri("/items/abc")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
}
