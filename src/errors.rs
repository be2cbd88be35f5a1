use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::StatusCode;
use axum::Json;
use thiserror::Error;

/// Failures raised by the store, the aggregator and the services around them.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid owner identity")]
    InvalidIdentity,

    #[error("record store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Conflict(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("text generator error: {0}")]
    Generator(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            message: message.into(),
        }
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        let status = match &err {
            Error::InvalidIdentity | Error::Validation(_) | Error::Conflict(_) => {
                StatusCode::BAD_REQUEST
            }
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::StoreUnavailable(_)
            | Error::Config(_)
            | Error::Generator(_)
            | Error::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!("request failed: {err}");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        Self {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

/// `Json` whose rejections render as the JSON error body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejections render as the JSON error body.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_errors_map_to_http_status() {
        assert_eq!(AppError::from(Error::InvalidIdentity).status, StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::from(Error::NotFound("Workout not found".into())).status,
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(Error::StoreUnavailable("disk".into())).status,
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(Error::Unauthorized("no token".into())).status,
            StatusCode::UNAUTHORIZED
        );
    }

    #[tokio::test]
    async fn malformed_json_body_is_rejected_with_a_json_error() {
        use axum::body::Body;
        use axum::http::{header::CONTENT_TYPE, Request};
        use axum::response::IntoResponse;

        let request = Request::builder()
            .method("POST")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from("{\"category\": "))
            .unwrap();
        let rejection = match ApiJson::<serde_json::Value>::from_request(request, &()).await {
            Err(rejection) => rejection,
            Ok(_) => panic!("truncated body was accepted"),
        };
        assert_eq!(rejection.status, StatusCode::BAD_REQUEST);

        let response = rejection.into_response();
        let content_type = response.headers()[CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("application/json"));
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().is_some_and(|msg| !msg.is_empty()));
    }

    #[tokio::test]
    async fn unparsable_query_is_a_bad_request() {
        #[derive(Debug, serde::Deserialize)]
        struct Paging {
            #[allow(dead_code)]
            page: usize,
        }

        let request = axum::http::Request::builder()
            .uri("/api/workouts?page=first")
            .body(())
            .unwrap();
        let (mut parts, ()) = request.into_parts();
        let rejection = match ApiQuery::<Paging>::from_request_parts(&mut parts, &()).await {
            Err(rejection) => rejection,
            Ok(_) => panic!("non-numeric page was accepted"),
        };
        assert_eq!(rejection.status, StatusCode::BAD_REQUEST);
        assert!(rejection.message.contains("page"));
    }

    #[test]
    fn io_failures_become_store_unavailable() {
        let err: Error = std::io::Error::other("disk gone").into();
        assert!(matches!(err, Error::StoreUnavailable(message) if message.contains("disk gone")));
    }
}
