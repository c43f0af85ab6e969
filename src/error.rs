use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use utoipa::ToSchema;

use crate::catalog::CatalogError;
use crate::search::SearchError;
use crate::session::{SessionError, SessionLimitReached};
use crate::thread_state::ThreadActionError;
use crate::timer::Cancelled;
use crate::validation::{FieldErrors, FormError};

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldErrors>,
}

/// Retry banner shown when a backing service fails.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBanner {
    pub error: String,
    pub title: String,
    pub message: String,
    pub retry: bool,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")] BadRequest(String),
    #[error("not found")] NotFound,
    #[error("{0}")] Conflict(String),
    #[error("validation failed")] Validation(FieldErrors),
    #[error("too many requests")] TooManyRequests,
    #[error("{0}")] Unavailable(String),
    #[error("internal error")] Internal,
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::NotFound => ApiError::NotFound,
            CatalogError::Unavailable(msg) => {
                log::error!("catalog unavailable: {msg}");
                ApiError::Unavailable(msg)
            }
        }
    }
}

impl From<SearchError> for ApiError {
    fn from(e: SearchError) -> Self {
        match e {
            SearchError::QueryTooShort => ApiError::BadRequest(e.to_string()),
            SearchError::Superseded => ApiError::Conflict("superseded".into()),
        }
    }
}

impl From<ThreadActionError> for ApiError {
    fn from(e: ThreadActionError) -> Self {
        match e {
            ThreadActionError::EmptyReply => ApiError::BadRequest(e.to_string()),
            ThreadActionError::ReplyPending
            | ThreadActionError::NoPendingReply
            | ThreadActionError::Closed => ApiError::Conflict(e.to_string()),
        }
    }
}

impl From<FormError> for ApiError {
    fn from(e: FormError) -> Self {
        match e {
            FormError::AlreadySubmitted => ApiError::Conflict(e.to_string()),
            FormError::Invalid(fields) => ApiError::Validation(fields),
        }
    }
}

impl From<Cancelled> for ApiError {
    fn from(_: Cancelled) -> Self {
        ApiError::Conflict("cancelled".into())
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Thread(e) => e.into(),
            SessionError::Form(e) => e.into(),
            SessionError::Search(e) => e.into(),
            SessionError::Cancelled => ApiError::Conflict("cancelled".into()),
        }
    }
}

impl From<SessionLimitReached> for ApiError {
    fn from(e: SessionLimitReached) -> Self {
        log::warn!("{e}");
        ApiError::Unavailable(e.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut res = HttpResponse::build(self.status_code());
        match self {
            ApiError::Unavailable(message) => res.json(ErrorBanner {
                error: "unavailable".into(),
                title: "Something went wrong".into(),
                message: message.clone(),
                retry: true,
            }),
            ApiError::Validation(fields) => res.json(ApiErrorBody {
                error: self.to_string(),
                fields: Some(fields.clone()),
            }),
            _ => res.json(ApiErrorBody { error: self.to_string(), fields: None }),
        }
    }
}
