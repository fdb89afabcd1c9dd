use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use strata_protocol::ProtocolError;
use strata_refs::RefError;
use strata_store::StoreError;
use strata_sync::SessionError;
use strata_types::ObjectId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    #[error("ref not found: {0}")]
    RefNotFound(String),

    /// Uploaded bytes that do not hash to their id or do not decode.
    #[error("rejected object: {0}")]
    InvalidObject(String),

    #[error("push session error: {0}")]
    Session(#[from] SessionError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("ref error: {0}")]
    Refs(#[from] RefError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) | Self::InvalidObject(_) | Self::Protocol(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::ObjectNotFound(_) | Self::RefNotFound(_) => StatusCode::NOT_FOUND,
            Self::Session(SessionError::ConcurrentUpdate { .. }) => StatusCode::CONFLICT,
            Self::Session(SessionError::NoSession { .. }) => StatusCode::PRECONDITION_FAILED,
            Self::Refs(RefError::InvalidName { .. } | RefError::InvalidSymbolicTarget { .. }) => {
                StatusCode::BAD_REQUEST
            }
            Self::Session(SessionError::Refs(_))
            | Self::Store(_)
            | Self::Refs(_)
            | Self::Config(_)
            | Self::Io(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        } else {
            tracing::debug!(error = %self, %status, "request rejected");
        }
        (status, self.to_string()).into_response()
    }
}
