use strata_types::TypeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed ref line: {0:?}")]
    MalformedRefLine(String),

    #[error("malformed element stream: {0}")]
    MalformedElement(String),

    #[error("empty existence response")]
    EmptyExistsResponse,

    #[error("upload body too short: {0} bytes")]
    TruncatedUpload(usize),

    #[error("remote reported failure: {0}")]
    Remote(String),

    #[error("invalid object id: {0}")]
    InvalidObjectId(#[from] TypeError),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
