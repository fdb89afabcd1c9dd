//! Object upload framing for `sendobject`.
//!
//! The request body is the 32 raw id bytes followed by the object's raw
//! bytes, exactly as they are stored.

use bytes::{BufMut, Bytes, BytesMut};
use strata_types::ObjectId;

use crate::error::{ProtocolError, ProtocolResult};

pub fn encode_object_upload(id: &ObjectId, raw: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(ObjectId::LEN + raw.len());
    buf.put_slice(id.as_bytes());
    buf.put_slice(raw);
    buf.freeze()
}

/// Split an upload body into the claimed id and the object bytes.
pub fn decode_object_upload(body: &[u8]) -> ProtocolResult<(ObjectId, &[u8])> {
    if body.len() <= ObjectId::LEN {
        return Err(ProtocolError::TruncatedUpload(body.len()));
    }
    let (id, raw) = body.split_at(ObjectId::LEN);
    Ok((ObjectId::from_raw(id)?, raw))
}

/// The server's answer to an upload. Uploading an object the remote already
/// has is not an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SendObjectReply {
    Received,
    AlreadyExisted,
}

impl SendObjectReply {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "Object received",
            Self::AlreadyExisted => "Object already existed",
        }
    }

    pub fn parse(body: &str) -> Self {
        if body.contains(Self::AlreadyExisted.as_str()) {
            Self::AlreadyExisted
        } else {
            Self::Received
        }
    }
}
