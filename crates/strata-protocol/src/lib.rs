//! Wire protocol for Strata remotes.
//!
//! The protocol is plain HTTP with small hand-parsed bodies:
//!
//! - ref listings: one `"<name> <hash>"` or `"<name> <target> <hash>"` line
//!   per ref ([`manifest`])
//! - existence checks: a `"1"` or `"0"` line ([`manifest::parse_exists`])
//! - ref resolution and updates: a minimal element stream with `name`,
//!   `objectId` and optional `target` fields ([`element`])
//! - objects: raw bytes keyed by id in the URL on download, id-prefixed in
//!   the request body on upload ([`upload`])

pub mod element;
pub mod endpoint;
pub mod error;
pub mod manifest;
pub mod upload;

pub use element::{encode_error_response, encode_ref_response, parse_ref_response, RefElement};
pub use endpoint::{
    endpoints, BeginPushQuery, EndPushQuery, ExistsQuery, RefParseQuery, SendObjectQuery,
    UpdateRefQuery,
};
pub use error::{ProtocolError, ProtocolResult};
pub use manifest::{
    encode_exists, encode_manifest, format_ref_line, parse_exists, parse_head, parse_manifest,
    parse_ref_line,
};
pub use upload::{decode_object_upload, encode_object_upload, SendObjectReply};
