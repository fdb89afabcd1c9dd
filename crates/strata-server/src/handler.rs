//! Endpoint handlers. Each one is a thin adapter between the wire codecs in
//! `strata-protocol` and the hosted [`Repository`].

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use strata_protocol::{
    decode_object_upload, encode_exists, encode_manifest, encode_ref_response, BeginPushQuery,
    EndPushQuery, ExistsQuery, RefElement, RefParseQuery, SendObjectQuery, SendObjectReply,
    UpdateRefQuery,
};
use strata_store::StoreError;
use strata_sync::{PushSessions, Repository, TransportError};
use strata_types::ObjectId;
use tracing::{debug, info};

use crate::error::{ServerError, ServerResult};

const TEXT: &str = "text/plain; charset=utf-8";
const XML: &str = "text/xml; charset=utf-8";
const OCTETS: &str = "application/octet-stream";

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub sessions: Arc<PushSessions>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self {
            repo,
            sessions: Arc::new(PushSessions::new()),
        }
    }
}

/// `GET /repo/manifest`: one line per ref, then `HEAD`.
pub async fn manifest(State(state): State<AppState>) -> ServerResult<impl IntoResponse> {
    let refs = state.repo.refs();
    let mut listed = refs.list_refs("refs/")?;
    listed.extend(refs.head()?);
    Ok(([(header::CONTENT_TYPE, TEXT)], encode_manifest(&listed)))
}

/// `GET /repo/exists?oid=..&internalIp=..`
pub async fn exists(
    State(state): State<AppState>,
    Query(query): Query<ExistsQuery>,
) -> ServerResult<impl IntoResponse> {
    let found = state.repo.objects().exists(&query.oid)?;
    Ok(([(header::CONTENT_TYPE, TEXT)], encode_exists(found)))
}

/// `GET /repo/objects/<id>`: raw object bytes.
pub async fn object(
    State(state): State<AppState>,
    Path(id): Path<ObjectId>,
) -> ServerResult<impl IntoResponse> {
    let raw = state
        .repo
        .objects()
        .get_raw(&id)?
        .ok_or(ServerError::ObjectNotFound(id))?;
    Ok(([(header::CONTENT_TYPE, OCTETS)], raw))
}

/// `POST /repo/sendobject?internalIp=..` with `<raw id><raw bytes>`.
pub async fn send_object(
    State(state): State<AppState>,
    Query(query): Query<SendObjectQuery>,
    body: Bytes,
) -> ServerResult<impl IntoResponse> {
    let (id, raw) = decode_object_upload(&body)?;
    let created = state.repo.receive_object(&id, raw).map_err(rejected)?;
    debug!(object = %id.short_hex(), client = %query.internal_ip, created, "object uploaded");
    let reply = if created {
        SendObjectReply::Received
    } else {
        SendObjectReply::AlreadyExisted
    };
    Ok(([(header::CONTENT_TYPE, TEXT)], reply.as_str()))
}

fn rejected(err: TransportError) -> ServerError {
    match err {
        TransportError::Store(
            e @ (StoreError::HashMismatch { .. }
            | StoreError::CorruptObject { .. }
            | StoreError::Serialization(_)
            | StoreError::NullObjectId),
        ) => ServerError::InvalidObject(e.to_string()),
        TransportError::Store(e) => ServerError::Store(e),
        other => ServerError::Internal(other.to_string()),
    }
}

/// `GET /repo/beginpush?internalIp=..`
pub async fn begin_push(
    State(state): State<AppState>,
    Query(query): Query<BeginPushQuery>,
) -> impl IntoResponse {
    state.sessions.begin(&query.internal_ip);
    ([(header::CONTENT_TYPE, TEXT)], "Push began")
}

/// `GET /repo/endpush?refspec=..&objectId=..&internalIp=..&originalRefValue=..`
///
/// 409 if the ref moved since the push began, 412 without an open session.
pub async fn end_push(
    State(state): State<AppState>,
    Query(query): Query<EndPushQuery>,
) -> ServerResult<impl IntoResponse> {
    let updated = state.sessions.end(
        &query.internal_ip,
        state.repo.refs(),
        &query.refspec,
        query.object_id,
        query.original(),
    )?;
    info!(client = %query.internal_ip, updated = %updated, "push accepted");
    Ok(([(header::CONTENT_TYPE, TEXT)], "Push succeeded"))
}

/// `GET /refparse?name=..`: the resolved ref, or an element stream without
/// one if nothing matches.
pub async fn ref_parse(
    State(state): State<AppState>,
    Query(query): Query<RefParseQuery>,
) -> ServerResult<impl IntoResponse> {
    let found = state.repo.refs().resolve(&query.name)?;
    Ok((
        [(header::CONTENT_TYPE, XML)],
        encode_ref_response(RefElement::Ref, found.as_ref()),
    ))
}

/// `GET /updateref?name=..&newValue=..` or `GET /updateref?name=..&delete=true`
pub async fn update_ref(
    State(state): State<AppState>,
    Query(query): Query<UpdateRefQuery>,
) -> ServerResult<impl IntoResponse> {
    let refs = state.repo.refs();
    let changed = if query.is_delete() {
        refs.delete_ref(&query.name)?
            .ok_or_else(|| ServerError::RefNotFound(query.name.clone()))?
    } else {
        let value = query.new_value.ok_or_else(|| {
            ServerError::BadRequest("updateref needs newValue or delete=true".into())
        })?;
        refs.write_ref(&query.name, value)?;
        refs.read_ref(&query.name)?
            .ok_or_else(|| ServerError::Internal(format!("{} vanished after update", query.name)))?
    };
    info!(changed = %changed, deleted = query.is_delete(), "ref updated");
    Ok((
        [(header::CONTENT_TYPE, XML)],
        encode_ref_response(RefElement::ChangedRef, Some(&changed)),
    ))
}
