//! [`RemoteTransport`] over the HTTP wire protocol.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use strata_protocol::{
    encode_object_upload, endpoints, parse_exists, parse_head, parse_manifest,
    parse_ref_response, BeginPushQuery, EndPushQuery, ExistsQuery, RefParseQuery,
    SendObjectQuery, SendObjectReply, UpdateRefQuery,
};
use strata_refs::Ref;
use strata_store::{ObjectStore, StoreError};
use strata_types::ObjectId;
use tracing::{debug, trace};

use crate::config::TransportConfig;
use crate::error::{SessionError, TransportError, TransportResult};
use crate::transport::{RefChange, RemoteTransport, SendOutcome};

fn network(e: reqwest::Error) -> TransportError {
    TransportError::Network(e.to_string())
}

pub struct HttpTransport {
    client: Client,
    base_url: String,
    internal_ip: String,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("internal_ip", &self.internal_ip)
            .finish()
    }
}

impl HttpTransport {
    /// A transport for the repository at `base_url`
    /// (e.g. `http://geo.example.org/roads`).
    pub fn new(base_url: impl Into<String>, config: &TransportConfig) -> TransportResult<Self> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build().map_err(network)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            internal_ip: config.internal_ip.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let url = self.url(path);
        trace!(%url, "GET");
        self.client.get(url)
    }

    async fn get_with<Q: Serialize + ?Sized>(
        &self,
        path: &str,
        query: &Q,
    ) -> TransportResult<Response> {
        self.get(path).query(query).send().await.map_err(network)
    }

    async fn text(response: Response) -> TransportResult<String> {
        let response = Self::ensure_success(response)?;
        response.text().await.map_err(network)
    }

    fn ensure_success(response: Response) -> TransportResult<Response> {
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            Err(TransportError::Status {
                status: status.as_u16(),
                url: response.url().to_string(),
            })
        }
    }

    async fn manifest(&self) -> TransportResult<String> {
        let response = self.get(endpoints::MANIFEST).send().await.map_err(network)?;
        Self::text(response).await
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn list_refs(&self, heads: bool, tags: bool) -> TransportResult<Vec<Ref>> {
        let body = self.manifest().await?;
        Ok(parse_manifest(&body, heads, tags)?)
    }

    async fn head_ref(&self) -> TransportResult<Option<Ref>> {
        let body = self.manifest().await?;
        Ok(parse_head(&body)?)
    }

    async fn object_exists(&self, id: &ObjectId) -> TransportResult<bool> {
        let query = ExistsQuery {
            oid: *id,
            internal_ip: self.internal_ip.clone(),
        };
        let response = self.get_with(endpoints::EXISTS, &query).await?;
        let body = Self::text(response).await?;
        Ok(parse_exists(&body)?)
    }

    async fn get_object(&self, id: &ObjectId, into: &dyn ObjectStore) -> TransportResult<bool> {
        let path = format!("{}/{}", endpoints::OBJECTS, id.to_hex());
        let response = self.get(&path).send().await.map_err(network)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(TransportError::ObjectNotFound(*id));
        }
        let bytes = Self::ensure_success(response)?
            .bytes()
            .await
            .map_err(network)?;
        let created = into.put(id, &bytes)?;
        debug!(object = %id.short_hex(), size = bytes.len(), "object fetched");
        Ok(created)
    }

    async fn send_object(
        &self,
        id: &ObjectId,
        from: &dyn ObjectStore,
    ) -> TransportResult<SendOutcome> {
        let raw = from.get_raw(id)?.ok_or(StoreError::NotFound(*id))?;
        let query = SendObjectQuery {
            internal_ip: self.internal_ip.clone(),
        };
        let response = self
            .client
            .post(self.url(endpoints::SEND_OBJECT))
            .query(&query)
            .body(encode_object_upload(id, &raw))
            .send()
            .await
            .map_err(network)?;
        let body = Self::text(response).await?;
        debug!(object = %id.short_hex(), size = raw.len(), "object sent");
        Ok(match SendObjectReply::parse(&body) {
            SendObjectReply::Received => SendOutcome::Sent,
            SendObjectReply::AlreadyExisted => SendOutcome::AlreadyExisted,
        })
    }

    async fn resolve_ref(&self, refspec: &str) -> TransportResult<Option<Ref>> {
        let query = RefParseQuery {
            name: refspec.to_string(),
        };
        let response = self.get_with(endpoints::REF_PARSE, &query).await?;
        let body = Self::text(response).await?;
        Ok(parse_ref_response(&body)?)
    }

    async fn update_ref(&self, refspec: &str, change: RefChange) -> TransportResult<Option<Ref>> {
        let query = match change {
            RefChange::Set(id) => UpdateRefQuery::set(refspec, id),
            RefChange::Delete => UpdateRefQuery::delete(refspec),
        };
        let response = self.get_with(endpoints::UPDATE_REF, &query).await?;
        if change == RefChange::Delete && response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let body = Self::text(response).await?;
        Ok(parse_ref_response(&body)?)
    }

    async fn begin_push(&self) -> TransportResult<()> {
        let query = BeginPushQuery {
            internal_ip: self.internal_ip.clone(),
        };
        let response = self.get_with(endpoints::BEGIN_PUSH, &query).await?;
        Self::ensure_success(response)?;
        Ok(())
    }

    async fn end_push(
        &self,
        refspec: &str,
        new: ObjectId,
        previous: Option<ObjectId>,
    ) -> TransportResult<()> {
        let query = EndPushQuery {
            refspec: refspec.to_string(),
            object_id: new,
            internal_ip: self.internal_ip.clone(),
            original_ref_value: previous.unwrap_or(ObjectId::NULL),
        };
        let response = self.get_with(endpoints::END_PUSH, &query).await?;
        match response.status() {
            StatusCode::CONFLICT => Err(SessionError::ConcurrentUpdate {
                refspec: refspec.to_string(),
            }
            .into()),
            StatusCode::PRECONDITION_FAILED => Err(SessionError::NoSession {
                client: self.internal_ip.clone(),
            }
            .into()),
            _ => {
                Self::ensure_success(response)?;
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_protocol::{encode_exists, encode_manifest, encode_ref_response, RefElement};
    use strata_refs::HEAD;
    use strata_store::{InMemoryObjectStore, RevFeature, RevObject};
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config() -> TransportConfig {
        TransportConfig {
            internal_ip: "10.1.1.1".into(),
            ..TransportConfig::default()
        }
    }

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    async fn transport(server: &MockServer) -> HttpTransport {
        HttpTransport::new(format!("{}/", server.uri()), &config()).unwrap()
    }

    #[tokio::test]
    async fn manifest_gives_refs_and_head() {
        let server = MockServer::start().await;
        let main = Ref::direct("refs/heads/main", oid(1));
        let body = encode_manifest(&[
            Ref::symbolic(HEAD, &main),
            main.clone(),
            Ref::direct("refs/tags/v1", oid(2)),
        ]);
        Mock::given(method("GET"))
            .and(path("/repo/manifest"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(&server)
            .await;

        let t = transport(&server).await;
        assert_eq!(t.list_refs(true, false).await.unwrap(), vec![main]);
        assert_eq!(t.list_refs(true, true).await.unwrap().len(), 2);
        assert!(t.head_ref().await.unwrap().unwrap().is_symbolic());
    }

    #[tokio::test]
    async fn exists_sends_identity() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repo/exists"))
            .and(query_param("oid", oid(3).to_hex()))
            .and(query_param("internalIp", "10.1.1.1"))
            .respond_with(ResponseTemplate::new(200).set_body_string(encode_exists(true)))
            .mount(&server)
            .await;

        let t = transport(&server).await;
        assert!(t.object_exists(&oid(3)).await.unwrap());
    }

    #[tokio::test]
    async fn get_object_verifies_and_stores() {
        let server = MockServer::start().await;
        let source = InMemoryObjectStore::new();
        let id = source
            .insert(&RevObject::Feature(RevFeature::new(vec![serde_json::json!(1)])))
            .unwrap();
        let raw = source.get_raw(&id).unwrap().unwrap();
        Mock::given(method("GET"))
            .and(path(format!("/repo/objects/{}", id.to_hex())))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(raw))
            .mount(&server)
            .await;

        let t = transport(&server).await;
        let local = InMemoryObjectStore::new();
        assert!(t.get_object(&id, &local).await.unwrap());
        assert!(local.exists(&id).unwrap());

        let missing = oid(8);
        assert!(matches!(
            t.get_object(&missing, &local).await,
            Err(TransportError::ObjectNotFound(m)) if m == missing
        ));
    }

    #[tokio::test]
    async fn corrupt_object_is_rejected() {
        let server = MockServer::start().await;
        let id = oid(4);
        Mock::given(method("GET"))
            .and(path(format!("/repo/objects/{}", id.to_hex())))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![3u8, b'[', b']']))
            .mount(&server)
            .await;

        let t = transport(&server).await;
        let local = InMemoryObjectStore::new();
        assert!(matches!(
            t.get_object(&id, &local).await,
            Err(TransportError::Store(StoreError::HashMismatch { .. }))
        ));
        assert!(local.is_empty());
    }

    #[tokio::test]
    async fn send_object_reads_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/repo/sendobject"))
            .and(query_param("internalIp", "10.1.1.1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(SendObjectReply::AlreadyExisted.as_str()),
            )
            .mount(&server)
            .await;

        let local = InMemoryObjectStore::new();
        let id = local
            .insert(&RevObject::Feature(RevFeature::new(vec![])))
            .unwrap();
        let t = transport(&server).await;
        assert_eq!(
            t.send_object(&id, &local).await.unwrap(),
            SendOutcome::AlreadyExisted
        );
        assert!(matches!(
            t.send_object(&oid(9), &local).await,
            Err(TransportError::Store(StoreError::NotFound(_)))
        ));
    }

    #[tokio::test]
    async fn resolve_ref_parses_element_stream() {
        let server = MockServer::start().await;
        let main = Ref::direct("refs/heads/main", oid(5));
        Mock::given(method("GET"))
            .and(path("/refparse"))
            .and(query_param("name", "main"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(encode_ref_response(RefElement::Ref, Some(&main))),
            )
            .mount(&server)
            .await;

        let t = transport(&server).await;
        assert_eq!(t.resolve_ref("main").await.unwrap(), Some(main));
    }

    #[tokio::test]
    async fn delete_of_missing_ref_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/updateref"))
            .and(query_param("delete", "true"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let t = transport(&server).await;
        assert_eq!(
            t.update_ref("refs/heads/gone", RefChange::Delete).await.unwrap(),
            None
        );
    }

    #[tokio::test]
    async fn end_push_status_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repo/endpush"))
            .and(query_param("refspec", "refs/heads/main"))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/repo/endpush"))
            .and(query_param("refspec", "refs/heads/dev"))
            .and(query_param("originalRefValue", ObjectId::NULL.to_hex()))
            .respond_with(ResponseTemplate::new(412))
            .mount(&server)
            .await;

        let t = transport(&server).await;
        assert!(matches!(
            t.end_push("refs/heads/main", oid(1), Some(oid(2))).await,
            Err(TransportError::Session(SessionError::ConcurrentUpdate { .. }))
        ));
        assert!(matches!(
            t.end_push("refs/heads/dev", oid(1), None).await,
            Err(TransportError::Session(SessionError::NoSession { .. }))
        ));
    }

    #[tokio::test]
    async fn server_errors_surface_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repo/beginpush"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let t = transport(&server).await;
        assert!(matches!(
            t.begin_push().await,
            Err(TransportError::Status { status: 500, .. })
        ));
    }

    #[tokio::test]
    async fn unreachable_remote_is_a_network_error() {
        let t = HttpTransport::new("http://127.0.0.1:1", &config()).unwrap();
        assert!(matches!(
            t.object_exists(&oid(1)).await,
            Err(TransportError::Network(_))
        ));
    }
}
