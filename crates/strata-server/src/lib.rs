//! HTTP server for Strata.
//!
//! Hosts a single repository behind the remote protocol endpoints that
//! `strata-sync`'s HTTP transport speaks: ref manifest, object existence,
//! object download and upload, push sessions, ref lookup and ref update.

pub mod config;
pub mod error;
pub mod handler;
pub mod router;
pub mod server;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::AppState;
pub use server::StrataServer;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use strata_protocol::{
        encode_object_upload, parse_head, parse_manifest, parse_ref_response, SendObjectReply,
    };
    use strata_refs::{Ref, HEAD};
    use strata_store::{RevCommit, RevTree};
    use strata_types::ObjectId;
    use tower::util::ServiceExt;

    const MAIN: &str = "refs/heads/main";

    fn server() -> StrataServer {
        StrataServer::new(ServerConfig::default())
    }

    fn seed(server: &StrataServer) -> ObjectId {
        let repo = server.repository();
        let tree = repo.objects().insert(&RevTree::empty().into()).unwrap();
        let id = repo
            .insert_commit(RevCommit::new(tree, vec![], "ana", "root", 0))
            .unwrap();
        repo.refs().write_ref(MAIN, id).unwrap();
        repo.refs().write_symbolic(HEAD, MAIN).unwrap();
        id
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    async fn post(app: Router, uri: &str, body: Vec<u8>) -> (StatusCode, String) {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&body).into_owned())
    }

    // -------------------------------------------------------------------
    // Refs
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn manifest_lists_refs_and_head() {
        let s = server();
        let id = seed(&s);
        let (status, body) = get(s.router(), "/repo/manifest").await;
        assert_eq!(status, StatusCode::OK);

        let heads = parse_manifest(&body, true, false).unwrap();
        assert_eq!(heads, vec![Ref::direct(MAIN, id)]);
        let head = parse_head(&body).unwrap().unwrap();
        assert_eq!(head.target(), Some(MAIN));
    }

    #[tokio::test]
    async fn refparse_resolves_short_names() {
        let s = server();
        let id = seed(&s);
        let (status, body) = get(s.router(), "/refparse?name=main").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse_ref_response(&body).unwrap(), Some(Ref::direct(MAIN, id)));

        let (status, body) = get(s.router(), "/refparse?name=refs/heads/nope").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(parse_ref_response(&body).unwrap(), None);
    }

    #[tokio::test]
    async fn updateref_sets_and_deletes() {
        let s = server();
        let id = seed(&s);
        let uri = format!("/updateref?name=refs/heads/dev&newValue={id}");
        let (status, body) = get(s.router(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            parse_ref_response(&body).unwrap(),
            Some(Ref::direct("refs/heads/dev", id))
        );

        let (status, _) = get(s.router(), "/updateref?name=refs/heads/dev&delete=true").await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = get(s.router(), "/updateref?name=refs/heads/dev&delete=true").await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = get(s.router(), "/updateref?name=refs/heads/dev").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    // -------------------------------------------------------------------
    // Objects
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn exists_and_download() {
        let s = server();
        let id = seed(&s);
        let (_, body) = get(s.router(), &format!("/repo/exists?oid={id}&internalIp=t")).await;
        assert_eq!(body, "1\n");
        let missing = ObjectId::from_hash([9; 32]);
        let (_, body) = get(s.router(), &format!("/repo/exists?oid={missing}&internalIp=t")).await;
        assert_eq!(body, "0\n");

        let response = s
            .router()
            .oneshot(
                Request::builder()
                    .uri(format!("/repo/objects/{id}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let raw = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(raw.to_vec(), s.repository().objects().get_raw(&id).unwrap().unwrap());

        let (status, _) = get(s.router(), &format!("/repo/objects/{missing}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let (status, _) = get(s.router(), "/repo/objects/not-hex").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn sendobject_stores_and_indexes() {
        let source = server();
        let id = seed(&source);
        let raw = source.repository().objects().get_raw(&id).unwrap().unwrap();

        let s = server();
        let uri = "/repo/sendobject?internalIp=t";
        let (status, body) = post(s.router(), uri, encode_object_upload(&id, &raw).to_vec()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, SendObjectReply::Received.as_str());
        assert!(s.repository().graph().exists(&id).unwrap());

        let (_, body) = post(s.router(), uri, encode_object_upload(&id, &raw).to_vec()).await;
        assert_eq!(body, SendObjectReply::AlreadyExisted.as_str());
    }

    #[tokio::test]
    async fn sendobject_rejects_bad_uploads() {
        let source = server();
        let id = seed(&source);
        let raw = source.repository().objects().get_raw(&id).unwrap().unwrap();
        let uri = "/repo/sendobject?internalIp=t";

        let s = server();
        let wrong = ObjectId::from_hash([3; 32]);
        let (status, _) = post(s.router(), uri, encode_object_upload(&wrong, &raw).to_vec()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!s.repository().objects().exists(&wrong).unwrap());

        let (status, _) = post(s.router(), uri, vec![0; 10]).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let tiny = StrataServer::new(ServerConfig {
            max_object_size: 4,
            ..ServerConfig::default()
        });
        let (status, _) = post(tiny.router(), uri, encode_object_upload(&id, &raw).to_vec()).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    }

    // -------------------------------------------------------------------
    // Push sessions
    // -------------------------------------------------------------------

    #[tokio::test]
    async fn endpush_status_codes() {
        let s = server();
        let id = seed(&s);
        let other = ObjectId::from_hash([5; 32]);
        let end = |original: ObjectId| {
            format!(
                "/repo/endpush?refspec={MAIN}&objectId={other}&internalIp=t&originalRefValue={original}"
            )
        };

        let (status, _) = get(s.router(), &end(id)).await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);

        get(s.router(), "/repo/beginpush?internalIp=t").await;
        let (status, _) = get(s.router(), &end(ObjectId::from_hash([1; 32]))).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(s.repository().refs().read_ref(MAIN).unwrap().unwrap().object_id(), id);

        get(s.router(), "/repo/beginpush?internalIp=t").await;
        let (status, _) = get(s.router(), &end(id)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            s.repository().refs().read_ref(MAIN).unwrap().unwrap().object_id(),
            other
        );
    }

    #[tokio::test]
    async fn endpush_with_null_original_creates_ref() {
        let s = server();
        let id = ObjectId::from_hash([7; 32]);
        get(s.router(), "/repo/beginpush?internalIp=t").await;
        let uri = format!(
            "/repo/endpush?refspec=refs/heads/new&objectId={id}&internalIp=t&originalRefValue={}",
            ObjectId::NULL
        );
        let (status, _) = get(s.router(), &uri).await;
        assert_eq!(status, StatusCode::OK);
        assert!(s.repository().refs().read_ref("refs/heads/new").unwrap().is_some());
    }
}
