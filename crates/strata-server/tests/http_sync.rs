//! Sync engine against a live server over HTTP.

use std::sync::Arc;

use serde_json::json;
use strata_refs::{Ref, HEAD};
use strata_server::{ServerConfig, StrataServer};
use strata_store::{Node, RevCommit, RevFeature, RevTree};
use strata_sync::{
    HttpTransport, PushRejection, RemoteTransport, Repository, SyncEngine, SyncError,
    TransportConfig,
};
use strata_types::ObjectId;
use tokio::net::TcpListener;

const MAIN: &str = "refs/heads/main";

/// Start a server on an ephemeral port; returns its repository and URL.
async fn spawn() -> (Arc<Repository>, String) {
    let server = StrataServer::new(ServerConfig::default());
    let repo = server.repository().clone();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(server.serve_with_listener(listener));
    (repo, url)
}

fn engine(url: &str, client: &str) -> SyncEngine {
    let config = TransportConfig {
        internal_ip: client.to_string(),
        ..TransportConfig::default()
    };
    SyncEngine::new(Arc::new(HttpTransport::new(url, &config).unwrap()))
}

fn commit(repo: &Repository, parents: Vec<ObjectId>, value: i64) -> ObjectId {
    let objects = repo.objects();
    let feature = objects
        .insert(&RevFeature::new(vec![json!(value)]).into())
        .unwrap();
    let tree = objects
        .insert(&RevTree::leaf(vec![Node::feature("f", feature)]).into())
        .unwrap();
    repo.insert_commit(RevCommit::new(tree, parents, "ana", format!("v{value}"), value))
        .unwrap()
}

fn remote_main(remote: &Repository) -> Option<ObjectId> {
    remote.refs().read_ref(MAIN).unwrap().map(|r| r.object_id())
}

#[tokio::test]
async fn push_then_clone_over_http() {
    let (remote, url) = spawn().await;
    let alice = Repository::in_memory();
    let a = commit(&alice, vec![], 1);
    let b = commit(&alice, vec![a], 2);

    let report = engine(&url, "alice")
        .push(&alice, &Ref::direct(MAIN, b), MAIN)
        .await
        .unwrap();
    assert_eq!(report.commits_applied, 2);
    assert_eq!(report.objects_sent, 6);
    assert_eq!(remote_main(&remote), Some(b));
    assert_eq!(remote.graph().parents(&b).unwrap(), vec![a]);

    let bob = Repository::in_memory();
    let bob_engine = engine(&url, "bob");
    let tip = bob_engine.transport().resolve_ref("main").await.unwrap().unwrap();
    let fetched = bob_engine.fetch(&bob, &tip, None).await.unwrap();
    assert_eq!(fetched.objects_received, 6);
    assert!(bob.objects().exists(&a).unwrap());
    assert_eq!(bob.graph().depth(&b).unwrap(), 2);
}

#[tokio::test]
async fn diverged_push_is_rejected_over_http() {
    let (remote, url) = spawn().await;
    let alice = Repository::in_memory();
    let alice_engine = engine(&url, "alice");
    let a = commit(&alice, vec![], 1);
    alice_engine
        .push(&alice, &Ref::direct(MAIN, a), MAIN)
        .await
        .unwrap();

    // Bob clones, commits on top of A and pushes first.
    let bob = Repository::in_memory();
    let bob_engine = engine(&url, "bob");
    bob_engine
        .fetch(&bob, &Ref::direct(MAIN, a), None)
        .await
        .unwrap();
    let c = commit(&bob, vec![a], 3);
    bob_engine
        .push(&bob, &Ref::direct(MAIN, c), MAIN)
        .await
        .unwrap();

    let b = commit(&alice, vec![a], 2);
    let err = alice_engine
        .push(&alice, &Ref::direct(MAIN, b), MAIN)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SyncError::PushRejected(PushRejection::RemoteHasChanges)
    ));
    assert_eq!(remote_main(&remote), Some(c));
    assert!(!remote.objects().exists(&b).unwrap());
}

#[tokio::test]
async fn shallow_clone_over_http() {
    let (remote, url) = spawn().await;
    let mut ids = vec![commit(&remote, vec![], 0)];
    for i in 1..4 {
        let parent = ids[i - 1];
        ids.push(commit(&remote, vec![parent], i as i64));
    }
    remote.refs().write_ref(MAIN, ids[3]).unwrap();

    let local = Repository::in_memory().with_shallow_depth(1);
    let e = engine(&url, "carol");
    let heads = e.transport().list_refs(true, false).await.unwrap();
    assert_eq!(heads, vec![Ref::direct(MAIN, ids[3])]);

    let report = e.fetch(&local, &heads[0], Some(1)).await.unwrap();
    assert_eq!(report.commits_applied, 1);
    assert!(local.objects().exists(&ids[3]).unwrap());
    assert!(!local.objects().exists(&ids[2]).unwrap());

    let report = e.fetch_full_depth(&local, &heads[0]).await.unwrap();
    assert_eq!(report.objects_received, 9);
    assert!(!local.is_shallow());
}

#[tokio::test]
async fn head_and_ref_deletion_over_http() {
    let (remote, url) = spawn().await;
    let a = commit(&remote, vec![], 1);
    remote.refs().write_ref(MAIN, a).unwrap();
    remote.refs().write_symbolic(HEAD, MAIN).unwrap();

    let e = engine(&url, "dave");
    let head = e.transport().head_ref().await.unwrap().unwrap();
    assert_eq!(head.target(), Some(MAIN));
    assert_eq!(head.object_id(), a);

    let deleted = e.delete_remote_ref(MAIN).await.unwrap();
    assert_eq!(deleted.map(|r| r.object_id()), Some(a));
    assert_eq!(remote_main(&remote), None);
    assert_eq!(e.delete_remote_ref(MAIN).await.unwrap(), None);
}
