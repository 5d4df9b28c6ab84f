//! Integration test: member failure.
//!
//! Members are killed by closing their listeners; connects to them are
//! refused. Reads must succeed while at least `k` members serve and fail
//! with a clear error otherwise.

use ntest::timeout;
use tessera_collector::{CollectError, CollectorConfig};
use tessera_integration_tests::{TcpCluster, fast_collector, sample_document};
use tessera_node::NodeError;
use tessera_types::{DocumentId, Namespace};

fn ns() -> Namespace {
    Namespace::new("app.orders")
}

/// 5 members, k=3: one member permanently unreachable, quorum from the rest.
#[tokio::test]
#[timeout(30000)]
async fn test_one_member_unreachable() {
    let mut c = TcpCluster::start(3, 5).await;
    let id = DocumentId::new("order-1");
    let doc = sample_document(1);
    c.insert(0, &ns(), &id, &doc).await;

    c.kill(4).await;

    let collected = c
        .node(0)
        .read_with_report(&ns(), &id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(collected.document, doc);
    assert!(!collected.report.used_members.contains(&4));
    assert_eq!(collected.report.used_members.len(), 2);
    c.shutdown().await;
}

/// Exactly k members left (including the reader): still readable.
#[tokio::test]
#[timeout(30000)]
async fn test_m_minus_k_members_down() {
    let mut c = TcpCluster::start(3, 5).await;
    let id = DocumentId::new("order-2");
    let doc = sample_document(2);
    c.insert(1, &ns(), &id, &doc).await;

    c.kill(0).await;
    c.kill(3).await;

    let collected = c
        .node(4)
        .read_with_report(&ns(), &id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(collected.document, doc);
    assert_eq!(collected.report.used_members, vec![1, 2]);
    c.shutdown().await;
}

/// One member too many down: the read fails fast instead of hanging.
#[tokio::test]
#[timeout(30000)]
async fn test_too_many_down_reports_quorum_unreachable() {
    let mut c = TcpCluster::start(3, 5).await;
    let id = DocumentId::new("order-3");
    c.insert(0, &ns(), &id, &sample_document(3)).await;

    c.kill(1).await;
    c.kill(2).await;
    c.kill(3).await;

    let err = c.node(0).read(&ns(), &id).await.unwrap_err();
    assert!(
        matches!(
            err,
            NodeError::Collect(CollectError::QuorumUnreachable {
                needed: 2,
                collected: 1,
                unavailable: 3,
                ..
            })
        ),
        "got {err:?}"
    );
    assert_eq!(c.metrics().snapshot().quorum_failures, 1);
    c.shutdown().await;
}

/// A killed member that comes back makes the document readable again.
#[tokio::test]
#[timeout(30000)]
async fn test_revived_member_restores_quorum() {
    let mut c = TcpCluster::start(2, 3).await;
    let id = DocumentId::new("order-4");
    let doc = sample_document(4);
    c.insert(0, &ns(), &id, &doc).await;

    c.kill(1).await;
    c.kill(2).await;
    assert!(c.node(0).read(&ns(), &id).await.is_err());

    c.revive(2).await;
    let got = c.node(0).read(&ns(), &id).await.unwrap().unwrap();
    assert_eq!(got, doc);
    c.shutdown().await;
}

/// A member without the document is a miss, not a failure.
#[tokio::test]
#[timeout(30000)]
async fn test_member_missing_document_is_a_miss() {
    let c = TcpCluster::start(2, 4).await;
    let id = DocumentId::new("order-5");
    let doc = sample_document(5);
    // Only members 0 and 3 ever receive the document.
    let encoded = c.node(0).insert(&ns(), &id, &doc).await.unwrap();
    let target = tessera_types::SplitTarget::new(ns(), id.clone());
    c.node(3).apply_replicated(&target, &encoded).await.unwrap();

    let collected = c
        .node(0)
        .read_with_report(&ns(), &id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(collected.document, doc);
    assert_eq!(collected.report.used_members, vec![3]);

    // The other holder reads back through member 0.
    let got = c.node(3).read(&ns(), &id).await.unwrap().unwrap();
    assert_eq!(got, doc);
    c.shutdown().await;
}

/// Every other member holds nothing: quorum starves on misses.
#[tokio::test]
#[timeout(30000)]
async fn test_all_misses() {
    let c = TcpCluster::start(3, 4).await;
    let id = DocumentId::new("lonely");
    c.node(2).insert(&ns(), &id, &sample_document(6)).await.unwrap();

    let err = c.node(2).read(&ns(), &id).await.unwrap_err();
    assert!(matches!(
        err,
        NodeError::Collect(CollectError::QuorumUnreachable { misses: 3, .. })
    ));
    assert_eq!(c.metrics().snapshot().misses, 3);
    c.shutdown().await;
}

/// Members that accept connections but never answer hit the deadline.
#[tokio::test]
#[timeout(30000)]
async fn test_unresponsive_members_time_out() {
    let config = CollectorConfig {
        query_timeout_ms: 10_000,
        request_timeout_ms: 300,
        ..fast_collector()
    };
    let mut c = TcpCluster::start_with(2, 3, config).await;
    let id = DocumentId::new("stuck");
    c.insert(0, &ns(), &id, &sample_document(7)).await;

    // Replace members 1 and 2 with listeners that never answer.
    let mut silent = Vec::new();
    for i in [1, 2] {
        let addr = c.addr(i);
        c.kill(i).await;
        let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
        silent.push(tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((stream, _)) = listener.accept().await {
                held.push(stream);
            }
        }));
    }

    let err = c.node(0).read(&ns(), &id).await.unwrap_err();
    assert!(matches!(
        err,
        NodeError::Collect(CollectError::Timeout {
            needed: 1,
            collected: 0,
            ..
        })
    ));
    assert_eq!(c.metrics().snapshot().timeouts, 1);

    for task in silent {
        task.abort();
    }
    c.shutdown().await;
}
