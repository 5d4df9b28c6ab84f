//! Integration test: write then read over localhost TCP.

use ntest::timeout;
use tessera_integration_tests::{TcpCluster, sample_document, test_data};
use tessera_types::{Document, DocumentId, Namespace, Value};

fn ns() -> Namespace {
    Namespace::new("app.users")
}

/// k=3, m=5: `{id: 7, note: "systems"}` read back from every member.
#[tokio::test]
#[timeout(30000)]
async fn test_small_document_every_member() {
    let c = TcpCluster::start(3, 5).await;
    let id = DocumentId::from(7i64);
    let doc = Document::new().with("_id", 7).with("note", "systems");

    c.insert(0, &ns(), &id, &doc).await;
    for i in 0..c.len() {
        let got = c.node(i).read(&ns(), &id).await.unwrap().unwrap();
        assert_eq!(got, doc, "member {i}");
    }
    c.shutdown().await;
}

/// Many documents, written through different primaries, various (k, m).
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[timeout(60000)]
async fn test_many_documents_various_configs() {
    for (k, m) in [(1, 2), (2, 3), (2, 4), (3, 5), (4, 6)] {
        let c = TcpCluster::start(k, m).await;
        let mut written = Vec::new();
        for i in 0..20 {
            let id = DocumentId::new(format!("doc-{i:04}"));
            let doc = sample_document(i);
            c.insert(i % m, &ns(), &id, &doc).await;
            written.push((id, doc));
        }

        for (n, (id, expected)) in written.iter().enumerate() {
            let reader = (n * 7 + 3) % m;
            let got = c.node(reader).read(&ns(), id).await.unwrap().unwrap();
            assert_eq!(&got, expected, "k={k} m={m} doc {id} via member {reader}");
        }
        c.shutdown().await;
    }
}

/// A 1 MiB binary payload survives the round trip exactly.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[timeout(60000)]
async fn test_large_payload() {
    let c = TcpCluster::start(4, 6).await;
    let id = DocumentId::new("big");
    let doc = Document::new()
        .with("_id", "big")
        .with("blob", Value::Binary(test_data(1024 * 1024 + 3)));

    c.insert(2, &ns(), &id, &doc).await;
    let got = c.node(5).read(&ns(), &id).await.unwrap().unwrap();
    assert_eq!(got, doc);
    c.shutdown().await;
}

/// Every field indexed: nothing to split, decode still works.
#[tokio::test]
#[timeout(30000)]
async fn test_all_fields_indexed() {
    let c = TcpCluster::start(2, 3).await;
    let id = DocumentId::new("only-index");
    let doc = Document::new()
        .with("_id", "only-index")
        .with("email", "a@b.c")
        .with("tenant", 3);

    c.insert(0, &ns(), &id, &doc).await;
    let got = c.node(1).read(&ns(), &id).await.unwrap().unwrap();
    assert_eq!(got, doc);
    c.shutdown().await;
}

/// Many concurrent readers on one member.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[timeout(60000)]
async fn test_concurrent_reads() {
    let c = std::sync::Arc::new(TcpCluster::start(3, 5).await);
    for i in 0..10 {
        c.insert(0, &ns(), &DocumentId::new(format!("doc-{i:04}")), &sample_document(i))
            .await;
    }

    let mut handles = Vec::new();
    for r in 0..40 {
        let c = c.clone();
        handles.push(tokio::spawn(async move {
            let i = r % 10;
            let got = c
                .node(r % 5)
                .read(&ns(), &DocumentId::new(format!("doc-{i:04}")))
                .await
                .unwrap()
                .unwrap();
            assert_eq!(got, sample_document(i));
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(c.metrics().snapshot().successes, 40);
}
