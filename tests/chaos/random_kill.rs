//! Chaos test: random member kill/revive.
//!
//! 7-member replica set with k=4. Each round a seeded pseudo-random set of
//! up to `m - k` members is killed while readers hammer the survivors.
//! Every read from a live member must return the original document.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use ntest::timeout;
use tessera_integration_tests::{TcpCluster, sample_document};
use tessera_types::{DocumentId, Namespace};
use tokio::sync::RwLock;
use tokio::task::JoinSet;

const K: usize = 4;
const M: usize = 7;
const DOCS: usize = 30;
const ROUNDS: usize = 8;

/// Linear congruential generator; the test must replay identically.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        self.0 >> 33
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next() % n as u64) as usize
    }
}

fn ns() -> Namespace {
    Namespace::new("chaos.docs")
}

fn doc_id(i: usize) -> DocumentId {
    DocumentId::new(format!("doc-{i:04}"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[timeout(120000)]
async fn test_random_kill_no_data_loss() {
    let cluster = TcpCluster::start(K, M).await;
    for i in 0..DOCS {
        cluster.insert(i % M, &ns(), &doc_id(i), &sample_document(i)).await;
    }
    let cluster = Arc::new(RwLock::new(cluster));
    let reads = Arc::new(AtomicUsize::new(0));
    let mut rng = Lcg(0x5EED_0001);

    for round in 0..ROUNDS {
        // --- Kill phase ---
        let victims = {
            let mut c = cluster.write().await;
            let count = rng.below(M - K + 1);
            let mut victims = Vec::with_capacity(count);
            while victims.len() < count {
                let v = rng.below(M);
                if !victims.contains(&v) {
                    c.kill(v).await;
                    victims.push(v);
                }
            }
            victims
        };
        let live: Vec<usize> = (0..M).filter(|i| !victims.contains(i)).collect();

        // --- Read phase: concurrent readers on the survivors ---
        let mut readers = JoinSet::new();
        for r in 0..4 {
            let cluster = cluster.clone();
            let reads = reads.clone();
            let live = live.clone();
            let seed = rng.next();
            readers.spawn(async move {
                let mut rng = Lcg(seed);
                for _ in 0..DOCS {
                    let i = rng.below(DOCS);
                    let member = live[rng.below(live.len())];
                    let c = cluster.read().await;
                    let got = c
                        .node(member)
                        .read(&ns(), &doc_id(i))
                        .await
                        .unwrap_or_else(|e| {
                            panic!("round {round} reader {r}: doc {i} via member {member}: {e}")
                        })
                        .unwrap();
                    assert_eq!(got, sample_document(i));
                    reads.fetch_add(1, Ordering::Relaxed);
                }
            });
        }
        while let Some(result) = readers.join_next().await {
            result.unwrap();
        }

        // --- Revive phase ---
        let mut c = cluster.write().await;
        for v in victims {
            c.revive(v).await;
        }
        assert!((0..M).all(|i| c.is_alive(i)));
    }

    assert_eq!(reads.load(Ordering::Relaxed), ROUNDS * 4 * DOCS);

    // After the chaos: everything readable from every member.
    let c = cluster.read().await;
    for i in 0..DOCS {
        for member in 0..M {
            let got = c.node(member).read(&ns(), &doc_id(i)).await.unwrap().unwrap();
            assert_eq!(got, sample_document(i));
        }
    }
    let snapshot = c.metrics().snapshot();
    assert_eq!(snapshot.quorum_failures, 0);
    assert_eq!(snapshot.timeouts, 0);
}
