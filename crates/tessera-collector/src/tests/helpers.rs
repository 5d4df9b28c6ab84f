//! Shared test utilities: a mock transport with per-member behaviour.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tessera_codec::{DocumentCodec, StaticIndexCatalog};
use tessera_erasure::ErasureCoder;
use tessera_net::{NetError, PeerConnection, Transport};
use tessera_types::{Document, SplitTarget, Value};

use crate::config::CollectorConfig;
use crate::collector::SplitCollector;
use crate::membership::StaticMembership;

/// How a mock member reacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behavior {
    /// Answers immediately with its split.
    Healthy,
    /// Refuses every connect.
    Down,
    /// Refuses the first `n` connects, then behaves healthy.
    FlakyConnect(u32),
    /// Has the document but not the split.
    Miss,
    /// Answers after a delay.
    Delay(Duration),
    /// Accepts the query and never answers.
    Hang,
    /// Fails the query.
    QueryError,
    /// Answers with a split one byte short.
    Truncated,
}

/// Routes queries to in-memory encoded documents.
pub struct MockTransport {
    codec: DocumentCodec,
    encoded: Document,
    target: SplitTarget,
    behaviors: HashMap<usize, Behavior>,
    connects: Mutex<HashMap<usize, u32>>,
}

impl MockTransport {
    pub fn new(fixture: &Fixture, behaviors: &[(usize, Behavior)]) -> Arc<Self> {
        Arc::new(Self {
            codec: fixture.codec.clone(),
            encoded: fixture.encoded.clone(),
            target: fixture.target.clone(),
            behaviors: behaviors.iter().copied().collect(),
            connects: Mutex::new(HashMap::new()),
        })
    }

    /// Connect attempts made against `member`.
    pub fn connect_count(&self, member: usize) -> u32 {
        self.connects
            .lock()
            .unwrap()
            .get(&member)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait::async_trait]
impl Transport for MockTransport {
    async fn connect(&self, addr: SocketAddr) -> Result<Box<dyn PeerConnection>, NetError> {
        let member = member_of(addr);
        let attempt = {
            let mut connects = self.connects.lock().unwrap();
            let count = connects.entry(member).or_insert(0);
            *count += 1;
            *count
        };
        let behavior = self
            .behaviors
            .get(&member)
            .copied()
            .unwrap_or(Behavior::Healthy);

        match behavior {
            Behavior::Down => Err(NetError::Connect(format!("{addr}: refused"))),
            Behavior::FlakyConnect(n) if attempt <= n => {
                Err(NetError::Connect(format!("{addr}: refused")))
            }
            _ => {
                let split = self.codec.split_of(&self.encoded, member).unwrap().data;
                Ok(Box::new(MockConnection {
                    behavior,
                    target: self.target.clone(),
                    split,
                }))
            }
        }
    }
}

struct MockConnection {
    behavior: Behavior,
    target: SplitTarget,
    split: Bytes,
}

#[async_trait::async_trait]
impl PeerConnection for MockConnection {
    async fn query_split(
        &mut self,
        target: &SplitTarget,
        _index: usize,
    ) -> Result<Option<Bytes>, NetError> {
        if *target != self.target {
            return Ok(None);
        }
        match self.behavior {
            Behavior::Miss => Ok(None),
            Behavior::Delay(d) => {
                tokio::time::sleep(d).await;
                Ok(Some(self.split.clone()))
            }
            Behavior::Hang => std::future::pending().await,
            Behavior::QueryError => Err(NetError::Remote("store offline".into())),
            Behavior::Truncated => Ok(Some(self.split.slice(..self.split.len() - 1))),
            Behavior::Healthy | Behavior::Down | Behavior::FlakyConnect(_) => {
                Ok(Some(self.split.clone()))
            }
        }
    }
}

/// Address of mock member `i`.
pub fn member_addr(i: usize) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 4820 + i as u16))
}

fn member_of(addr: SocketAddr) -> usize {
    (addr.port() - 4820) as usize
}

/// Generate deterministic, non-repeating test data.
pub fn test_data(size: usize) -> Vec<u8> {
    let mut data = Vec::with_capacity(size);
    let mut state: u32 = 0xDEAD_BEEF;
    for _ in 0..size {
        state = state.wrapping_mul(1103515245).wrapping_add(12345);
        data.push((state >> 16) as u8);
    }
    data
}

/// An original document, its encoded form and the codec that made it.
pub struct Fixture {
    pub codec: DocumentCodec,
    pub original: Document,
    pub encoded: Document,
    pub target: SplitTarget,
    pub k: usize,
    pub m: usize,
}

pub fn fixture(k: usize, m: usize) -> Fixture {
    let codec = DocumentCodec::new(Arc::new(ErasureCoder::new(k, m).unwrap()));
    let original = Document::new()
        .with("_id", "order-17")
        .with("customer", "c-204")
        .with("notes", "leave at the back door")
        .with("blob", Value::Binary(test_data(1000)))
        .with("total", 4599);
    let catalog = StaticIndexCatalog::new(["_id", "customer"]);
    let encoded = codec.encode_document(&original, &catalog).unwrap();
    Fixture {
        codec,
        original,
        encoded,
        target: SplitTarget::new("shop.orders", "order-17"),
        k,
        m,
    }
}

/// Short backoffs and a generous deadline.
pub fn fast_config() -> CollectorConfig {
    CollectorConfig {
        max_connect_attempts: 3,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
        query_timeout_ms: 1_000,
        request_timeout_ms: 5_000,
    }
}

pub fn collector(
    fixture: &Fixture,
    self_index: usize,
    transport: Arc<MockTransport>,
    config: &CollectorConfig,
) -> SplitCollector {
    let members = (0..fixture.m).map(member_addr).collect();
    let membership = StaticMembership::new(self_index, members, fixture.k).unwrap();
    SplitCollector::new(
        fixture.codec.clone(),
        Arc::new(membership),
        transport,
        config,
    )
    .unwrap()
}
