//! Shared fixtures for integration tests and benchmarks.

use bytes::Bytes;
use concurrent_sender::{
    encode_response, BincodeRequest, ConcurrentSender, InMemoryEngine, OwnerBridge, OwnerQueue,
    SenderConfig, SenderMetrics,
};
use sender_telemetry::{init_logging, TelemetryConfig};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Once};

/// `messages.getHistory` request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetHistory {
    pub peer: u64,
    pub offset: u32,
    pub limit: u32,
}

/// `messages.getHistory` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    pub peer: u64,
    pub message_ids: Vec<u64>,
}

pub const GET_HISTORY: &str = "messages.getHistory";

pub fn get_history(peer: u64, offset: u32, limit: u32) -> BincodeRequest<History> {
    BincodeRequest::encode(GET_HISTORY, &GetHistory { peer, offset, limit })
        .expect("GetHistory always encodes")
}

/// The history page a well-behaved server returns for `get_history`.
pub fn history(peer: u64, offset: u32, limit: u32) -> History {
    History {
        peer,
        message_ids: (offset..offset + limit).map(u64::from).collect(),
    }
}

pub fn history_reply(peer: u64, offset: u32, limit: u32) -> Bytes {
    encode_response(&history(peer, offset, limit)).expect("History always encodes")
}

/// Everything a test needs around one owner-hosted sender.
pub struct OwnedSender {
    pub owner: OwnerQueue<ConcurrentSender>,
    pub engine: Arc<InMemoryEngine>,
    pub metrics: Arc<SenderMetrics>,
}

impl OwnedSender {
    /// Spawn a sender on its own owner queue. Needs a Tokio runtime.
    pub fn spawn(name: &str) -> Self {
        Self::spawn_with_config(SenderConfig {
            owner_name: name.to_string(),
            ..SenderConfig::default()
        })
    }

    pub fn spawn_with_config(config: SenderConfig) -> Self {
        let engine = Arc::new(InMemoryEngine::new());
        let metrics = Arc::new(SenderMetrics::new());

        let owner = {
            let engine = engine.clone();
            let metrics = metrics.clone();
            let name = config.owner_name.clone();
            OwnerQueue::spawn_with(&name, move |weak| {
                ConcurrentSender::with_config(OwnerBridge::on_queue(weak), engine, config)
                    .with_metrics(metrics)
            })
        };

        Self {
            owner,
            engine,
            metrics,
        }
    }

    /// Wait until every job queued so far has run on the owner.
    pub async fn settle(&self) {
        self.owner.call(|_| ()).await.expect("owner is gone");
    }
}

/// Install a quiet global subscriber once per test binary.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let config = TelemetryConfig {
            service_name: "sender-tests".to_string(),
            log_level: "warn".to_string(),
            ..TelemetryConfig::from_env()
        };
        // Another harness may already own the global subscriber.
        let _ = init_logging(&config);
    });
}
