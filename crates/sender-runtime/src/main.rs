//! # Sender Runtime
//!
//! Runs one owner context holding a `ConcurrentSender` over the in-memory
//! engine, then plays the engine's part from worker threads:
//!
//! 1. `help.getConfig` answered normally
//! 2. `messages.sendMessage` ordered after (1), hit by a flood wait the
//!    engine absorbs, then answered
//! 3. a request to dc2 that fails
//! 4. a request cancelled from another thread, answered late
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging from `CS_*` environment variables
//! 2. Load `SenderConfig` from `CS_CONFIG` if set
//! 3. Spawn the owner queue
//! 4. Send, answer, collect outcomes
//! 5. Shut the owner down

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use concurrent_sender::{
    encode_response, BincodeRequest, ConcurrentSender, InMemoryEngine, MetricsRecorder,
    OwnerBridge, OwnerQueue, RequestId, RoutingKey, RpcError, SenderConfig, SenderMetrics,
};
use sender_telemetry::{init_logging, TelemetryConfig};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize)]
struct GetConfig;

#[derive(Debug, Serialize, Deserialize)]
struct DcConfig {
    this_dc: u32,
    dc_count: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct SendMessage {
    peer: u64,
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct SentMessage {
    id: u64,
    date: u64,
}

/// What a handler observed, reported back to `main`.
#[derive(Debug)]
enum Outcome {
    Config(DcConfig),
    Sent(RequestId, SentMessage),
    Failed(RequestId, RpcError),
}

/// Handlers expected to fire: cases 1, 2 and 3.
const EXPECTED_OUTCOMES: usize = 3;

/// Load configuration from `CS_CONFIG`, or defaults.
fn load_config() -> Result<SenderConfig> {
    match std::env::var("CS_CONFIG") {
        Ok(path) => SenderConfig::load(&path)
            .with_context(|| format!("Failed to load sender config from {path}")),
        Err(_) => Ok(SenderConfig::default()),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(&TelemetryConfig::from_env())?;

    let config = load_config()?;
    info!(
        owner = %config.owner_name,
        route = %config.default_route,
        fail_skip = ?config.default_fail_skip,
        "Starting sender runtime"
    );

    let engine = Arc::new(InMemoryEngine::new());
    let metrics = Arc::new(SenderMetrics::new());

    let owner = {
        let engine = engine.clone();
        let metrics = metrics.clone();
        let sender_config = config.clone();
        OwnerQueue::spawn_with(&config.owner_name, move |weak| {
            ConcurrentSender::with_config(OwnerBridge::on_queue(weak), engine, sender_config)
                .with_metrics(metrics)
        })
    };

    let get_config = BincodeRequest::<DcConfig>::encode("help.getConfig", &GetConfig)?;
    let send_message = BincodeRequest::<SentMessage>::encode(
        "messages.sendMessage",
        &SendMessage {
            peer: 42,
            text: "hello".to_string(),
        },
    )?;
    let foreign_message = BincodeRequest::<SentMessage>::encode(
        "messages.sendMessage",
        &SendMessage {
            peer: 7,
            text: "hi from dc2".to_string(),
        },
    )?;
    let slow_config = BincodeRequest::<DcConfig>::encode("help.getConfig", &GetConfig)?;

    let (tx, mut outcomes) = mpsc::unbounded_channel();

    let [config_id, message_id, foreign_id, slow_id] = owner
        .call(move |sender| {
            let config_tx = tx.clone();
            let config_id = sender
                .begin_request(get_config)
                .done_value(move |dc| {
                    let _ = config_tx.send(Outcome::Config(dc));
                })
                .send();

            let sent_tx = tx.clone();
            let message_id = sender
                .begin_request(send_message)
                .after(config_id)
                .skip_flood_errors()
                .done(move |id, message| {
                    let _ = sent_tx.send(Outcome::Sent(id, message));
                })
                .fail_id(|id| warn!(request_id = %id, "Message was not sent"))
                .send();

            let foreign_id = sender
                .begin_request(foreign_message)
                .to_route(RoutingKey::new(2))
                .fail(move |id, error| {
                    let _ = tx.send(Outcome::Failed(id, error));
                })
                .send();

            let slow_id = sender
                .begin_request(slow_config)
                .done_bare(|| warn!("Cancelled request completed"))
                .send();

            [config_id, message_id, foreign_id, slow_id]
        })
        .await?;

    // Cancel (4) from a foreign thread, then wait until the owner applied it.
    let canceller = owner.call(|sender| sender.canceller()).await?;
    thread::spawn(move || canceller.cancel(slow_id))
        .join()
        .map_err(|_| anyhow::anyhow!("canceller thread panicked"))?;
    owner.call(|_| ()).await?;

    let config_reply = encode_response(&DcConfig {
        this_dc: 2,
        dc_count: 5,
    })?;
    let message_reply = encode_response(&SentMessage {
        id: 1001,
        date: 1_700_000_000,
    })?;
    let late_reply = config_reply.clone();

    let workers = vec![
        {
            let engine = engine.clone();
            thread::Builder::new()
                .name("engine-config".into())
                .spawn(move || {
                    engine.respond(config_id, config_reply);
                })?
        },
        {
            let engine = engine.clone();
            thread::Builder::new()
                .name("engine-message".into())
                .spawn(move || {
                    let absorbed = engine.fail(message_id, RpcError::flood_wait(1));
                    info!(request_id = %message_id, delivery = ?absorbed, "Injected flood wait");
                    engine.respond(message_id, message_reply);
                })?
        },
        {
            let engine = engine.clone();
            thread::Builder::new()
                .name("engine-dc2".into())
                .spawn(move || {
                    engine.fail(
                        foreign_id,
                        RpcError::new(400, "PEER_ID_INVALID", "peer is not known on dc2"),
                    );
                })?
        },
        {
            let engine = engine.clone();
            thread::Builder::new()
                .name("engine-late".into())
                .spawn(move || {
                    let delivery = engine.respond(slow_id, late_reply);
                    info!(request_id = %slow_id, delivery = ?delivery, "Answered cancelled request");
                })?
        },
    ];
    for worker in workers {
        worker
            .join()
            .map_err(|_| anyhow::anyhow!("engine worker panicked"))?;
    }

    for _ in 0..EXPECTED_OUTCOMES {
        let outcome = tokio::time::timeout(Duration::from_secs(5), outcomes.recv())
            .await
            .context("Timed out waiting for a handler")?
            .context("Owner dropped every handler")?;
        info!(outcome = ?outcome, "Handler fired");
    }

    let pending = owner.call(|sender| sender.pending_count()).await?;
    info!(pending, wire_order = ?engine.wire_order(), "All requests settled");

    owner.shutdown().await;

    let snapshot = metrics.snapshot();
    info!(
        sent = snapshot.sent,
        completed = snapshot.completed,
        failed = snapshot.failed,
        cancelled = snapshot.cancelled,
        unknown_ids = snapshot.unknown_ids,
        decode_failures = snapshot.decode_failures,
        avg_completion_us = snapshot.avg_completion_ns / 1_000,
        "Sender runtime finished"
    );

    Ok(())
}
