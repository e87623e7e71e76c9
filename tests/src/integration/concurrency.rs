//! # Concurrent Completion
//!
//! Many requests in flight at once, answered by several engine threads in
//! random order, some failing and some cancelled midway. Each request
//! must reach exactly one terminal event and its handler at most once.

#[cfg(test)]
mod tests {
    use crate::fixtures::{get_history, history, history_reply, OwnedSender};
    use concurrent_sender::{MetricsRecorder, RequestId, RpcError};
    use parking_lot::Mutex;
    use rand::seq::SliceRandom;
    use rand::Rng;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::thread;

    const REQUESTS: u64 = 400;
    const ENGINE_THREADS: usize = 8;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Seen {
        Done(u64, Vec<u64>),
        Failed(String),
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Plan {
        Respond,
        Fail,
        Cancel,
    }

    /// Send `REQUESTS` requests, each recording what its handlers see.
    async fn send_all(
        harness: &OwnedSender,
        seen: &Arc<Mutex<HashMap<RequestId, Vec<Seen>>>>,
    ) -> Vec<(RequestId, u64)> {
        let seen = seen.clone();
        harness
            .owner
            .call(move |sender| {
                (0..REQUESTS)
                    .map(|peer| {
                        let done_seen = seen.clone();
                        let fail_seen = seen.clone();
                        let id = sender
                            .begin_request(get_history(peer, 0, (peer % 7) as u32))
                            .done(move |id, page| {
                                done_seen
                                    .lock()
                                    .entry(id)
                                    .or_default()
                                    .push(Seen::Done(page.peer, page.message_ids));
                            })
                            .fail(move |id, error| {
                                fail_seen
                                    .lock()
                                    .entry(id)
                                    .or_default()
                                    .push(Seen::Failed(error.kind));
                            })
                            .send();
                        (id, peer)
                    })
                    .collect()
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_shuffled_completions_from_many_threads() {
        let harness = OwnedSender::spawn("concurrency");
        let seen = Arc::new(Mutex::new(HashMap::new()));

        let mut requests = send_all(&harness, &seen).await;
        requests.shuffle(&mut rand::thread_rng());

        let chunk = requests.len().div_ceil(ENGINE_THREADS);
        let workers: Vec<_> = requests
            .chunks(chunk)
            .map(|batch| {
                let engine = harness.engine.clone();
                let batch = batch.to_vec();
                thread::spawn(move || {
                    for (id, peer) in batch {
                        engine.respond(id, history_reply(peer, 0, (peer % 7) as u32));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        harness.settle().await;

        let pending = harness.owner.call(|s| s.pending_count()).await.unwrap();
        assert_eq!(pending, 0);
        assert_eq!(harness.metrics.snapshot().completed, REQUESTS);

        let seen = seen.lock();
        assert_eq!(seen.len(), REQUESTS as usize);
        for (id, peer) in &requests {
            let expected = history(*peer, 0, (*peer % 7) as u32);
            assert_eq!(
                seen[id],
                vec![Seen::Done(expected.peer, expected.message_ids)],
                "request {id}"
            );
        }
    }

    #[tokio::test]
    async fn test_mixed_terminal_events() {
        let harness = OwnedSender::spawn("mixed");
        let seen = Arc::new(Mutex::new(HashMap::new()));

        let requests = send_all(&harness, &seen).await;

        let mut rng = rand::thread_rng();
        let plans: Vec<(RequestId, u64, Plan)> = requests
            .iter()
            .map(|(id, peer)| {
                let plan = match rng.gen_range(0..3) {
                    0 => Plan::Respond,
                    1 => Plan::Fail,
                    _ => Plan::Cancel,
                };
                (*id, *peer, plan)
            })
            .collect();

        // Cancels go through the canceller from their own thread.
        let canceller = harness.owner.call(|s| s.canceller()).await.unwrap();
        let to_cancel: Vec<RequestId> = plans
            .iter()
            .filter(|(_, _, plan)| *plan == Plan::Cancel)
            .map(|(id, _, _)| *id)
            .collect();
        let cancel_thread = thread::spawn(move || {
            for id in to_cancel {
                canceller.cancel(id);
            }
        });

        let mut shuffled = plans.clone();
        shuffled.shuffle(&mut rng);
        let chunk = shuffled.len().div_ceil(ENGINE_THREADS);
        let workers: Vec<_> = shuffled
            .chunks(chunk)
            .map(|batch| {
                let engine = harness.engine.clone();
                let batch = batch.to_vec();
                thread::spawn(move || {
                    for (id, peer, plan) in batch {
                        match plan {
                            Plan::Respond => {
                                engine.respond(id, history_reply(peer, 0, (peer % 7) as u32));
                            }
                            Plan::Fail => {
                                engine.fail(id, RpcError::new(400, "HISTORY_GET_FAILED", ""));
                            }
                            // Cancelled requests may still be answered; the
                            // race with the cancel decides what fires.
                            Plan::Cancel => {
                                engine.respond(id, history_reply(peer, 0, 1));
                            }
                        }
                    }
                })
            })
            .collect();

        cancel_thread.join().unwrap();
        for worker in workers {
            worker.join().unwrap();
        }
        harness.settle().await;

        let seen = seen.lock();
        for (id, peer, plan) in &plans {
            let events = seen.get(id).cloned().unwrap_or_default();
            match plan {
                Plan::Respond => {
                    let expected = history(*peer, 0, (*peer % 7) as u32);
                    assert_eq!(events, vec![Seen::Done(expected.peer, expected.message_ids)]);
                }
                Plan::Fail => {
                    assert_eq!(events, vec![Seen::Failed("HISTORY_GET_FAILED".into())]);
                }
                Plan::Cancel => assert!(events.len() <= 1, "request {id} fired twice"),
            }
        }

        // Every request reached exactly one terminal event on the sender.
        let snapshot = harness.metrics.snapshot();
        assert_eq!(
            snapshot.completed + snapshot.failed + snapshot.cancelled,
            REQUESTS
        );
        assert_eq!(snapshot.in_flight(), 0);
    }
}
