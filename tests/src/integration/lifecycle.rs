//! # Owner Lifecycle
//!
//! What happens around the owner itself: destruction with requests still
//! in flight, late engine callbacks, follow-up requests sent from inside a
//! handler, and file-based configuration.

#[cfg(test)]
mod tests {
    use crate::fixtures::{get_history, history_reply, OwnedSender};
    use concurrent_sender::{
        ConfigError, Delivery, FailSkipPolicy, MetricsRecorder, RequestId, RoutingKey,
        SenderConfig,
    };
    use parking_lot::Mutex;
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[tokio::test]
    async fn test_shutdown_cancels_pending_and_ignores_late_callbacks() {
        let harness = OwnedSender::spawn("shutdown");
        let fired = Arc::new(AtomicUsize::new(0));

        let count = fired.clone();
        let ids = harness
            .owner
            .call(move |sender| {
                (0..10)
                    .map(|peer| {
                        let done = count.clone();
                        let fail = count.clone();
                        sender
                            .begin_request(get_history(peer, 0, 5))
                            .done_value(move |_| {
                                done.fetch_add(1, Ordering::SeqCst);
                            })
                            .fail_error(move |_| {
                                fail.fetch_add(1, Ordering::SeqCst);
                            })
                            .send()
                    })
                    .collect::<Vec<RequestId>>()
            })
            .await
            .unwrap();

        let OwnedSender {
            owner,
            engine,
            metrics,
        } = harness;
        let weak = owner.weak();
        owner.shutdown().await;

        let mut cancelled = engine.cancelled();
        cancelled.sort();
        assert_eq!(cancelled, ids);
        assert_eq!(metrics.snapshot().teardown_cancelled, 10);
        assert!(!weak.is_alive());
        // Every handler was dropped with the registry.
        assert_eq!(Arc::strong_count(&fired), 1);

        let late: Vec<_> = ids
            .iter()
            .map(|&id| {
                let engine = engine.clone();
                thread::spawn(move || engine.respond(id, history_reply(0, 0, 5)))
            })
            .collect();
        for worker in late {
            assert_eq!(worker.join().unwrap(), Delivery::Late);
        }

        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(metrics.snapshot().unknown_ids, 0);
    }

    #[tokio::test]
    async fn test_follow_up_request_from_handler() {
        let harness = OwnedSender::spawn("pagination");
        let pages = Arc::new(Mutex::new(Vec::new()));

        let sink = pages.clone();
        let first = harness
            .owner
            .call(move |sender| {
                let bridge = sender.bridge().clone();
                sender
                    .begin_request(get_history(20, 0, 2))
                    .done_value(move |page| {
                        sink.lock().push(page.message_ids.clone());
                        // Handlers have no sender access; the next page is
                        // requested through the bridge.
                        let next = page.message_ids.len() as u32;
                        bridge.marshal(move |sender| {
                            sender
                                .begin_request(get_history(20, next, 2))
                                .done_value(move |page| sink.lock().push(page.message_ids))
                                .send();
                        });
                    })
                    .send()
            })
            .await
            .unwrap();

        harness.engine.respond(first, history_reply(20, 0, 2));
        // The follow-up is queued behind the first barrier; wait twice.
        harness.settle().await;
        harness.settle().await;

        let submissions = harness.engine.submissions();
        assert_eq!(submissions.len(), 2);
        let second = submissions[1].request_id;

        harness.engine.respond(second, history_reply(20, 2, 2));
        harness.settle().await;

        assert_eq!(*pages.lock(), vec![vec![0, 1], vec![2, 3]]);
    }

    #[tokio::test]
    async fn test_config_file_drives_request_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            owner_name = "media"
            default_route = 30004
            default_wait_budget = "50ms"
            max_wait_budget = "2s"
            default_fail_skip = "handle_flood"
            "#
        )
        .unwrap();

        let config = SenderConfig::load(file.path()).unwrap();
        let harness = OwnedSender::spawn_with_config(config);

        let (plain, tuned) = harness
            .owner
            .call(|sender| {
                let plain = sender.begin_request(get_history(1, 0, 1)).send();
                let tuned = sender
                    .begin_request(get_history(1, 1, 1))
                    .with_wait_budget(Duration::from_secs(30))
                    .skip_all_errors()
                    .send();
                (plain, tuned)
            })
            .await
            .unwrap();

        let plain = harness.engine.submission(plain).unwrap();
        assert_eq!(plain.route, RoutingKey::shifted(4, 3).unwrap());
        assert_eq!(plain.wait_budget, Duration::from_millis(50));
        assert_eq!(plain.fail_skip, FailSkipPolicy::HandleFlood);

        let tuned = harness.engine.submission(tuned).unwrap();
        assert_eq!(tuned.wait_budget, Duration::from_secs(2));
        assert_eq!(tuned.fail_skip, FailSkipPolicy::HandleAll);

        assert_eq!(harness.owner.name(), "media");
    }

    #[test]
    fn test_missing_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = SenderConfig::load(dir.path().join("absent.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
