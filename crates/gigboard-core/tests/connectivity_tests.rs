//! Connectivity monitor behaviour across transition sequences and sources.

mod common;

use async_trait::async_trait;
use common::{job, Job, Network, Script};
use gigboard_core::config::{NotificationConfig, ProbeConfig};
use gigboard_core::connectivity::ReachabilityProbe;
use gigboard_core::{
    ConnectivityMonitor, ConnectivityState, FetchCoordinator, ProbeReachability, ToastSurface,
    Transition,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

fn restored_count(toasts: &ToastSurface) -> usize {
    toasts
        .dispatched()
        .iter()
        .filter(|record| record.notification.title == NotificationConfig::RESTORED_TITLE)
        .count()
}

/// Every sequence of up to six transitions, from either starting state.
fn sequences() -> impl Iterator<Item = (bool, Vec<Transition>)> {
    (0..=6usize).flat_map(|len| {
        [true, false].into_iter().flat_map(move |start| {
            (0..(1u32 << len)).map(move |mask| {
                let seq = (0..len)
                    .map(|bit| {
                        if mask & (1 << bit) != 0 {
                            Transition::Online
                        } else {
                            Transition::Offline
                        }
                    })
                    .collect();
                (start, seq)
            })
        })
    })
}

#[test]
fn test_state_follows_every_transition_sequence() {
    for (start, seq) in sequences() {
        let network = Network::new(start);

        let mut expected = ConnectivityState {
            is_online: start,
            was_offline: !start,
        };
        let mut expected_restored = 0;

        for transition in &seq {
            network.source.apply(*transition);
            match transition {
                Transition::Online => {
                    if expected.was_offline {
                        expected_restored += 1;
                    }
                    expected.is_online = true;
                    expected.was_offline = false;
                }
                Transition::Offline => {
                    expected.is_online = false;
                    expected.was_offline = true;
                }
            }
        }

        let context = format!("start online: {start}, transitions: {seq:?}");
        assert_eq!(network.monitor.state(), expected, "{context}");
        assert_eq!(restored_count(&network.toasts), expected_restored, "{context}");
        assert_eq!(
            network
                .toasts
                .visible_with_key(NotificationConfig::OFFLINE_DEDUPE_KEY),
            usize::from(!expected.is_online),
            "{context}"
        );
    }
}

#[test]
fn test_online_mount_never_announces_recovery() {
    let network = Network::new(true);
    for _ in 0..3 {
        network.source.set_online();
    }
    assert_eq!(restored_count(&network.toasts), 0);
    assert!(network.toasts.dispatched().is_empty());
}

#[test]
fn test_flapping_settles_on_last_transition() {
    let network = Network::new(true);
    network.source.set_offline();
    network.source.set_online();
    network.source.set_offline();

    assert_eq!(
        network.monitor.state(),
        ConnectivityState {
            is_online: false,
            was_offline: true
        }
    );
    assert_eq!(restored_count(&network.toasts), 1);
    assert_eq!(
        network
            .toasts
            .visible_with_key(NotificationConfig::OFFLINE_DEDUPE_KEY),
        1
    );
}

#[test]
fn test_teardown_stops_all_notifications() {
    let network = Network::new(true);
    let handle = network.monitor.handle();
    let Network {
        source,
        toasts,
        monitor,
    } = network;
    monitor.teardown();

    source.set_offline();
    source.set_online();
    assert!(toasts.dispatched().is_empty());
    assert_eq!(source.listener_count(), 0);
    assert!(!handle.is_active());
}

#[test]
fn test_monitors_are_independent() {
    let network = Network::new(true);
    let second_toasts = Arc::new(ToastSurface::new());
    let second = ConnectivityMonitor::start(network.source.clone(), second_toasts.clone());

    network.source.set_offline();
    assert!(!network.monitor.is_online());
    assert!(!second.is_online());

    second.teardown();
    network.source.set_online();
    assert!(network.monitor.is_online());
    assert_eq!(restored_count(&network.toasts), 1);
    assert_eq!(restored_count(&second_toasts), 0);
}

struct SwitchProbe {
    up: AtomicBool,
}

#[async_trait]
impl ReachabilityProbe for SwitchProbe {
    async fn probe(&self, _url: &str) -> bool {
        self.up.load(Ordering::SeqCst)
    }
}

#[tokio::test]
async fn test_probe_source_drives_monitor_and_recovery() {
    let probe = Arc::new(SwitchProbe {
        up: AtomicBool::new(true),
    });
    let config = ProbeConfig::default().with_probe_urls(["http://probe.invalid/health"]);
    let source = Arc::new(ProbeReachability::new(config, probe.clone()).unwrap());
    let toasts = Arc::new(ToastSurface::new());
    let monitor = ConnectivityMonitor::start(source.clone(), toasts.clone());

    let script = Script::<Job>::new();
    let coordinator = FetchCoordinator::builder(script.producer())
        .mount(monitor.handle(), toasts.clone());
    script.resolve(0, job("job-0"));
    coordinator.settled().await;

    probe.up.store(false, Ordering::SeqCst);
    assert!(!source.check().await);
    assert!(!monitor.is_online());
    assert_eq!(toasts.visible_with_key(NotificationConfig::OFFLINE_DEDUPE_KEY), 1);

    probe.up.store(true, Ordering::SeqCst);
    assert!(source.check().await);
    assert!(monitor.is_online());

    script.wait_for_calls(2).await;
    script.resolve(1, job("job-1"));
    assert_eq!(coordinator.settled().await.data, Some(job("job-1")));
    assert_eq!(restored_count(&toasts), 1);
}
