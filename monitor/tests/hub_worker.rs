mod common;

use std::sync::Arc;
use std::time::Duration;

use mokamon::handlers::{NotificationHandler, StatusHandler};
use mokamon::hub::connection::{ConnectionState, ConnectionTracker};
use mokamon::hub::dispatch::Dispatcher;
use mokamon::hub::events::HubEvents;
use mokamon::hub::protocol::HubMessage;
use mokamon::notifications::NotificationFeed;
use mokamon::roster::reconcile::ReconcileOptions;
use mokamon::roster::seed::default_seed;
use mokamon::roster::store::RosterStore;
use mokamon::roster::ReconnectPolicy;
use mokamon::status::MachineStatus;
use mokamon::workers::hub;
use serde_json::json;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use common::{eventually, invocation, status_event, ScriptedConnector, Step};

struct Harness {
    connector: Arc<ScriptedConnector>,
    roster: Arc<RosterStore>,
    tracker: Arc<ConnectionTracker>,
    feed: Arc<NotificationFeed>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl Harness {
    fn start(
        attempts: Vec<Option<Vec<Step>>>,
        policy: ReconnectPolicy,
        options: hub::Options,
        real_sleep: bool,
    ) -> Self {
        let connector = ScriptedConnector::new(attempts);
        let roster = Arc::new(RosterStore::new(default_seed(), ReconcileOptions::default()));
        let tracker = Arc::new(ConnectionTracker::new("scripted://hub"));
        let feed = Arc::new(NotificationFeed::default());

        let status = Arc::new(StatusHandler::new(roster.clone(), policy, default_seed()));
        let dispatcher = Arc::new(
            Dispatcher::new()
                .on(HubEvents::STATUS, status.clone())
                .on(
                    HubEvents::LOT_COMPLETED,
                    Arc::new(NotificationHandler::new(HubEvents::LOT_COMPLETED, feed.clone())),
                )
                .observe(status),
        );

        let (tx, rx) = oneshot::channel::<()>();
        let worker_connector = connector.clone();
        let worker_tracker = tracker.clone();
        let handle = tokio::spawn(async move {
            let shutdown = Box::pin(async move {
                let _ = rx.await;
            });
            if real_sleep {
                hub::run(
                    &options,
                    worker_connector.as_ref(),
                    dispatcher.as_ref(),
                    worker_tracker.as_ref(),
                    tokio::time::sleep,
                    shutdown,
                )
                .await;
            } else {
                hub::run(
                    &options,
                    worker_connector.as_ref(),
                    dispatcher.as_ref(),
                    worker_tracker.as_ref(),
                    |_| tokio::task::yield_now(),
                    shutdown,
                )
                .await;
            }
        });

        Self {
            connector,
            roster,
            tracker,
            feed,
            shutdown: Some(tx),
            handle,
        }
    }

    async fn stop(mut self) -> Self {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        let handle = std::mem::replace(&mut self.handle, tokio::spawn(async {}));
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("worker did not stop")
            .unwrap();
        self
    }

    fn transitions(&self) -> Vec<(ConnectionState, ConnectionState)> {
        self.tracker
            .history()
            .into_iter()
            .map(|t| (t.from, t.to))
            .collect()
    }
}

#[tokio::test]
async fn test_drop_mid_session_reconnects_without_touching_roster() {
    let harness = Harness::start(
        vec![
            Some(vec![
                status_event(json!({ "Machine": "cnc_italy", "Status": "running" })),
                Step::Fail,
            ]),
            Some(vec![status_event(json!({ "Machine": "cnc_italy", "Status": 3 }))]),
        ],
        ReconnectPolicy::Reseed,
        hub::Options::default(),
        false,
    );

    let roster = harness.roster.clone();
    eventually(|| roster.snapshot().version == 2).await;

    use ConnectionState::*;
    assert_eq!(
        harness.transitions(),
        vec![
            (Disconnected, Connecting),
            (Connecting, Connected),
            (Connected, Reconnecting),
            (Reconnecting, Connected),
        ]
    );
    assert_eq!(harness.tracker.reconnects(), 1);

    // one version per status event; automatic reconnection never reseeds
    let snapshot = harness.roster.snapshot();
    assert_eq!(snapshot.version, 2);
    assert_eq!(snapshot.len(), 12);
    assert_eq!(snapshot.get("cnc_italy").unwrap().status, MachineStatus::Alarm);

    let harness = harness.stop().await;
    assert_eq!(harness.tracker.state(), Disconnected);
    assert_eq!(harness.connector.closed(), 2);
}

#[tokio::test]
async fn test_close_without_reconnect_disconnects_then_retries() {
    let harness = Harness::start(
        vec![
            Some(vec![
                status_event(json!({ "Machine": "cnc_italy", "Status": 1 })),
                Step::Message(HubMessage::Close {
                    error: Some("server restarting".to_string()),
                    allow_reconnect: false,
                }),
            ]),
            Some(vec![]),
        ],
        ReconnectPolicy::Reseed,
        hub::Options::default(),
        false,
    );

    let connector = harness.connector.clone();
    let roster = harness.roster.clone();
    eventually(|| connector.connects() == 2 && roster.snapshot().version == 2).await;

    use ConnectionState::*;
    let transitions = harness.transitions();
    assert!(transitions.contains(&(Connected, Disconnected)));
    assert!(!transitions.contains(&(Connected, Reconnecting)));
    assert_eq!(harness.tracker.reconnects(), 0);

    // fresh session after a disconnect reseeds under the reseed policy
    assert_eq!(
        harness.roster.snapshot().get("cnc_italy").unwrap().status,
        MachineStatus::Offline
    );

    harness.stop().await;
}

#[tokio::test]
async fn test_gives_up_after_schedule_then_retries_manually() {
    let harness = Harness::start(
        vec![
            Some(vec![Step::Fail]),
            None,
            None,
            None,
            None,
            Some(vec![status_event(json!({ "Machine": "lathe_vietnam", "Status": "idle" }))]),
        ],
        ReconnectPolicy::Preserve,
        hub::Options::default(),
        false,
    );

    let roster = harness.roster.clone();
    eventually(|| roster.snapshot().version == 1).await;

    use ConnectionState::*;
    let transitions = harness.transitions();
    assert!(transitions.contains(&(Reconnecting, Disconnected)));
    assert_eq!(transitions.last(), Some(&(Connecting, Connected)));
    assert_eq!(harness.connector.connects(), 6);
    assert_eq!(harness.tracker.reconnects(), 0);
    assert_eq!(
        harness.roster.snapshot().get("lathe_vietnam").unwrap().status,
        MachineStatus::Idle
    );

    harness.stop().await;
}

#[tokio::test]
async fn test_shutdown_during_reconnect_backoff() {
    let options = hub::Options {
        reconnect_delays: vec![Duration::from_secs(600)],
        ..Default::default()
    };
    let harness = Harness::start(
        vec![Some(vec![Step::Fail])],
        ReconnectPolicy::Preserve,
        options,
        true,
    );

    let mut state_rx = harness.tracker.subscribe();
    tokio::time::timeout(
        Duration::from_secs(5),
        state_rx.wait_for(|s| *s == ConnectionState::Reconnecting),
    )
    .await
    .expect("never reconnecting")
    .unwrap();

    let harness = harness.stop().await;
    assert_eq!(harness.tracker.state(), ConnectionState::Disconnected);
    assert_eq!(harness.connector.closed(), 1);
    assert_eq!(harness.connector.connects(), 1);
}

#[tokio::test]
async fn test_malformed_and_unknown_events_are_dropped() {
    let harness = Harness::start(
        vec![Some(vec![
            status_event(json!(42)),
            status_event(json!("not json")),
            invocation("machineStatusV2", json!({ "Machine": "cnc_brazil" })),
            invocation("LotCompleted", json!(r#"{"lotNumber":"L-9"}"#)),
            status_event(json!({ "Machine": "cnc_brazil", "Status": "maintenance" })),
        ])],
        ReconnectPolicy::Preserve,
        hub::Options::default(),
        false,
    );

    let roster = harness.roster.clone();
    eventually(|| roster.snapshot().version == 1).await;

    assert_eq!(harness.tracker.state(), ConnectionState::Connected);
    assert_eq!(
        harness.roster.snapshot().get("cnc_brazil").unwrap().status,
        MachineStatus::Maintenance
    );
    assert_eq!(harness.feed.list()[0].payload["lotNumber"], "L-9");

    harness.stop().await;
}
