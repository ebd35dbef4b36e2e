//! Hub worker: owns the push connection and feeds events to the dispatcher

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::hub::connection::{ConnectionEvent, ConnectionTracker};
use crate::hub::dispatch::{Dispatcher, SessionStart};
use crate::hub::protocol::HubMessage;
use crate::hub::transport::{HubConnector, HubSession};
use crate::utils::{calc_exp_backoff, CooldownOptions};

type ShutdownSignal = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Hub worker options
#[derive(Debug, Clone)]
pub struct Options {
    /// Delays before each automatic reconnection attempt
    pub reconnect_delays: Vec<Duration>,

    /// Backoff for new connection attempts once disconnected
    pub retry_cooldown: CooldownOptions,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            reconnect_delays: vec![
                Duration::ZERO,
                Duration::from_secs(2),
                Duration::from_secs(10),
                Duration::from_secs(30),
            ],
            retry_cooldown: CooldownOptions::default(),
        }
    }
}

enum SessionEnd {
    Shutdown,
    Disconnected,
}

enum PumpExit {
    Shutdown,
    Closed,
    Lost(String),
}

enum Reconnect {
    Session(Box<dyn HubSession>),
    GaveUp,
    Shutdown,
}

/// Run the hub worker until shutdown
///
/// Connection errors never leave this function; they show up as
/// transitions on the tracker.
pub async fn run<S, F>(
    options: &Options,
    connector: &dyn HubConnector,
    dispatcher: &Dispatcher,
    tracker: &ConnectionTracker,
    sleep_fn: S,
    mut shutdown_signal: ShutdownSignal,
) where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    info!("Hub worker starting, endpoint: {}", connector.endpoint());

    let mut retry_attempt: u32 = 0;
    let mut start_kind = SessionStart::Initial;

    loop {
        tracker.record(ConnectionEvent::Start);

        let connected = tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Hub worker shutting down while connecting...");
                tracker.record(ConnectionEvent::Stop);
                return;
            }
            result = connector.connect() => result,
        };

        match connected {
            Ok(session) => {
                tracker.record(ConnectionEvent::Established);
                info!("Connected to hub: {}", connector.endpoint());
                retry_attempt = 0;
                dispatcher.session_started(start_kind);

                match serve_session(
                    options,
                    session,
                    connector,
                    dispatcher,
                    tracker,
                    &sleep_fn,
                    &mut shutdown_signal,
                )
                .await
                {
                    SessionEnd::Shutdown => return,
                    SessionEnd::Disconnected => start_kind = SessionStart::AfterDisconnect,
                }
            }
            Err(e) => {
                tracker.record(ConnectionEvent::Failed);
                error!("Failed to connect to hub: {}", e);
            }
        }

        let delay = calc_exp_backoff(&options.retry_cooldown, retry_attempt);
        retry_attempt = retry_attempt.saturating_add(1);
        info!("Retrying hub connection in {:?}", delay);

        tokio::select! {
            _ = &mut shutdown_signal => {
                info!("Hub worker shutting down...");
                tracker.record(ConnectionEvent::Stop);
                return;
            }
            _ = sleep_fn(delay) => {}
        }
    }
}

/// Pump a session, reconnecting automatically on loss
async fn serve_session<S, F>(
    options: &Options,
    mut session: Box<dyn HubSession>,
    connector: &dyn HubConnector,
    dispatcher: &Dispatcher,
    tracker: &ConnectionTracker,
    sleep_fn: &S,
    shutdown_signal: &mut ShutdownSignal,
) -> SessionEnd
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    loop {
        let exit = pump(session.as_mut(), dispatcher, shutdown_signal).await;
        release(session.as_mut()).await;

        match exit {
            PumpExit::Shutdown => {
                info!("Hub worker shutting down, session released");
                tracker.record(ConnectionEvent::Stop);
                return SessionEnd::Shutdown;
            }
            PumpExit::Closed => {
                warn!("Hub closed the session without allowing reconnection");
                tracker.record(ConnectionEvent::Closed);
                return SessionEnd::Disconnected;
            }
            PumpExit::Lost(reason) => {
                warn!("Hub connection lost: {}", reason);
                tracker.record(ConnectionEvent::Lost);
            }
        }

        match reconnect(options, connector, sleep_fn, shutdown_signal).await {
            Reconnect::Session(next) => {
                session = next;
                tracker.record(ConnectionEvent::Reconnected);
                info!("Reconnected to hub");
                dispatcher.session_started(SessionStart::Resumed);
            }
            Reconnect::GaveUp => {
                error!(
                    "Hub reconnection gave up after {} attempts",
                    options.reconnect_delays.len()
                );
                tracker.record(ConnectionEvent::GaveUp);
                return SessionEnd::Disconnected;
            }
            Reconnect::Shutdown => {
                info!("Hub worker shutting down while reconnecting...");
                tracker.record(ConnectionEvent::Stop);
                return SessionEnd::Shutdown;
            }
        }
    }
}

/// Forward messages to the dispatcher until the session ends
async fn pump(
    session: &mut dyn HubSession,
    dispatcher: &Dispatcher,
    shutdown_signal: &mut ShutdownSignal,
) -> PumpExit {
    loop {
        let message = tokio::select! {
            _ = &mut *shutdown_signal => return PumpExit::Shutdown,
            message = session.next_message() => message,
        };

        match message {
            Ok(Some(HubMessage::Invocation { target, arguments })) => {
                dispatcher.dispatch(&target, &arguments);
            }
            Ok(Some(HubMessage::Ping)) => {
                debug!("Hub ping received");
            }
            Ok(Some(HubMessage::Close {
                error,
                allow_reconnect,
            })) => {
                if let Some(error) = &error {
                    warn!("Hub sent close: {}", error);
                }
                if allow_reconnect {
                    return PumpExit::Lost("server closed, reconnect allowed".to_string());
                }
                return PumpExit::Closed;
            }
            Ok(Some(HubMessage::Other(kind))) => {
                debug!("Ignoring hub message type {}", kind);
            }
            Ok(None) => return PumpExit::Lost("socket closed".to_string()),
            Err(e) => return PumpExit::Lost(e.to_string()),
        }
    }
}

/// Walk the reconnect schedule
async fn reconnect<S, F>(
    options: &Options,
    connector: &dyn HubConnector,
    sleep_fn: &S,
    shutdown_signal: &mut ShutdownSignal,
) -> Reconnect
where
    S: Fn(Duration) -> F,
    F: Future<Output = ()>,
{
    let attempts = options.reconnect_delays.len();
    for (attempt, delay) in options.reconnect_delays.iter().enumerate() {
        tokio::select! {
            _ = &mut *shutdown_signal => return Reconnect::Shutdown,
            _ = sleep_fn(*delay) => {}
        }

        info!("Hub reconnect attempt {}/{}", attempt + 1, attempts);

        tokio::select! {
            _ = &mut *shutdown_signal => return Reconnect::Shutdown,
            result = connector.connect() => match result {
                Ok(session) => return Reconnect::Session(session),
                Err(e) => warn!("Hub reconnect attempt {} failed: {}", attempt + 1, e),
            },
        }
    }
    Reconnect::GaveUp
}

async fn release(session: &mut dyn HubSession) {
    if let Err(e) = session.close().await {
        debug!("Hub session close: {}", e);
    }
}
