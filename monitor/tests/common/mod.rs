//! Scripted hub transport shared by the integration tests

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mokamon::errors::MonitorError;
use mokamon::hub::protocol::HubMessage;
use mokamon::hub::transport::{HubConnector, HubSession};
use serde_json::Value;

/// One step of a scripted session
#[derive(Debug, Clone)]
pub enum Step {
    Message(HubMessage),
    Fail,
}

pub fn status_event(payload: Value) -> Step {
    Step::Message(HubMessage::Invocation {
        target: "status".to_string(),
        arguments: vec![payload],
    })
}

pub fn invocation(target: &str, payload: Value) -> Step {
    Step::Message(HubMessage::Invocation {
        target: target.to_string(),
        arguments: vec![payload],
    })
}

/// Session that replays its steps, then waits forever
pub struct ScriptedSession {
    steps: VecDeque<Step>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl HubSession for ScriptedSession {
    async fn next_message(&mut self) -> Result<Option<HubMessage>, MonitorError> {
        match self.steps.pop_front() {
            Some(Step::Message(message)) => Ok(Some(message)),
            Some(Step::Fail) => Err(MonitorError::ConnectionError("connection reset".to_string())),
            None => {
                std::future::pending::<()>().await;
                Ok(None)
            }
        }
    }

    async fn close(&mut self) -> Result<(), MonitorError> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector handing out scripted sessions; `None` entries fail to connect
pub struct ScriptedConnector {
    attempts: Mutex<VecDeque<Option<Vec<Step>>>>,
    connects: AtomicUsize,
    closed: Arc<AtomicUsize>,
}

impl ScriptedConnector {
    pub fn new(attempts: Vec<Option<Vec<Step>>>) -> Arc<Self> {
        Arc::new(Self {
            attempts: Mutex::new(attempts.into()),
            connects: AtomicUsize::new(0),
            closed: Arc::new(AtomicUsize::new(0)),
        })
    }

    /// Connection attempts so far
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }

    /// Sessions released so far
    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HubConnector for ScriptedConnector {
    fn endpoint(&self) -> &str {
        "scripted://hub"
    }

    async fn connect(&self) -> Result<Box<dyn HubSession>, MonitorError> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        let next = self.attempts.lock().unwrap().pop_front();
        match next {
            Some(Some(steps)) => Ok(Box::new(ScriptedSession {
                steps: steps.into(),
                closed: self.closed.clone(),
            })),
            Some(None) => Err(MonitorError::ConnectionError("refused".to_string())),
            None => Err(MonitorError::ConnectionError("script exhausted".to_string())),
        }
    }
}

/// Yield until `condition` holds, failing the test after a while
pub async fn eventually<F: Fn() -> bool>(condition: F) {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::task::yield_now().await;
        }
    })
    .await;
    assert!(waited.is_ok(), "condition not reached in time");
}
