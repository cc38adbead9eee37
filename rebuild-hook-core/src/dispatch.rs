//! In-process routing of content events to handlers.
//!
//! [`EventBus`] is a plain map from [`ContentEvent`] to subscribed handlers.
//! [`Dispatcher`] puts a bounded queue and a background task in front of a
//! bus, so the thread raising the event never waits on the network.

use futures::future::join_all;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::contract::{NotificationHandler, TriggerOutcome};
use crate::event::{ContentEvent, ContentNotification};

pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

#[derive(Default)]
pub struct EventBus {
    handlers: HashMap<ContentEvent, Vec<Arc<dyn NotificationHandler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(
        &mut self,
        event: ContentEvent,
        handler: Arc<dyn NotificationHandler>,
    ) -> &mut Self {
        self.handlers.entry(event).or_default().push(handler);
        self
    }

    /// Registers `handler` for every content event.
    pub fn subscribe_all(&mut self, handler: Arc<dyn NotificationHandler>) -> &mut Self {
        for event in ContentEvent::ALL {
            self.subscribe(event, Arc::clone(&handler));
        }
        self
    }

    pub fn handlers_for(&self, event: ContentEvent) -> usize {
        self.handlers.get(&event).map_or(0, Vec::len)
    }

    /// Runs every handler subscribed to the notification's event and returns
    /// their outcomes in subscription order.
    pub async fn publish(&self, notification: &ContentNotification) -> Vec<TriggerOutcome> {
        let Some(handlers) = self.handlers.get(&notification.event) else {
            debug!(event = %notification.event, "No handlers subscribed, ignoring");
            return Vec::new();
        };
        join_all(handlers.iter().map(|h| h.handle(notification))).await
    }
}

/// Totals for everything a [`Dispatcher`] processed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchReport {
    pub processed: usize,
    pub triggered: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl DispatchReport {
    fn record(&mut self, outcomes: &[TriggerOutcome]) {
        self.processed += 1;
        for outcome in outcomes {
            match outcome {
                TriggerOutcome::Triggered { .. } => self.triggered += 1,
                TriggerOutcome::Skipped { .. } => self.skipped += 1,
                TriggerOutcome::Failed { .. } => self.failed += 1,
            }
        }
    }
}

#[derive(Debug)]
pub enum DispatchError {
    /// The queue is at capacity; the notification is handed back.
    QueueFull(ContentNotification),
    /// The worker is gone; the notification is handed back.
    Closed(ContentNotification),
    WorkerPanicked(String),
}

impl fmt::Display for DispatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DispatchError::QueueFull(n) => write!(f, "dispatch queue full, dropped {} event", n.event),
            DispatchError::Closed(n) => write!(f, "dispatcher closed, dropped {} event", n.event),
            DispatchError::WorkerPanicked(msg) => write!(f, "dispatch worker panicked: {msg}"),
        }
    }
}

impl std::error::Error for DispatchError {}

pub struct Dispatcher {
    sender: mpsc::Sender<ContentNotification>,
    worker: JoinHandle<DispatchReport>,
}

impl Dispatcher {
    /// Moves `bus` onto a background task fed by a queue of `capacity` events.
    /// Must be called from within a tokio runtime.
    pub fn spawn(bus: EventBus, capacity: usize) -> Self {
        let (sender, mut receiver) = mpsc::channel::<ContentNotification>(capacity.max(1));
        let worker = tokio::spawn(async move {
            let mut report = DispatchReport::default();
            while let Some(notification) = receiver.recv().await {
                let outcomes = bus.publish(&notification).await;
                report.record(&outcomes);
            }
            info!(
                processed = report.processed,
                triggered = report.triggered,
                skipped = report.skipped,
                failed = report.failed,
                "Dispatcher drained"
            );
            report
        });
        Self { sender, worker }
    }

    /// Queues without waiting. Fails straight away when the queue is full.
    pub fn enqueue(&self, notification: ContentNotification) -> Result<(), DispatchError> {
        self.sender.try_send(notification).map_err(|e| match e {
            mpsc::error::TrySendError::Full(n) => {
                warn!(event = %n.event, "Dispatch queue full, dropping event");
                DispatchError::QueueFull(n)
            }
            mpsc::error::TrySendError::Closed(n) => DispatchError::Closed(n),
        })
    }

    /// Queues, waiting for room if the queue is full.
    pub async fn send(&self, notification: ContentNotification) -> Result<(), DispatchError> {
        self.sender
            .send(notification)
            .await
            .map_err(|e| DispatchError::Closed(e.0))
    }

    /// True once the worker has stopped receiving, e.g. after a handler
    /// panicked. Further sends hand the event back as [`DispatchError::Closed`].
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Stops accepting events, processes what is already queued, and
    /// returns the totals.
    pub async fn shutdown(self) -> Result<DispatchReport, DispatchError> {
        drop(self.sender);
        self.worker.await.map_err(|e| {
            error!(error = ?e, "Dispatch worker did not finish cleanly");
            DispatchError::WorkerPanicked(e.to_string())
        })
    }
}
