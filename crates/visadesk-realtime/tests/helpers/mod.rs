//! Shared fakes for the realtime integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::{Notify, mpsc};
use tokio::time::Instant;

use visadesk_client::{ApiError, ApiResult, NotificationApi};
use visadesk_core::types::id::NotificationId;
use visadesk_core::types::pagination::{PageRequest, PageResponse};
use visadesk_entity::{DeliveryPreferences, Notification, NotificationCategory};
use visadesk_realtime::message::types::RawPushEvent;
use visadesk_realtime::{
    AlertChannels, AlertSink, MemoryPreferenceStore, NotificationStore, PushChannel, PushFrame,
    PushTransport, SessionIdentity, TransportError,
};

pub fn note(id: &str) -> Notification {
    Notification::new(id, format!("message {id}"), NotificationCategory::General)
}

/// A notification created `secs` seconds after a fixed epoch, so listings
/// sort deterministically.
pub fn dated(id: &str, secs: i64) -> Notification {
    let mut n = note(id);
    n.created_at = chrono::DateTime::from_timestamp(1_760_000_000 + secs, 0).unwrap();
    n
}

pub fn read_note(id: &str) -> Notification {
    let mut n = note(id);
    n.is_read = true;
    n
}

pub fn store() -> Arc<NotificationStore> {
    Arc::new(NotificationStore::new(
        Arc::new(MemoryPreferenceStore::new()),
        DeliveryPreferences::default(),
        64,
    ))
}

pub fn identity() -> SessionIdentity {
    SessionIdentity::new("user-1", "token-1")
}

type Frame = Result<PushFrame, TransportError>;

/// Test side of a scripted push channel.
#[derive(Debug, Clone)]
pub struct ChannelHandle {
    frames: mpsc::UnboundedSender<Frame>,
    keepalives: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

impl ChannelHandle {
    pub fn push(&self, event: RawPushEvent) {
        let _ = self.frames.send(Ok(PushFrame::Event(event)));
    }

    pub fn keepalive(&self) {
        let _ = self.frames.send(Ok(PushFrame::Keepalive));
    }

    pub fn invalid(&self, reason: &str) {
        let _ = self.frames.send(Ok(PushFrame::Invalid(reason.to_string())));
    }

    pub fn fail(&self, err: TransportError) {
        let _ = self.frames.send(Err(err));
    }

    pub fn keepalives_sent(&self) -> usize {
        self.keepalives.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct ScriptedChannel {
    frames: mpsc::UnboundedReceiver<Frame>,
    keepalives: Arc<AtomicUsize>,
    closed: Arc<AtomicBool>,
}

#[async_trait]
impl PushChannel for ScriptedChannel {
    async fn next_frame(&mut self) -> Option<Frame> {
        self.frames.recv().await
    }

    async fn send_keepalive(&mut self) -> Result<(), TransportError> {
        self.keepalives.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

enum Step {
    Fail(TransportError),
    Open(ScriptedChannel),
}

/// Transport that plays back a script of handshake outcomes. Once the script
/// is exhausted every handshake fails.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Step>>,
    attempts: Mutex<Vec<Instant>>,
}

impl std::fmt::Debug for ScriptedTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedTransport")
            .field("attempts", &self.attempt_count())
            .finish()
    }
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_next(&self, times: usize) {
        let mut script = self.script.lock().unwrap();
        for _ in 0..times {
            script.push_back(Step::Fail(TransportError::Handshake("refused".into())));
        }
    }

    /// Queue a successful handshake and return the handle feeding it.
    pub fn open_next(&self) -> ChannelHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        let keepalives = Arc::new(AtomicUsize::new(0));
        let closed = Arc::new(AtomicBool::new(false));
        self.script.lock().unwrap().push_back(Step::Open(ScriptedChannel {
            frames: rx,
            keepalives: keepalives.clone(),
            closed: closed.clone(),
        }));
        ChannelHandle {
            frames: tx,
            keepalives,
            closed,
        }
    }

    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts.lock().unwrap().clone()
    }

    pub fn attempt_count(&self) -> usize {
        self.attempts.lock().unwrap().len()
    }
}

#[async_trait]
impl PushTransport for ScriptedTransport {
    async fn open(&self, _identity: &SessionIdentity) -> Result<Box<dyn PushChannel>, TransportError> {
        self.attempts.lock().unwrap().push(Instant::now());
        let step = self.script.lock().unwrap().pop_front();
        match step {
            Some(Step::Open(channel)) => Ok(Box::new(channel)),
            Some(Step::Fail(err)) => Err(err),
            None => Err(TransportError::Handshake("script exhausted".into())),
        }
    }
}

/// In-memory REST surface.
#[derive(Debug, Default)]
pub struct MockApi {
    items: Mutex<Vec<Notification>>,
    list_error: Mutex<Option<ApiError>>,
    mutation_error: Mutex<Option<ApiError>>,
    pages: Mutex<Option<Vec<PageResponse<Notification>>>>,
    gate: Mutex<Option<Arc<Notify>>>,
    list_calls: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl MockApi {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_items(items: Vec<Notification>) -> Arc<Self> {
        let api = Self::new();
        api.set_items(items);
        api
    }

    /// Server listing, newest first.
    pub fn set_items(&self, items: Vec<Notification>) {
        *self.items.lock().unwrap() = items;
    }

    pub fn fail_lists(&self, err: Option<ApiError>) {
        *self.list_error.lock().unwrap() = err;
    }

    pub fn fail_mutations(&self, err: Option<ApiError>) {
        *self.mutation_error.lock().unwrap() = err;
    }

    /// Serve these pages verbatim instead of the full listing. Requests past
    /// the last page fail with a network error.
    pub fn serve_pages(&self, pages: Vec<PageResponse<Notification>>) {
        *self.pages.lock().unwrap() = Some(pages);
    }

    /// Hold every mutation after it is recorded until the returned handle
    /// is notified.
    pub fn gate_mutations(&self) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        *self.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn mutation(&self, call: String) -> ApiResult<()> {
        self.calls.lock().unwrap().push(call);
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        match self.mutation_error.lock().unwrap().clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl NotificationApi for MockApi {
    async fn list(&self, page: PageRequest) -> ApiResult<PageResponse<Notification>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(err) = self.list_error.lock().unwrap().clone() {
            return Err(err);
        }
        if let Some(pages) = self.pages.lock().unwrap().as_ref() {
            let index = usize::try_from(page.page.saturating_sub(1)).unwrap_or(usize::MAX);
            return pages
                .get(index)
                .cloned()
                .ok_or_else(|| ApiError::Network(format!("page {} unavailable", page.page)));
        }
        Ok(PageResponse::complete(self.items.lock().unwrap().clone()))
    }

    async fn mark_read(&self, id: &NotificationId, is_read: bool) -> ApiResult<Option<Notification>> {
        self.mutation(format!("mark_read {id} {is_read}")).await?;
        let mut items = self.items.lock().unwrap();
        Ok(items.iter_mut().find(|n| &n.id == id).map(|n| {
            n.is_read = is_read;
            n.clone()
        }))
    }

    async fn mark_all_read(&self) -> ApiResult<Option<u64>> {
        self.mutation("mark_all_read".to_string()).await?;
        let mut items = self.items.lock().unwrap();
        let mut updated = 0;
        for n in items.iter_mut().filter(|n| !n.is_read) {
            n.is_read = true;
            updated += 1;
        }
        Ok(Some(updated))
    }

    async fn delete(&self, id: &NotificationId) -> ApiResult<()> {
        self.mutation(format!("delete {id}")).await?;
        self.items.lock().unwrap().retain(|n| &n.id != id);
        Ok(())
    }
}

/// Alert sink recording every delivery.
#[derive(Debug, Default)]
pub struct RecordingAlertSink {
    delivered: Mutex<Vec<(NotificationId, AlertChannels)>>,
}

impl RecordingAlertSink {
    pub fn delivered(&self) -> Vec<(NotificationId, AlertChannels)> {
        self.delivered.lock().unwrap().clone()
    }
}

impl AlertSink for RecordingAlertSink {
    fn deliver(&self, notification: &Notification, channels: AlertChannels) {
        self.delivered
            .lock()
            .unwrap()
            .push((notification.id.clone(), channels));
    }
}
