//! In-memory loopback transport
//!
//! Inbound messages are queued per channel with [`LoopbackMessenger::deliver`];
//! outbound messages are recorded and can be inspected or awaited. The
//! messenger also keeps the bookkeeping needed to observe the channel
//! contract from outside: outstanding receive registrations and concurrent
//! sends per channel.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tracing::trace;

use super::{Messenger, TransportError};
use crate::protocol::{ChannelId, InboundMessage, OutboundMessage};

type InboundItem = Result<InboundMessage, TransportError>;

/// Outbound message captured by the loopback transport
#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub channel: ChannelId,
    pub message: OutboundMessage,
}

struct Inbox {
    tx: Option<mpsc::UnboundedSender<InboundItem>>,
    queue: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<InboundItem>>>,
    pending: Arc<AtomicUsize>,
}

impl Inbox {
    /// A closed inbox has no sender, so its first receive yields `None`
    fn new(closed: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx: (!closed).then_some(tx),
            queue: Arc::new(tokio::sync::Mutex::new(rx)),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[derive(Default)]
struct SendCounters {
    in_flight: usize,
    max_in_flight: usize,
}

/// Decrements a shared counter when dropped
struct CountGuard(Arc<AtomicUsize>);

impl Drop for CountGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// In-memory [`Messenger`]
#[derive(Default)]
pub struct LoopbackMessenger {
    inboxes: Mutex<HashMap<ChannelId, Inbox>>,
    sent: Mutex<Vec<SentMessage>>,
    sent_notify: Notify,
    send_failures: Mutex<HashMap<ChannelId, VecDeque<TransportError>>>,
    send_counters: Mutex<HashMap<ChannelId, SendCounters>>,
    send_delay: Mutex<Option<Duration>>,
    closed: AtomicBool,
}

impl LoopbackMessenger {
    /// Create an open loopback transport
    pub fn new() -> Self {
        Self::default()
    }

    fn with_inbox<R>(&self, channel: ChannelId, f: impl FnOnce(&mut Inbox) -> R) -> R {
        let mut inboxes = self.inboxes.lock();
        let closed = self.closed.load(Ordering::SeqCst);
        f(inboxes.entry(channel).or_insert_with(|| Inbox::new(closed)))
    }

    /// Queue a message for `channel`; returns false once the transport is closed
    pub fn deliver(&self, channel: ChannelId, message: impl Into<InboundMessage>) -> bool {
        self.push_inbound(channel, Ok(message.into()))
    }

    /// Make the next receive on `channel` fail with `error`
    pub fn deliver_error(&self, channel: ChannelId, error: TransportError) -> bool {
        self.push_inbound(channel, Err(error))
    }

    fn push_inbound(&self, channel: ChannelId, item: InboundItem) -> bool {
        self.with_inbox(channel, |inbox| match &inbox.tx {
            Some(tx) => tx.send(item).is_ok(),
            None => false,
        })
    }

    /// Make the next send on `channel` fail with `error`
    pub fn fail_next_send(&self, channel: ChannelId, error: TransportError) {
        self.send_failures
            .lock()
            .entry(channel)
            .or_default()
            .push_back(error);
    }

    /// Hold every send for `delay` before completing it
    pub fn set_send_delay(&self, delay: Option<Duration>) {
        *self.send_delay.lock() = delay;
    }

    /// Tear the transport down: queued messages are still drained, then
    /// every receive resolves with [`TransportError::Closed`]
    pub fn close(&self) {
        let mut inboxes = self.inboxes.lock();
        self.closed.store(true, Ordering::SeqCst);
        for inbox in inboxes.values_mut() {
            inbox.tx = None;
        }
    }

    /// Number of receive registrations currently outstanding on `channel`
    pub fn pending_receives(&self, channel: ChannelId) -> usize {
        self.inboxes
            .lock()
            .get(&channel)
            .map(|inbox| inbox.pending.load(Ordering::SeqCst))
            .unwrap_or(0)
    }

    /// Highest number of sends ever in flight at once on `channel`
    pub fn max_concurrent_sends(&self, channel: ChannelId) -> usize {
        self.send_counters
            .lock()
            .get(&channel)
            .map(|c| c.max_in_flight)
            .unwrap_or(0)
    }

    /// Every message sent so far, in completion order
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().clone()
    }

    /// Messages sent on `channel`, in completion order
    pub fn sent_on(&self, channel: ChannelId) -> Vec<OutboundMessage> {
        self.sent
            .lock()
            .iter()
            .filter(|s| s.channel == channel)
            .map(|s| s.message.clone())
            .collect()
    }

    /// Wait until at least `count` messages were sent on `channel`
    pub async fn wait_for_sent(&self, channel: ChannelId, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.sent_notify.notified();
                if self.sent_on(channel).len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }

    /// Wait until exactly `expected` receives are outstanding on `channel`
    pub async fn wait_for_pending_receives(
        &self,
        channel: ChannelId,
        expected: usize,
        timeout: Duration,
    ) -> bool {
        tokio::time::timeout(timeout, async {
            while self.pending_receives(channel) != expected {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .is_ok()
    }

    fn begin_send(&self, channel: ChannelId) {
        let mut counters = self.send_counters.lock();
        let entry = counters.entry(channel).or_default();
        entry.in_flight += 1;
        entry.max_in_flight = entry.max_in_flight.max(entry.in_flight);
    }

    fn end_send(&self, channel: ChannelId) {
        if let Some(entry) = self.send_counters.lock().get_mut(&channel) {
            entry.in_flight = entry.in_flight.saturating_sub(1);
        }
    }
}

#[async_trait]
impl Messenger for LoopbackMessenger {
    async fn receive(&self, channel: ChannelId) -> Result<InboundMessage, TransportError> {
        let (queue, pending) = self.with_inbox(channel, |inbox| {
            (inbox.queue.clone(), inbox.pending.clone())
        });

        pending.fetch_add(1, Ordering::SeqCst);
        let _registration = CountGuard(pending);

        let mut queue = queue.lock().await;
        match queue.recv().await {
            Some(item) => {
                trace!(%channel, "loopback delivered inbound item");
                item
            }
            None => Err(TransportError::Closed),
        }
    }

    async fn send(
        &self,
        channel: ChannelId,
        message: OutboundMessage,
    ) -> Result<(), TransportError> {
        self.begin_send(channel);

        let delay = *self.send_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self
            .send_failures
            .lock()
            .get_mut(&channel)
            .and_then(|queue| queue.pop_front());

        self.end_send(channel);

        if self.closed.load(Ordering::SeqCst) {
            return Err(TransportError::Closed);
        }
        if let Some(error) = failure {
            return Err(error);
        }

        trace!(%channel, kind = message.kind(), "loopback recorded outbound message");
        self.sent.lock().push(SentMessage { channel, message });
        self.sent_notify.notify_waiters();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{ChannelOpenRequest, ChannelOpenResponse, Status};

    #[tokio::test]
    async fn test_deliver_then_receive() {
        let messenger = LoopbackMessenger::new();
        let request = ChannelOpenRequest {
            priority: 5,
            channel_id: ChannelId::Navigation.as_u32(),
        };
        assert!(messenger.deliver(ChannelId::Navigation, request));

        let received = messenger.receive(ChannelId::Navigation).await.unwrap();
        assert_eq!(received, InboundMessage::ChannelOpenRequest(request));
        assert_eq!(messenger.pending_receives(ChannelId::Navigation), 0);
    }

    #[tokio::test]
    async fn test_close_ends_receive() {
        let messenger = LoopbackMessenger::new();
        messenger.close();
        let result = tokio::time::timeout(Duration::from_secs(1), messenger.receive(ChannelId::Sensor))
            .await
            .unwrap();
        assert_eq!(result, Err(TransportError::Closed));
        assert!(!messenger.deliver(
            ChannelId::Sensor,
            ChannelOpenRequest {
                priority: 0,
                channel_id: 2
            }
        ));
    }

    #[tokio::test]
    async fn test_close_drains_then_ends_existing_inbox() {
        let messenger = LoopbackMessenger::new();
        let request = ChannelOpenRequest {
            priority: 1,
            channel_id: ChannelId::Video.as_u32(),
        };
        assert!(messenger.deliver(ChannelId::Video, request));
        messenger.close();

        let first = tokio::time::timeout(Duration::from_secs(1), messenger.receive(ChannelId::Video))
            .await
            .unwrap();
        assert_eq!(first, Ok(InboundMessage::ChannelOpenRequest(request)));
        let second = tokio::time::timeout(Duration::from_secs(1), messenger.receive(ChannelId::Video))
            .await
            .unwrap();
        assert_eq!(second, Err(TransportError::Closed));
    }

    #[tokio::test]
    async fn test_scripted_send_failure() {
        let messenger = LoopbackMessenger::new();
        messenger.fail_next_send(ChannelId::Video, TransportError::Send("usb stall".into()));

        let response = OutboundMessage::from(ChannelOpenResponse { status: Status::Ok });
        let first = messenger.send(ChannelId::Video, response.clone()).await;
        assert!(matches!(first, Err(TransportError::Send(_))));

        messenger.send(ChannelId::Video, response.clone()).await.unwrap();
        assert_eq!(messenger.sent_on(ChannelId::Video), vec![response]);
        assert_eq!(messenger.max_concurrent_sends(ChannelId::Video), 1);
    }

    #[tokio::test]
    async fn test_pending_receive_is_tracked() {
        let messenger = Arc::new(LoopbackMessenger::new());
        let waiter = {
            let messenger = messenger.clone();
            tokio::spawn(async move { messenger.receive(ChannelId::Input).await })
        };

        assert!(
            messenger
                .wait_for_pending_receives(ChannelId::Input, 1, Duration::from_secs(1))
                .await
        );
        waiter.abort();
        let _ = waiter.await;
        assert_eq!(messenger.pending_receives(ChannelId::Input), 0);
    }
}
