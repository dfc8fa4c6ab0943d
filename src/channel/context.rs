//! Execution context handed to channel handlers
//!
//! A [`ChannelContext`] is the only way a handler talks to the outside world:
//! it sends on the handler's own channel, and it reaches the session's status
//! listener. Because a handler only ever runs on its lane, every send issued
//! through the context is serialized with the channel's other work.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

use super::error::{ChannelError, Result};
use super::stats::ChannelStats;
use crate::listener::{ListenerSlot, StatusListener};
use crate::messenger::Messenger;
use crate::protocol::{ChannelId, InboundMessage, OutboundMessage};

/// Handler-facing view of a running channel
pub struct ChannelContext {
    channel: ChannelId,
    service: &'static str,
    messenger: Arc<dyn Messenger>,
    listener: ListenerSlot,
    stats: Arc<ChannelStats>,
    send_timeout: Option<Duration>,
}

impl ChannelContext {
    /// Build a context for `service` running on `channel`
    pub fn new(
        channel: ChannelId,
        service: &'static str,
        messenger: Arc<dyn Messenger>,
        listener: ListenerSlot,
        send_timeout: Option<Duration>,
    ) -> Self {
        Self {
            channel,
            service,
            messenger,
            listener,
            stats: Arc::new(ChannelStats::default()),
            send_timeout,
        }
    }

    /// Channel this context is bound to
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Name of the service owning the channel
    pub fn service(&self) -> &'static str {
        self.service
    }

    pub(crate) fn messenger(&self) -> Arc<dyn Messenger> {
        self.messenger.clone()
    }

    pub(crate) fn stats(&self) -> &Arc<ChannelStats> {
        &self.stats
    }

    /// Send `message` on this channel and wait for the transport to finish
    pub async fn send(&self, message: impl Into<OutboundMessage>) -> Result<()> {
        let message = message.into();
        trace!(channel = %self.channel, kind = message.kind(), "sending");

        let send = self.messenger.send(self.channel, message);
        let outcome = match self.send_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, send).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    self.stats.record_send_failure();
                    return Err(ChannelError::SendTimeout {
                        channel: self.channel,
                        timeout,
                    });
                }
            },
            None => send.await,
        };

        match outcome {
            Ok(()) => {
                self.stats.record_sent();
                Ok(())
            }
            Err(source) => {
                self.stats.record_send_failure();
                Err(ChannelError::Transport {
                    channel: self.channel,
                    source,
                })
            }
        }
    }

    /// Forward an update to the bound listener
    ///
    /// Returns false when no listener is bound and the update was dropped.
    pub fn notify(&self, deliver: impl FnOnce(&dyn StatusListener)) -> bool {
        match self.listener.current() {
            Some(listener) => {
                deliver(listener.as_ref());
                true
            }
            None => {
                self.stats.record_dropped_notification();
                debug!("[{}] no status listener bound, update dropped", self.service);
                false
            }
        }
    }

    /// Error for a message outside this channel's vocabulary
    pub fn unexpected(&self, message: &InboundMessage) -> ChannelError {
        ChannelError::UnexpectedMessage {
            channel: self.channel,
            kind: message.kind(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::MockStatusListener;
    use crate::messenger::{LoopbackMessenger, TransportError};
    use crate::protocol::media::{MediaPlaybackStatus, PlaybackState};
    use crate::protocol::{ChannelOpenResponse, Status};

    fn context(messenger: Arc<LoopbackMessenger>, timeout: Option<Duration>) -> ChannelContext {
        ChannelContext::new(
            ChannelId::MediaStatus,
            "MediaStatusService",
            messenger,
            ListenerSlot::new(),
            timeout,
        )
    }

    #[tokio::test]
    async fn test_send_records_stats() {
        let messenger = Arc::new(LoopbackMessenger::new());
        let ctx = context(messenger.clone(), None);

        ctx.send(ChannelOpenResponse { status: Status::Ok })
            .await
            .unwrap();
        messenger.fail_next_send(ChannelId::MediaStatus, TransportError::Send("eof".into()));
        let err = ctx
            .send(ChannelOpenResponse { status: Status::Ok })
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::Transport { .. }));

        let stats = ctx.stats().snapshot();
        assert_eq!(stats.sent, 1);
        assert_eq!(stats.send_failures, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_timeout() {
        let messenger = Arc::new(LoopbackMessenger::new());
        messenger.set_send_delay(Some(Duration::from_secs(5)));
        let ctx = context(messenger, Some(Duration::from_millis(100)));

        let err = ctx
            .send(ChannelOpenResponse { status: Status::Ok })
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::SendTimeout { .. }));
    }

    #[test]
    fn test_notify_without_listener_is_dropped() {
        let messenger = Arc::new(LoopbackMessenger::new());
        let ctx = context(messenger, None);
        assert!(!ctx.notify(|_| unreachable!()));
        assert_eq!(ctx.stats().snapshot().dropped_notifications, 1);
    }

    #[test]
    fn test_notify_reaches_bound_listener() {
        let messenger = Arc::new(LoopbackMessenger::new());
        let ctx = context(messenger, None);

        let mut mock = MockStatusListener::new();
        mock.expect_media_playback_update()
            .withf(|s| s.state == PlaybackState::Playing)
            .times(1)
            .return_const(());
        ctx.listener.bind(Some(Arc::new(mock)));

        let status = MediaPlaybackStatus {
            state: PlaybackState::Playing,
            media_source: "Radio".into(),
            track_progress_seconds: 3,
            shuffle: false,
            repeat: false,
            repeat_one: false,
        };
        assert!(ctx.notify(|l| l.media_playback_update(&status)));
    }
}
