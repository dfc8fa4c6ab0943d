//! Channel Core
//!
//! A channel is one logical bidirectional stream between head unit and phone,
//! identified by a [`ChannelId`]. Every service owns exactly one channel and
//! implements its behavior as a [`ChannelHandler`]; this module supplies the
//! machinery the services share:
//!
//! - [`Channel`]: the handle a service list holds. `start` spawns the lane,
//!   `stop` cancels it, `fill_features` contributes the descriptor.
//! - the lane (see `lane.rs`): a single task that owns the handler, keeps one
//!   receive outstanding and processes inbound messages, registry commands and
//!   periodic ticks strictly one at a time.
//! - [`CommandHandle`]: a non-owning way for the registry to post commands to
//!   a channel's lane. Posting to a channel that is gone is a logged no-op.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──start──> OpenPending ──open handshake──> Open
//!   │                 │                              │
//!   └──stop──┐        └──stop / transport closed─────┴──> Stopped
//!            └──────────────────────────────────────────> Stopped
//! ```
//!
//! `start` on a running channel fails with [`ChannelError::AlreadyStarted`],
//! on a stopped one with [`ChannelError::Stopped`]. `stop` is idempotent.

mod context;
mod error;
mod lane;
mod stats;

pub use context::ChannelContext;
pub use error::{ChannelError, Result};
pub use stats::{ChannelStats, ChannelStatsSnapshot};

use async_trait::async_trait;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::listener::ListenerSlot;
use crate::messenger::Messenger;
use crate::protocol::{ChannelDescriptor, ChannelId, InboundMessage, ServiceDiscoveryResponse};
use lane::Lane;

/// Lifecycle state of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum ChannelState {
    /// Constructed, not started
    Idle,
    /// Started, waiting for the phone's open request
    OpenPending,
    /// Open handshake answered
    Open,
    /// Stopped or transport closed; terminal
    Stopped,
}

impl fmt::Display for ChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::OpenPending => write!(f, "open-pending"),
            Self::Open => write!(f, "open"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}

/// Service-specific behavior of a channel
///
/// All methods run on the channel's lane, one at a time. The open handshake is
/// answered by the lane itself and never reaches the handler.
#[async_trait]
pub trait ChannelHandler: Send + 'static {
    /// Commands the registry may post to this channel
    type Command: Send + fmt::Debug + 'static;

    /// Service name used as log prefix
    const NAME: &'static str;

    /// Channel served by this handler
    fn channel_id(&self) -> ChannelId;

    /// Capability descriptor advertised during service discovery
    fn descriptor(&self) -> ChannelDescriptor;

    /// Hand the handler a way to post commands to its own lane
    fn attach(&mut self, _commands: CommandHandle<Self::Command>) {}

    /// Period of `on_tick`, if the handler wants one
    fn tick_interval(&self) -> Option<Duration> {
        None
    }

    /// Inbound message other than the open handshake
    async fn on_message(&mut self, ctx: &ChannelContext, message: InboundMessage) -> Result<()>;

    /// Command posted through a [`CommandHandle`]
    async fn on_command(&mut self, ctx: &ChannelContext, command: Self::Command) -> Result<()>;

    /// Periodic work
    async fn on_tick(&mut self, _ctx: &ChannelContext) -> Result<()> {
        Ok(())
    }

    /// Lane is ending
    async fn on_stop(&mut self, _ctx: &ChannelContext) {}
}

/// Tunables shared by every channel of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelSettings {
    /// Capacity of each lane's command queue
    pub command_queue_depth: usize,
    /// Upper bound on a single send, `None` waits for the transport
    pub send_timeout: Option<Duration>,
}

impl Default for ChannelSettings {
    fn default() -> Self {
        Self {
            command_queue_depth: 32,
            send_timeout: None,
        }
    }
}

/// Session-wide resources a channel is built from
#[derive(Clone)]
pub struct ChannelEnv {
    /// Runtime lanes are spawned on
    pub runtime: Handle,
    /// Shared transport
    pub messenger: Arc<dyn Messenger>,
    /// Shared status listener reference
    pub listener: ListenerSlot,
    /// Lane tunables
    pub settings: ChannelSettings,
    /// Session the channel belongs to, recorded on lane spans
    pub session: Uuid,
}

/// Non-owning handle for posting commands to a channel's lane
pub struct CommandHandle<C> {
    channel: ChannelId,
    service: &'static str,
    sender: mpsc::WeakSender<C>,
}

impl<C> Clone for CommandHandle<C> {
    fn clone(&self) -> Self {
        Self {
            channel: self.channel,
            service: self.service,
            sender: self.sender.clone(),
        }
    }
}

impl<C> fmt::Debug for CommandHandle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandHandle")
            .field("channel", &self.channel)
            .field("service", &self.service)
            .finish()
    }
}

impl<C: Send + fmt::Debug + 'static> CommandHandle<C> {
    /// Channel the handle points at
    pub fn channel(&self) -> ChannelId {
        self.channel
    }

    /// Post `command`; returns false when it was dropped
    ///
    /// Never blocks. A full queue drops the command with a warning, a channel
    /// that no longer exists drops it silently.
    pub fn dispatch(&self, command: C) -> bool {
        let Some(sender) = self.sender.upgrade() else {
            debug!("[{}] gone, dropping {:?}", self.service, command);
            return false;
        };

        match sender.try_send(command) {
            Ok(()) => true,
            Err(TrySendError::Full(command)) => {
                warn!("[{}] command queue full, dropping {:?}", self.service, command);
                false
            }
            Err(TrySendError::Closed(command)) => {
                debug!("[{}] lane finished, dropping {:?}", self.service, command);
                false
            }
        }
    }
}

/// Object-safe view of a channel used by the service list
pub trait ChannelLifecycle: Send + Sync {
    /// Channel id
    fn channel_id(&self) -> ChannelId;
    /// Service name
    fn name(&self) -> &'static str;
    /// Current lifecycle state
    fn state(&self) -> ChannelState;
    /// Spawn the lane and arm the first receive
    fn start(&self) -> Result<()>;
    /// Cancel the lane; idempotent
    fn stop(&self);
    /// Append this channel's descriptor to `response`
    fn fill_features(&self, response: &mut ServiceDiscoveryResponse);
    /// Channel counters
    fn stats(&self) -> ChannelStatsSnapshot;
    /// Take the lane's join handle once started
    fn take_task(&self) -> Option<JoinHandle<()>>;
}

/// Handle to one service channel
pub struct Channel<H: ChannelHandler> {
    id: ChannelId,
    descriptor: ChannelDescriptor,
    state: Arc<Mutex<ChannelState>>,
    stop: CancellationToken,
    commands: mpsc::Sender<H::Command>,
    stats: Arc<ChannelStats>,
    runtime: Handle,
    span: tracing::Span,
    parked: Mutex<Option<Lane<H>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<H: ChannelHandler> Channel<H> {
    /// Wrap `handler` into an idle channel
    pub fn new(mut handler: H, env: &ChannelEnv) -> Self {
        let id = handler.channel_id();
        let (tx, rx) = mpsc::channel(env.settings.command_queue_depth.max(1));
        handler.attach(CommandHandle {
            channel: id,
            service: H::NAME,
            sender: tx.downgrade(),
        });

        let descriptor = handler.descriptor();
        let ctx = ChannelContext::new(
            id,
            H::NAME,
            env.messenger.clone(),
            env.listener.clone(),
            env.settings.send_timeout,
        );
        let stats = ctx.stats().clone();
        let state = Arc::new(Mutex::new(ChannelState::Idle));
        let stop = CancellationToken::new();

        let span = info_span!("channel", session = %env.session, channel = %id, service = H::NAME);

        Self {
            id,
            descriptor,
            state: state.clone(),
            stop: stop.clone(),
            commands: tx,
            stats,
            runtime: env.runtime.clone(),
            span,
            parked: Mutex::new(Some(Lane {
                handler,
                commands: rx,
                ctx,
                state,
                stop,
            })),
            task: Mutex::new(None),
        }
    }

    /// Handle for posting commands to this channel
    pub fn command_handle(&self) -> CommandHandle<H::Command> {
        CommandHandle {
            channel: self.id,
            service: H::NAME,
            sender: self.commands.downgrade(),
        }
    }

    /// Descriptor computed at construction
    pub fn descriptor(&self) -> &ChannelDescriptor {
        &self.descriptor
    }
}

impl<H: ChannelHandler> ChannelLifecycle for Channel<H> {
    fn channel_id(&self) -> ChannelId {
        self.id
    }

    fn name(&self) -> &'static str {
        H::NAME
    }

    fn state(&self) -> ChannelState {
        *self.state.lock()
    }

    fn start(&self) -> Result<()> {
        let mut state = self.state.lock();
        match *state {
            ChannelState::Idle => {}
            ChannelState::Stopped => {
                warn!("[{}] start after stop refused", H::NAME);
                return Err(ChannelError::Stopped(self.id));
            }
            ChannelState::OpenPending | ChannelState::Open => {
                warn!("[{}] already started", H::NAME);
                return Err(ChannelError::AlreadyStarted(self.id));
            }
        }

        let lane = self
            .parked
            .lock()
            .take()
            .ok_or(ChannelError::AlreadyStarted(self.id))?;
        *state = ChannelState::OpenPending;
        drop(state);

        info!("[{}] start", H::NAME);
        let task = self.runtime.spawn(lane.run().instrument(self.span.clone()));
        *self.task.lock() = Some(task);
        Ok(())
    }

    fn stop(&self) {
        let previous = std::mem::replace(&mut *self.state.lock(), ChannelState::Stopped);
        match previous {
            ChannelState::Stopped => {}
            ChannelState::Idle => {
                info!("[{}] stop", H::NAME);
                self.parked.lock().take();
            }
            ChannelState::OpenPending | ChannelState::Open => {
                info!("[{}] stop", H::NAME);
                self.stop.cancel();
            }
        }
    }

    fn fill_features(&self, response: &mut ServiceDiscoveryResponse) {
        info!("[{}] fill features", H::NAME);
        response.add_channel(self.descriptor.clone());
    }

    fn stats(&self) -> ChannelStatsSnapshot {
        self.stats.snapshot()
    }

    fn take_task(&self) -> Option<JoinHandle<()>> {
        self.task.lock().take()
    }
}

impl<H: ChannelHandler> Drop for Channel<H> {
    fn drop(&mut self) {
        self.stop.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messenger::{LoopbackMessenger, TransportError};
    use crate::protocol::{ChannelOpenRequest, ChannelOpenResponse, ChannelPayload, OutboundMessage, Status};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const WAIT: Duration = Duration::from_secs(2);

    /// Handler that counts callbacks and echoes commands as open responses
    struct Probe {
        seen: Arc<AtomicUsize>,
        stopped: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ChannelHandler for Probe {
        type Command = Status;
        const NAME: &'static str = "ProbeService";

        fn channel_id(&self) -> ChannelId {
            ChannelId::MediaStatus
        }

        fn descriptor(&self) -> ChannelDescriptor {
            ChannelDescriptor::new(ChannelId::MediaStatus, ChannelPayload::MediaInfo)
        }

        async fn on_message(&mut self, ctx: &ChannelContext, message: InboundMessage) -> Result<()> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Err(ctx.unexpected(&message))
        }

        async fn on_command(&mut self, ctx: &ChannelContext, command: Status) -> Result<()> {
            ctx.send(ChannelOpenResponse { status: command }).await
        }

        async fn on_stop(&mut self, _ctx: &ChannelContext) {
            self.stopped.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn setup() -> (Arc<LoopbackMessenger>, Channel<Probe>, Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let messenger = Arc::new(LoopbackMessenger::new());
        let env = ChannelEnv {
            runtime: Handle::current(),
            messenger: messenger.clone(),
            listener: ListenerSlot::new(),
            settings: ChannelSettings::default(),
            session: Uuid::new_v4(),
        };
        let seen = Arc::new(AtomicUsize::new(0));
        let stopped = Arc::new(AtomicUsize::new(0));
        let channel = Channel::new(
            Probe {
                seen: seen.clone(),
                stopped: stopped.clone(),
            },
            &env,
        );
        (messenger, channel, seen, stopped)
    }

    fn open_request() -> ChannelOpenRequest {
        ChannelOpenRequest {
            priority: 0,
            channel_id: ChannelId::MediaStatus.as_u32(),
        }
    }

    #[tokio::test]
    async fn test_start_arms_exactly_one_receive() {
        let (messenger, channel, _, _) = setup();
        assert_eq!(channel.state(), ChannelState::Idle);
        assert_eq!(messenger.pending_receives(ChannelId::MediaStatus), 0);

        channel.start().unwrap();
        assert_eq!(channel.state(), ChannelState::OpenPending);
        assert!(messenger.wait_for_pending_receives(ChannelId::MediaStatus, 1, WAIT).await);

        channel.stop();
        let task = channel.take_task().unwrap();
        task.await.unwrap();
        assert_eq!(messenger.pending_receives(ChannelId::MediaStatus), 0);
    }

    #[tokio::test]
    async fn test_open_handshake() {
        let (messenger, channel, _, _) = setup();
        channel.start().unwrap();

        messenger.deliver(ChannelId::MediaStatus, open_request());
        assert!(messenger.wait_for_sent(ChannelId::MediaStatus, 1, WAIT).await);
        assert_eq!(
            messenger.sent_on(ChannelId::MediaStatus),
            vec![OutboundMessage::from(ChannelOpenResponse { status: Status::Ok })]
        );
        assert!(messenger.wait_for_pending_receives(ChannelId::MediaStatus, 1, WAIT).await);
        assert_eq!(channel.state(), ChannelState::Open);
        channel.stop();
    }

    #[tokio::test]
    async fn test_double_start_and_start_after_stop() {
        let (_, channel, _, _) = setup();
        channel.start().unwrap();
        assert!(matches!(channel.start(), Err(ChannelError::AlreadyStarted(_))));

        channel.stop();
        channel.stop();
        assert_eq!(channel.state(), ChannelState::Stopped);
        assert!(matches!(channel.start(), Err(ChannelError::Stopped(_))));
    }

    #[tokio::test]
    async fn test_stop_before_start() {
        let (messenger, channel, _, stopped) = setup();
        channel.stop();
        assert_eq!(channel.state(), ChannelState::Stopped);
        assert!(channel.take_task().is_none());
        assert_eq!(messenger.pending_receives(ChannelId::MediaStatus), 0);
        assert_eq!(stopped.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_receive_error_rearms() {
        let (messenger, channel, seen, _) = setup();
        channel.start().unwrap();

        messenger.deliver_error(ChannelId::MediaStatus, TransportError::Receive("crc".into()));
        messenger.deliver(ChannelId::MediaStatus, open_request());

        assert!(messenger.wait_for_sent(ChannelId::MediaStatus, 1, WAIT).await);
        assert_eq!(channel.stats().receive_errors, 1);
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        channel.stop();
    }

    #[tokio::test]
    async fn test_transport_close_ends_lane() {
        let (messenger, channel, _, stopped) = setup();
        channel.start().unwrap();
        assert!(messenger.wait_for_pending_receives(ChannelId::MediaStatus, 1, WAIT).await);

        messenger.close();
        channel.take_task().unwrap().await.unwrap();
        assert_eq!(channel.state(), ChannelState::Stopped);
        assert_eq!(stopped.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_commands_run_on_lane() {
        let (messenger, channel, _, _) = setup();
        let handle = channel.command_handle();
        channel.start().unwrap();

        assert!(handle.dispatch(Status::Fail));
        assert!(messenger.wait_for_sent(ChannelId::MediaStatus, 1, WAIT).await);
        assert_eq!(
            messenger.sent_on(ChannelId::MediaStatus),
            vec![OutboundMessage::from(ChannelOpenResponse { status: Status::Fail })]
        );
        assert_eq!(channel.stats().commands, 1);

        channel.stop();
        channel.take_task().unwrap().await.unwrap();
        assert!(!handle.dispatch(Status::Ok));
    }

    #[tokio::test]
    async fn test_dispatch_after_drop_is_noop() {
        let (_, channel, _, _) = setup();
        let handle = channel.command_handle();
        drop(channel);
        assert!(!handle.dispatch(Status::Ok));
    }

    #[tokio::test]
    async fn test_fill_features_appends_descriptor() {
        let (_, channel, _, _) = setup();
        let mut response = ServiceDiscoveryResponse::default();
        channel.fill_features(&mut response);
        assert_eq!(response.channel_ids(), vec![ChannelId::MediaStatus.as_u32()]);
    }
}
