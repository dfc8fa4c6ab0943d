//! Channel lane
//!
//! Each started channel runs exactly one lane task. The lane owns the handler
//! and is the only place handler code executes, which gives every channel a
//! serial execution context without locks around handler state.
//!
//! # Event Sources
//!
//! ```text
//! stop token ─────────┐
//! command queue ──────┤  biased select   ┌─> handler.on_command
//! tick interval ──────┼─────────────────>├─> handler.on_tick
//! pending receive ────┘                  └─> open handshake / handler.on_message
//!                                                  │
//!                                          re-arm the receive
//! ```
//!
//! The receive future is created once, kept pinned across iterations and only
//! replaced after its message has been handled, so exactly one receive is
//! outstanding while the lane runs.

use parking_lot::Mutex;
use std::future::pending;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::context::ChannelContext;
use super::error::ChannelError;
use super::{ChannelHandler, ChannelState};
use crate::messenger::TransportError;
use crate::protocol::{ChannelOpenResponse, InboundMessage, Status};

/// Everything a lane needs, parked in the channel until `start`
pub(super) struct Lane<H: ChannelHandler> {
    pub(super) handler: H,
    pub(super) commands: mpsc::Receiver<H::Command>,
    pub(super) ctx: ChannelContext,
    pub(super) state: Arc<Mutex<ChannelState>>,
    pub(super) stop: CancellationToken,
}

impl<H: ChannelHandler> Lane<H> {
    pub(super) async fn run(self) {
        let Lane {
            mut handler,
            mut commands,
            ctx,
            state,
            stop,
        } = self;

        let messenger = ctx.messenger();
        let channel = ctx.channel();
        let mut ticker = handler.tick_interval().map(|period| {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            ticker
        });

        let mut receive = messenger.receive(channel);
        debug!("[{}] receive armed", ctx.service());

        loop {
            tokio::select! {
                biased;

                _ = stop.cancelled() => {
                    debug!("[{}] stop requested", ctx.service());
                    break;
                }

                command = commands.recv() => match command {
                    Some(command) => {
                        ctx.stats().record_command();
                        trace!(?command, "[{}] command", ctx.service());
                        if let Err(e) = handler.on_command(&ctx, command).await {
                            report(&ctx, &e);
                        }
                    }
                    None => {
                        debug!("[{}] channel handle dropped", ctx.service());
                        break;
                    }
                },

                _ = next_tick(&mut ticker) => {
                    if let Err(e) = handler.on_tick(&ctx).await {
                        report(&ctx, &e);
                    }
                }

                inbound = &mut receive => {
                    match inbound {
                        Ok(message) => {
                            ctx.stats().record_received();
                            dispatch(&mut handler, &ctx, &state, message).await;
                        }
                        Err(TransportError::Closed) => {
                            warn!("[{}] transport closed, no longer listening", ctx.service());
                            break;
                        }
                        Err(e) => {
                            ctx.stats().record_receive_error();
                            error!("[{}] channel error: {}", ctx.service(), e);
                        }
                    }
                    receive = messenger.receive(channel);
                }
            }
        }

        drop(receive);
        handler.on_stop(&ctx).await;
        *state.lock() = ChannelState::Stopped;
        info!("[{}] lane finished", ctx.service());
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending::<()>().await,
    }
}

async fn dispatch<H: ChannelHandler>(
    handler: &mut H,
    ctx: &ChannelContext,
    state: &Mutex<ChannelState>,
    message: InboundMessage,
) {
    match message {
        InboundMessage::ChannelOpenRequest(request) => {
            info!(
                "[{}] open request, priority: {}",
                ctx.service(),
                request.priority
            );
            if request.channel_id != ctx.channel().as_u32() {
                warn!(
                    "[{}] open request names channel {}, answering on {}",
                    ctx.service(),
                    request.channel_id,
                    ctx.channel()
                );
            }

            let status = Status::Ok;
            info!("[{}] open status: {}", ctx.service(), status);
            match ctx.send(ChannelOpenResponse { status }).await {
                Ok(()) => {
                    let mut state = state.lock();
                    if *state == ChannelState::OpenPending {
                        *state = ChannelState::Open;
                    }
                }
                Err(e) => report(ctx, &e),
            }
        }
        message => {
            trace!(kind = message.kind(), "[{}] dispatching", ctx.service());
            if let Err(e) = handler.on_message(ctx, message).await {
                report(ctx, &e);
            }
        }
    }
}

fn report(ctx: &ChannelContext, err: &ChannelError) {
    if err.is_unexpected_message() {
        warn!("[{}] dropping message: {}", ctx.service(), err);
    } else {
        error!("[{}] channel error: {}", ctx.service(), err);
    }
}
