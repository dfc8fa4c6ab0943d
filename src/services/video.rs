//! Video Service
//!
//! Negotiates the projection stream and feeds its frames into the platform
//! video pipeline. The service also tracks which side owns the screen: focus
//! changes are reported to the phone, to the status listener and to the
//! head unit's activity callback.

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, trace, warn};

use crate::channel::{ChannelContext, ChannelError, ChannelHandler, Result};
use crate::platform::{DisplayRect, PlatformError, VideoOutput};
use crate::protocol::av::{
    AvChannelSetupRequest, AvChannelSetupResponse, AvChannelStartIndication,
    AvMediaAckIndication, AvMediaIndication, AvMessage, AvStreamType, VideoConfig,
    VideoFocusIndication, VideoFocusMode, VideoFocusRequest,
};
use crate::protocol::discovery::AvChannel;
use crate::protocol::{ChannelDescriptor, ChannelId, ChannelPayload, InboundMessage, Status};

/// Called with `true` when the projection takes the screen, `false` when it leaves
pub type ActivityCallback = Arc<dyn Fn(bool) + Send + Sync>;

/// Commands the registry posts to the video lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCommand {
    /// Blend the projection with the native UI
    SetOpacity(u8),
    /// Projection moved to a new screen area
    Resize(DisplayRect),
}

/// Handler for the video channel
pub struct VideoService {
    output: Arc<dyn VideoOutput>,
    config: VideoConfig,
    session: Option<i32>,
    output_ready: bool,
    activity: Option<ActivityCallback>,
}

impl fmt::Debug for VideoService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VideoService")
            .field("config", &self.config)
            .field("session", &self.session)
            .field("output_ready", &self.output_ready)
            .finish_non_exhaustive()
    }
}

impl VideoService {
    pub fn new(
        output: Arc<dyn VideoOutput>,
        config: VideoConfig,
        activity: Option<ActivityCallback>,
    ) -> Self {
        Self {
            output,
            config,
            session: None,
            output_ready: false,
            activity,
        }
    }

    fn set_active(&self, active: bool) {
        if let Some(callback) = &self.activity {
            callback(active);
        }
    }

    fn prepare_output(&self) -> std::result::Result<(), PlatformError> {
        self.output.open()?;
        self.output.init()
    }

    async fn on_setup_request(
        &mut self,
        ctx: &ChannelContext,
        request: AvChannelSetupRequest,
    ) -> Result<()> {
        info!(
            "[{}] Setup Request, Config Index: {}",
            Self::NAME,
            request.config_index
        );

        let prepared = self.prepare_output();
        self.output_ready = prepared.is_ok();
        let status = if self.output_ready {
            Status::Ok
        } else {
            Status::Fail
        };
        info!("[{}] Setup Status: {}", Self::NAME, status);

        ctx.send(AvChannelSetupResponse {
            media_status: status,
            max_unacked: 1,
            configs: vec![0],
        })
        .await?;

        match prepared {
            Ok(()) => self.send_focus(ctx, VideoFocusMode::Focused, false).await,
            Err(source) => Err(ChannelError::Platform {
                collaborator: "video output",
                source,
            }),
        }
    }

    async fn send_focus(
        &self,
        ctx: &ChannelContext,
        focus_mode: VideoFocusMode,
        unrequested: bool,
    ) -> Result<()> {
        info!("[{}] Video Focus Indication: {:?}", Self::NAME, focus_mode);
        ctx.send(VideoFocusIndication {
            focus_mode,
            unrequested,
        })
        .await?;
        self.set_active(focus_mode == VideoFocusMode::Focused);
        ctx.notify(|l| l.video_focus_changed(focus_mode));
        Ok(())
    }

    fn on_start_indication(&mut self, indication: AvChannelStartIndication) {
        info!(
            "[{}] Start Indication, Session: {}, Config: {}",
            Self::NAME,
            indication.session,
            indication.config
        );
        self.session = Some(indication.session);
    }

    fn on_stop_indication(&mut self) {
        info!("[{}] Stop Indication", Self::NAME);
        self.session = None;
        self.output_ready = false;
        self.output.stop();
        self.set_active(false);
    }

    async fn on_media(&mut self, ctx: &ChannelContext, media: AvMediaIndication) -> Result<()> {
        if !self.output_ready {
            warn!("[{}] media while the output is not initialised, dropping", Self::NAME);
            return Ok(());
        }
        let Some(session) = self.session else {
            warn!("[{}] media before start indication, dropping", Self::NAME);
            return Ok(());
        };

        trace!(
            timestamp = ?media.timestamp,
            len = media.data.len(),
            "[{}] media",
            Self::NAME
        );
        self.output.write(media.timestamp, &media.data);
        ctx.send(AvMediaAckIndication { session, value: 1 }).await
    }

    async fn on_focus_request(
        &mut self,
        ctx: &ChannelContext,
        request: VideoFocusRequest,
    ) -> Result<()> {
        info!(
            "[{}] Video Focus Request, Display: {}, Mode: {:?}",
            Self::NAME,
            request.disp_index,
            request.focus_mode
        );
        self.send_focus(ctx, request.focus_mode, false).await
    }
}

#[async_trait]
impl ChannelHandler for VideoService {
    type Command = VideoCommand;
    const NAME: &'static str = "VideoService";

    fn channel_id(&self) -> ChannelId {
        ChannelId::Video
    }

    fn descriptor(&self) -> ChannelDescriptor {
        ChannelDescriptor::new(
            ChannelId::Video,
            ChannelPayload::Av(AvChannel {
                stream_type: AvStreamType::Video,
                audio_type: None,
                available_while_in_call: true,
                audio_configs: Vec::new(),
                video_configs: vec![self.config],
            }),
        )
    }

    async fn on_message(&mut self, ctx: &ChannelContext, message: InboundMessage) -> Result<()> {
        match message {
            InboundMessage::Av(AvMessage::SetupRequest(request)) => {
                self.on_setup_request(ctx, request).await
            }
            InboundMessage::Av(AvMessage::StartIndication(indication)) => {
                self.on_start_indication(indication);
                Ok(())
            }
            InboundMessage::Av(AvMessage::StopIndication(_)) => {
                self.on_stop_indication();
                Ok(())
            }
            InboundMessage::Av(AvMessage::Media(media)) => self.on_media(ctx, media).await,
            InboundMessage::Av(AvMessage::VideoFocusRequest(request)) => {
                self.on_focus_request(ctx, request).await
            }
            other => Err(ctx.unexpected(&other)),
        }
    }

    async fn on_command(&mut self, _ctx: &ChannelContext, command: VideoCommand) -> Result<()> {
        match command {
            VideoCommand::SetOpacity(alpha) => {
                debug!("[{}] opacity: {}", Self::NAME, alpha);
                self.output.set_opacity(alpha);
            }
            VideoCommand::Resize(area) => {
                debug!("[{}] resize: {}", Self::NAME, area);
                self.output.resize(area);
            }
        }
        Ok(())
    }

    async fn on_stop(&mut self, _ctx: &ChannelContext) {
        self.output_ready = false;
        if self.session.take().is_some() {
            self.output.stop();
        }
    }
}
