//! Audio Service
//!
//! One instance per audio output channel (media, speech, system). The stream
//! negotiation mirrors the video channel; frames go to the platform audio sink.

use async_trait::async_trait;
use std::convert::Infallible;
use std::fmt;
use std::sync::Arc;
use tracing::{info, trace, warn};

use crate::channel::{ChannelContext, ChannelError, ChannelHandler, Result};
use crate::platform::AudioOutput;
use crate::protocol::av::{
    AudioConfig, AudioType, AvChannelSetupRequest, AvChannelSetupResponse,
    AvChannelStartIndication, AvMediaAckIndication, AvMediaIndication, AvMessage, AvStreamType,
};
use crate::protocol::discovery::AvChannel;
use crate::protocol::{ChannelDescriptor, ChannelId, ChannelPayload, InboundMessage, Status};

/// Handler for one audio output channel
pub struct AudioService {
    channel: ChannelId,
    audio_type: AudioType,
    config: AudioConfig,
    output: Arc<dyn AudioOutput>,
    session: Option<i32>,
    output_ready: bool,
}

impl fmt::Debug for AudioService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioService")
            .field("channel", &self.channel)
            .field("audio_type", &self.audio_type)
            .field("config", &self.config)
            .field("session", &self.session)
            .field("output_ready", &self.output_ready)
            .finish_non_exhaustive()
    }
}

impl AudioService {
    /// Music and other long-form playback, 48 kHz stereo
    pub fn media(output: Arc<dyn AudioOutput>) -> Self {
        Self::new(ChannelId::MediaAudio, AudioType::Media, 48_000, 2, output)
    }

    /// Assistant and navigation prompts, 16 kHz mono
    pub fn speech(output: Arc<dyn AudioOutput>) -> Self {
        Self::new(ChannelId::SpeechAudio, AudioType::Speech, 16_000, 1, output)
    }

    /// System sounds, 16 kHz mono
    pub fn system(output: Arc<dyn AudioOutput>) -> Self {
        Self::new(ChannelId::SystemAudio, AudioType::System, 16_000, 1, output)
    }

    fn new(
        channel: ChannelId,
        audio_type: AudioType,
        sample_rate: u32,
        channel_count: u32,
        output: Arc<dyn AudioOutput>,
    ) -> Self {
        Self {
            channel,
            audio_type,
            config: AudioConfig {
                sample_rate,
                bit_depth: 16,
                channel_count,
            },
            output,
            session: None,
            output_ready: false,
        }
    }

    async fn on_setup_request(
        &mut self,
        ctx: &ChannelContext,
        request: AvChannelSetupRequest,
    ) -> Result<()> {
        info!(
            "[{}] {} Setup Request, Config Index: {}",
            Self::NAME,
            self.audio_type.name(),
            request.config_index
        );
        let opened = self.output.open();
        self.output_ready = opened.is_ok();
        let status = if self.output_ready {
            Status::Ok
        } else {
            Status::Fail
        };
        info!("[{}] {} Setup Status: {}", Self::NAME, self.audio_type.name(), status);

        ctx.send(AvChannelSetupResponse {
            media_status: status,
            max_unacked: 1,
            configs: vec![0],
        })
        .await?;

        opened.map_err(|source| ChannelError::Platform {
            collaborator: "audio output",
            source,
        })
    }

    fn on_start_indication(&mut self, indication: AvChannelStartIndication) {
        info!(
            "[{}] {} Start Indication, Session: {}",
            Self::NAME,
            self.audio_type.name(),
            indication.session
        );
        self.session = Some(indication.session);
        self.output.start();
    }

    fn on_stop_indication(&mut self) {
        info!("[{}] {} Stop Indication", Self::NAME, self.audio_type.name());
        self.session = None;
        self.output.suspend();
    }

    async fn on_media(&mut self, ctx: &ChannelContext, media: AvMediaIndication) -> Result<()> {
        let name = self.audio_type.name();
        if !self.output_ready {
            warn!("[{}] {} media while the output is not open, dropping", Self::NAME, name);
            return Ok(());
        }
        let Some(session) = self.session else {
            warn!("[{}] {} media before start indication, dropping", Self::NAME, name);
            return Ok(());
        };

        trace!(len = media.data.len(), "[{}] {} media", Self::NAME, name);
        self.output.write(media.timestamp, &media.data);
        ctx.send(AvMediaAckIndication { session, value: 1 }).await
    }
}

#[async_trait]
impl ChannelHandler for AudioService {
    type Command = Infallible;
    const NAME: &'static str = "AudioService";

    fn channel_id(&self) -> ChannelId {
        self.channel
    }

    fn descriptor(&self) -> ChannelDescriptor {
        ChannelDescriptor::new(
            self.channel,
            ChannelPayload::Av(AvChannel {
                stream_type: AvStreamType::Audio,
                audio_type: Some(self.audio_type),
                available_while_in_call: true,
                audio_configs: vec![self.config],
                video_configs: Vec::new(),
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
            other => Err(ctx.unexpected(&other)),
        }
    }

    async fn on_command(&mut self, _ctx: &ChannelContext, command: Infallible) -> Result<()> {
        match command {}
    }

    async fn on_stop(&mut self, _ctx: &ChannelContext) {
        self.session = None;
        self.output_ready = false;
        self.output.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelError;
    use crate::listener::ListenerSlot;
    use crate::messenger::LoopbackMessenger;
    use crate::platform::headless::HeadlessAudioOutput;
    use crate::protocol::av::{AvChannelStopIndication, VideoFocusMode, VideoFocusRequest};
    use crate::protocol::OutboundMessage;
    use bytes::Bytes;

    #[test]
    fn test_audio_channel_parameters() {
        let output: Arc<dyn AudioOutput> = Arc::new(HeadlessAudioOutput::new("test"));
        let media = AudioService::media(output.clone());
        let speech = AudioService::speech(output.clone());
        let system = AudioService::system(output);

        assert_eq!(media.channel_id(), ChannelId::MediaAudio);
        assert_eq!(media.config.sample_rate, 48_000);
        assert_eq!(media.config.channel_count, 2);
        assert_eq!(speech.channel_id(), ChannelId::SpeechAudio);
        assert_eq!(speech.config.channel_count, 1);
        assert_eq!(system.channel_id(), ChannelId::SystemAudio);
        assert_eq!(system.config.sample_rate, 16_000);
    }

    #[tokio::test]
    async fn test_stream_lifecycle() {
        let messenger = Arc::new(LoopbackMessenger::new());
        let output = Arc::new(HeadlessAudioOutput::new("media"));
        let ctx = ChannelContext::new(
            ChannelId::MediaAudio,
            AudioService::NAME,
            messenger.clone(),
            ListenerSlot::new(),
            None,
        );
        let mut service = AudioService::media(output.clone());

        service
            .on_message(&ctx, AvChannelSetupRequest { config_index: 0 }.into())
            .await
            .unwrap();
        service
            .on_message(
                &ctx,
                AvChannelStartIndication {
                    session: 3,
                    config: 0,
                }
                .into(),
            )
            .await
            .unwrap();
        assert!(output.is_playing());

        let media = AvMediaIndication {
            timestamp: Some(10),
            data: Bytes::from_static(&[1, 2, 3, 4]),
        };
        service.on_message(&ctx, media.into()).await.unwrap();
        service
            .on_message(&ctx, AvChannelStopIndication.into())
            .await
            .unwrap();

        assert!(!output.is_playing());
        assert_eq!(output.frames(), 1);
        assert_eq!(
            messenger.sent_on(ChannelId::MediaAudio),
            vec![
                OutboundMessage::from(AvChannelSetupResponse {
                    media_status: Status::Ok,
                    max_unacked: 1,
                    configs: vec![0],
                }),
                OutboundMessage::from(AvMediaAckIndication {
                    session: 3,
                    value: 1
                }),
            ]
        );
    }

    #[tokio::test]
    async fn test_media_without_setup_is_dropped() {
        let messenger = Arc::new(LoopbackMessenger::new());
        let output = Arc::new(HeadlessAudioOutput::new("speech"));
        let ctx = ChannelContext::new(
            ChannelId::SpeechAudio,
            AudioService::NAME,
            messenger.clone(),
            ListenerSlot::new(),
            None,
        );
        let mut service = AudioService::speech(output.clone());
        service
            .on_message(
                &ctx,
                AvChannelStartIndication {
                    session: 1,
                    config: 0,
                }
                .into(),
            )
            .await
            .unwrap();
        let media = AvMediaIndication {
            timestamp: None,
            data: Bytes::from_static(&[1, 2]),
        };
        service.on_message(&ctx, media.into()).await.unwrap();

        assert_eq!(output.frames(), 0);
        assert!(messenger.sent_on(ChannelId::SpeechAudio).is_empty());
    }

    #[tokio::test]
    async fn test_focus_request_is_foreign() {
        let ctx = ChannelContext::new(
            ChannelId::SystemAudio,
            AudioService::NAME,
            Arc::new(LoopbackMessenger::new()),
            ListenerSlot::new(),
            None,
        );
        let mut service = AudioService::system(Arc::new(HeadlessAudioOutput::new("system")));
        let request = VideoFocusRequest {
            disp_index: 0,
            focus_mode: VideoFocusMode::Focused,
        };
        let err = service.on_message(&ctx, request.into()).await.unwrap_err();
        assert!(matches!(err, ChannelError::UnexpectedMessage { .. }));
    }
}
