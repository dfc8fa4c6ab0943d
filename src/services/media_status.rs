//! Media Status Service
//!
//! Now-playing information from the phone, forwarded to the status listener.

use async_trait::async_trait;
use std::convert::Infallible;
use tracing::info;

use crate::channel::{ChannelContext, ChannelHandler, Result};
use crate::protocol::media::{MediaMetadata, MediaPlaybackStatus, MediaStatusMessage};
use crate::protocol::{ChannelDescriptor, ChannelId, ChannelPayload, InboundMessage};

/// Handler for the media status channel
#[derive(Debug, Clone, Default)]
pub struct MediaStatusService;

impl MediaStatusService {
    pub fn new() -> Self {
        Self
    }

    fn on_playback_update(&self, ctx: &ChannelContext, status: &MediaPlaybackStatus) {
        info!(
            "[{}] Playback Update, State: {}, Source: {}, Progress: {}s",
            Self::NAME,
            status.state.name(),
            status.media_source,
            status.track_progress_seconds
        );
        ctx.notify(|l| l.media_playback_update(status));
    }

    fn on_metadata_update(&self, ctx: &ChannelContext, metadata: &MediaMetadata) {
        info!(
            "[{}] Metadata Update, Track: {}, Artist: {}, Album: {}, Length: {}s",
            Self::NAME,
            metadata.track_name,
            metadata.artist_name,
            metadata.album_name,
            metadata.track_length_seconds
        );
        ctx.notify(|l| l.media_metadata_update(metadata));
    }
}

#[async_trait]
impl ChannelHandler for MediaStatusService {
    type Command = Infallible;
    const NAME: &'static str = "MediaStatusService";

    fn channel_id(&self) -> ChannelId {
        ChannelId::MediaStatus
    }

    fn descriptor(&self) -> ChannelDescriptor {
        ChannelDescriptor::new(ChannelId::MediaStatus, ChannelPayload::MediaInfo)
    }

    async fn on_message(&mut self, ctx: &ChannelContext, message: InboundMessage) -> Result<()> {
        match message {
            InboundMessage::MediaStatus(MediaStatusMessage::Playback(status)) => {
                self.on_playback_update(ctx, &status)
            }
            InboundMessage::MediaStatus(MediaStatusMessage::Metadata(metadata)) => {
                self.on_metadata_update(ctx, &metadata)
            }
            other => return Err(ctx.unexpected(&other)),
        }
        Ok(())
    }

    async fn on_command(&mut self, _ctx: &ChannelContext, command: Infallible) -> Result<()> {
        match command {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::listener::{ListenerSlot, MockStatusListener};
    use crate::messenger::LoopbackMessenger;
    use crate::protocol::media::PlaybackState;
    use bytes::Bytes;
    use std::sync::Arc;

    fn context(mock: MockStatusListener) -> ChannelContext {
        let slot = ListenerSlot::new();
        slot.bind(Some(Arc::new(mock)));
        ChannelContext::new(
            ChannelId::MediaStatus,
            MediaStatusService::NAME,
            Arc::new(LoopbackMessenger::new()),
            slot,
            None,
        )
    }

    #[tokio::test]
    async fn test_metadata_forwarded() {
        let mut mock = MockStatusListener::new();
        mock.expect_media_metadata_update()
            .withf(|m| m.track_name == "Song 2" && m.album_art.len() == 3)
            .times(1)
            .return_const(());
        mock.expect_media_playback_update().never();
        let ctx = context(mock);

        let metadata = MediaMetadata {
            track_name: "Song 2".into(),
            artist_name: "Blur".into(),
            album_name: "Blur".into(),
            album_art: Bytes::from_static(b"png"),
            track_length_seconds: 122,
        };
        MediaStatusService::new()
            .on_message(&ctx, metadata.into())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_playback_forwarded() {
        let mut mock = MockStatusListener::new();
        mock.expect_media_playback_update()
            .withf(|s| s.state == PlaybackState::Playing && s.track_progress_seconds == 42)
            .times(1)
            .return_const(());
        let ctx = context(mock);

        let status = MediaPlaybackStatus {
            state: PlaybackState::Playing,
            media_source: "Spotify".into(),
            track_progress_seconds: 42,
            shuffle: true,
            repeat: false,
            repeat_one: false,
        };
        MediaStatusService::new()
            .on_message(&ctx, status.into())
            .await
            .unwrap();
    }

    #[test]
    fn test_descriptor() {
        let descriptor = MediaStatusService::new().descriptor();
        assert_eq!(descriptor.channel_id, 10);
        assert_eq!(descriptor.payload, ChannelPayload::MediaInfo);
    }
}
