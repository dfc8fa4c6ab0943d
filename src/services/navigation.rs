//! Navigation Status Service
//!
//! Receives turn-by-turn guidance from the phone and forwards it to the status
//! listener. The channel is notification-only: apart from the open handshake
//! nothing is ever sent back.

use async_trait::async_trait;
use std::convert::Infallible;
use tracing::info;

use crate::channel::{ChannelContext, ChannelHandler, Result};
use crate::config::NavigationConfig;
use crate::protocol::discovery::{NavigationChannel, NavigationImageOptions};
use crate::protocol::navigation::{
    NavigationDistanceEvent, NavigationMessage, NavigationStatus, NavigationTurnEvent,
    NavigationTurnType,
};
use crate::protocol::{ChannelDescriptor, ChannelId, ChannelPayload, InboundMessage};

/// Handler for the navigation status channel
#[derive(Debug, Clone)]
pub struct NavigationStatusService {
    capabilities: NavigationChannel,
}

impl NavigationStatusService {
    pub fn new(config: &NavigationConfig) -> Self {
        Self {
            capabilities: NavigationChannel {
                minimum_interval_ms: config.minimum_interval_ms,
                guidance_type: NavigationTurnType::Image,
                image_options: NavigationImageOptions {
                    colour_depth_bits: config.colour_depth_bits,
                    width: config.image_width,
                    height: config.image_height,
                    dunno: 255,
                },
            },
        }
    }

    fn on_status_update(&self, ctx: &ChannelContext, status: &NavigationStatus) {
        info!(
            "[{}] Navigation Status Update, Status: {}",
            Self::NAME,
            status.status.name()
        );
        ctx.notify(|l| l.navigation_status_update(status));
    }

    fn on_turn_event(&self, ctx: &ChannelContext, event: &NavigationTurnEvent) {
        info!(
            "[{}] Turn Event, Street: {}, Maneuver: {} {}",
            Self::NAME,
            event.street_name,
            event.maneuver_direction.name(),
            event.maneuver_type.name()
        );
        if let Some(exit) = event.roundabout_exit_number {
            info!("[{}] Roundabout exit: {}", Self::NAME, exit);
        }
        ctx.notify(|l| l.navigation_turn_event(event));
    }

    fn on_distance_event(&self, ctx: &ChannelContext, event: &NavigationDistanceEvent) {
        info!(
            "[{}] Distance Event, Distance (meters): {}, Time To Turn (seconds): {}, Distance: {} ({})",
            Self::NAME,
            event.meters,
            event.time_to_step_seconds,
            event.display_distance(),
            event.distance_unit.name()
        );
        ctx.notify(|l| l.navigation_distance_event(event));
    }
}

#[async_trait]
impl ChannelHandler for NavigationStatusService {
    type Command = Infallible;
    const NAME: &'static str = "NavigationStatusService";

    fn channel_id(&self) -> ChannelId {
        ChannelId::Navigation
    }

    fn descriptor(&self) -> ChannelDescriptor {
        ChannelDescriptor::new(
            ChannelId::Navigation,
            ChannelPayload::Navigation(self.capabilities.clone()),
        )
    }

    async fn on_message(&mut self, ctx: &ChannelContext, message: InboundMessage) -> Result<()> {
        match message {
            InboundMessage::Navigation(NavigationMessage::Status(status)) => {
                self.on_status_update(ctx, &status)
            }
            InboundMessage::Navigation(NavigationMessage::TurnEvent(event)) => {
                self.on_turn_event(ctx, &event)
            }
            InboundMessage::Navigation(NavigationMessage::DistanceEvent(event)) => {
                self.on_distance_event(ctx, &event)
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
    use crate::channel::ChannelError;
    use crate::listener::{ListenerSlot, MockStatusListener};
    use crate::messenger::LoopbackMessenger;
    use crate::protocol::media::{MediaPlaybackStatus, PlaybackState};
    use crate::protocol::navigation::{DistanceUnit, ManeuverDirection, ManeuverType, NavigationState};
    use std::sync::Arc;

    fn context(listener: Option<MockStatusListener>) -> ChannelContext {
        let slot = ListenerSlot::new();
        if let Some(listener) = listener {
            slot.bind(Some(Arc::new(listener)));
        }
        ChannelContext::new(
            ChannelId::Navigation,
            NavigationStatusService::NAME,
            Arc::new(LoopbackMessenger::new()),
            slot,
            None,
        )
    }

    #[test]
    fn test_descriptor_from_config() {
        let service = NavigationStatusService::new(&NavigationConfig::default());
        let descriptor = service.descriptor();
        assert_eq!(descriptor.channel_id, 9);
        match descriptor.payload {
            ChannelPayload::Navigation(nav) => {
                assert_eq!(nav.minimum_interval_ms, 1000);
                assert_eq!(nav.guidance_type, NavigationTurnType::Image);
                assert_eq!(nav.image_options.colour_depth_bits, 16);
                assert_eq!(nav.image_options.width, 256);
                assert_eq!(nav.image_options.height, 256);
                assert_eq!(nav.image_options.dunno, 255);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_status_forwarded_once() {
        let mut mock = MockStatusListener::new();
        mock.expect_navigation_status_update()
            .withf(|s| s.status == NavigationState::Turn)
            .times(1)
            .return_const(());
        let ctx = context(Some(mock));

        let mut service = NavigationStatusService::new(&NavigationConfig::default());
        service
            .on_message(
                &ctx,
                NavigationStatus {
                    status: NavigationState::Turn,
                }
                .into(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_distance_forwarded_with_display_value() {
        let mut mock = MockStatusListener::new();
        mock.expect_navigation_distance_event()
            .withf(|e| e.meters == 120 && (e.display_distance() - 1.5).abs() < f64::EPSILON)
            .times(1)
            .return_const(());
        let ctx = context(Some(mock));

        let mut service = NavigationStatusService::new(&NavigationConfig::default());
        let event = NavigationDistanceEvent {
            meters: 120,
            time_to_step_seconds: 8,
            distance_to_step_millis: 1500,
            distance_unit: DistanceUnit::Meters,
        };
        service.on_message(&ctx, event.into()).await.unwrap();
    }

    #[tokio::test]
    async fn test_turn_event_forwarded() {
        let mut mock = MockStatusListener::new();
        mock.expect_navigation_turn_event()
            .withf(|e| e.street_name == "Main St" && e.maneuver_direction == ManeuverDirection::Left)
            .times(1)
            .return_const(());
        let ctx = context(Some(mock));

        let mut service = NavigationStatusService::new(&NavigationConfig::default());
        let event = NavigationTurnEvent::new("Main St", ManeuverDirection::Left, ManeuverType::Turn);
        service.on_message(&ctx, event.into()).await.unwrap();
    }

    #[tokio::test]
    async fn test_without_listener_is_silent() {
        let ctx = context(None);
        let mut service = NavigationStatusService::new(&NavigationConfig::default());
        let result = service
            .on_message(
                &ctx,
                NavigationStatus {
                    status: NavigationState::Active,
                }
                .into(),
            )
            .await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_foreign_message_rejected() {
        let ctx = context(None);
        let mut service = NavigationStatusService::new(&NavigationConfig::default());
        let playback = MediaPlaybackStatus {
            state: PlaybackState::Paused,
            media_source: String::new(),
            track_progress_seconds: 0,
            shuffle: false,
            repeat: false,
            repeat_one: false,
        };
        let err = service.on_message(&ctx, playback.into()).await.unwrap_err();
        assert!(matches!(err, ChannelError::UnexpectedMessage { .. }));
    }
}
