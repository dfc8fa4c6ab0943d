//! Input Service
//!
//! The command-emitting channel. The phone binds the scan codes it wants to
//! receive; from then on hard keys, rotary steps and touches coming from the
//! registry or the platform input device are turned into
//! `InputEventIndication` messages on this channel's lane.

use async_trait::async_trait;
use std::sync::{Arc, Weak};
use tracing::{debug, info, warn};

use super::sensor::SensorActivity;
use crate::channel::{ChannelContext, ChannelHandler, CommandHandle, Result};
use crate::config::InputConfig;
use crate::platform::{
    ButtonEventType, DeviceEvent, DisplayRect, InputDevice, InputSink, WheelDirection,
};
use crate::protocol::discovery::{InputChannel, TouchScreenConfig};
use crate::protocol::input::{
    BindingRequest, BindingResponse, ButtonCode, ButtonEvent, InputEvent, InputEventIndication,
    InputMessage, RelativeEvent, TouchAction, TouchEvent, TouchLocation,
};
use crate::protocol::sensor::SensorType;
use crate::protocol::{ChannelDescriptor, ChannelId, ChannelPayload, InboundMessage, Status};

/// Commands the registry and the input device post to the input lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputCommand {
    /// Synthetic button press from the head-unit UI
    Button {
        code: ButtonCode,
        wheel: WheelDirection,
        event_type: ButtonEventType,
    },
    /// Event produced by the platform input device
    Device(DeviceEvent),
    /// Projection moved to a new screen area
    SetDisplayArea(DisplayRect),
}

/// Handler for the input channel
pub struct InputService {
    device: Arc<dyn InputDevice>,
    supported: Vec<ButtonCode>,
    touchscreen: Option<TouchScreenConfig>,
    display_area: DisplayRect,
    sensor: Weak<SensorActivity>,
    commands: Option<CommandHandle<InputCommand>>,
    bound: bool,
}

impl InputService {
    /// `video_size` is the projection resolution touches are mapped onto
    pub fn new(
        config: &InputConfig,
        device: Arc<dyn InputDevice>,
        video_size: (u32, u32),
        display_area: DisplayRect,
        sensor: Weak<SensorActivity>,
    ) -> Self {
        let touchscreen = config.touchscreen.then_some(TouchScreenConfig {
            width: video_size.0,
            height: video_size.1,
        });
        Self {
            device,
            supported: config.buttons.clone(),
            touchscreen,
            display_area,
            sensor,
            commands: None,
            bound: false,
        }
    }

    async fn on_binding_request(
        &mut self,
        ctx: &ChannelContext,
        request: BindingRequest,
    ) -> Result<()> {
        info!(
            "[{}] Binding Request, Scan Codes Count: {}",
            Self::NAME,
            request.scan_codes.len()
        );
        ctx.notify(|l| l.input_binding_requested(&request));

        let unsupported: Vec<u32> = request
            .scan_codes
            .iter()
            .copied()
            .filter(|code| {
                !self
                    .supported
                    .iter()
                    .any(|button| button.scan_code() == *code)
            })
            .collect();

        let status = if unsupported.is_empty() {
            Status::Ok
        } else {
            warn!(
                "[{}] Binding requested for unsupported scan codes: {:?}",
                Self::NAME,
                unsupported
            );
            Status::Fail
        };

        info!("[{}] Binding Response, Status: {}", Self::NAME, status);
        ctx.send(BindingResponse { status }).await?;

        if status == Status::Ok && !self.bound {
            self.bound = true;
            if let Some(commands) = self.commands.clone() {
                self.device.start(InputSink::new(move |event| {
                    commands.dispatch(InputCommand::Device(event))
                }));
            }

            let driving_status = self
                .sensor
                .upgrade()
                .is_some_and(|s| s.is_reporting(SensorType::DrivingStatus));
            if !driving_status {
                warn!(
                    "[{}] Input bound while driving status is not reported",
                    Self::NAME
                );
            }
        }
        Ok(())
    }

    async fn on_button(
        &self,
        ctx: &ChannelContext,
        code: ButtonCode,
        wheel: WheelDirection,
        event_type: ButtonEventType,
    ) -> Result<()> {
        if !self.is_supported(code) {
            return Ok(());
        }

        let delta = match wheel {
            WheelDirection::Left => Some(-1),
            WheelDirection::Right => Some(1),
            WheelDirection::None => None,
        };
        if let Some(delta) = delta {
            return self.send_event(ctx, relative(code, delta)).await;
        }

        match event_type {
            ButtonEventType::Press => self.send_event(ctx, button(code, true)).await,
            ButtonEventType::Release => self.send_event(ctx, button(code, false)).await,
            ButtonEventType::None => {
                self.send_event(ctx, button(code, true)).await?;
                self.send_event(ctx, button(code, false)).await
            }
        }
    }

    async fn on_device_event(&self, ctx: &ChannelContext, event: DeviceEvent) -> Result<()> {
        match event {
            DeviceEvent::Button { code, pressed } => {
                if !self.is_supported(code) {
                    return Ok(());
                }
                self.send_event(ctx, button(code, pressed)).await
            }
            DeviceEvent::Wheel { delta } => {
                if !self.is_supported(ButtonCode::ScrollWheel) {
                    return Ok(());
                }
                self.send_event(ctx, relative(ButtonCode::ScrollWheel, delta))
                    .await
            }
            DeviceEvent::Touch {
                action,
                x,
                y,
                pointer_id,
            } => match self.map_touch(x, y) {
                Some((x, y)) => {
                    let touch = TouchEvent {
                        action,
                        action_index: 0,
                        locations: vec![TouchLocation { x, y, pointer_id }],
                    };
                    self.send_event(ctx, InputEvent::Touch(touch)).await
                }
                None => {
                    debug!(
                        "[{}] touch {:?} at ({}, {}) outside {}, dropping",
                        Self::NAME,
                        action,
                        x,
                        y,
                        self.display_area
                    );
                    Ok(())
                }
            },
        }
    }

    fn is_supported(&self, code: ButtonCode) -> bool {
        let supported = self.supported.contains(&code);
        if !supported {
            debug!("[{}] {:?} is not a supported button, dropping", Self::NAME, code);
        }
        supported
    }

    /// Map screen coordinates onto the projection resolution
    fn map_touch(&self, x: i32, y: i32) -> Option<(u32, u32)> {
        let touch = self.touchscreen?;
        let area = self.display_area;
        if !area.contains(x, y) {
            return None;
        }
        let scale = |offset: i32, origin: i32, extent: u32, target: u32| -> u32 {
            let offset = u64::try_from(i64::from(offset) - i64::from(origin)).unwrap_or(0);
            let scaled = offset * u64::from(target) / u64::from(extent.max(1));
            u32::try_from(scaled).unwrap_or(u32::MAX).min(target.saturating_sub(1))
        };
        Some((
            scale(x, area.x, area.width, touch.width),
            scale(y, area.y, area.height, touch.height),
        ))
    }

    async fn send_event(&self, ctx: &ChannelContext, event: InputEvent) -> Result<()> {
        if !self.bound {
            debug!("[{}] not bound yet, dropping {:?}", Self::NAME, event);
            return Ok(());
        }
        let indication = InputEventIndication {
            timestamp: timestamp_micros(),
            disp_channel: 0,
            event,
        };
        ctx.send(indication).await
    }
}

fn button(code: ButtonCode, pressed: bool) -> InputEvent {
    InputEvent::Buttons(vec![ButtonEvent {
        scan_code: code.scan_code(),
        is_pressed: pressed,
        meta: 0,
        long_press: false,
    }])
}

fn relative(code: ButtonCode, delta: i32) -> InputEvent {
    InputEvent::Relative(RelativeEvent {
        scan_code: code.scan_code(),
        delta,
    })
}

fn timestamp_micros() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_micros()).unwrap_or_default()
}

#[async_trait]
impl ChannelHandler for InputService {
    type Command = InputCommand;
    const NAME: &'static str = "InputService";

    fn channel_id(&self) -> ChannelId {
        ChannelId::Input
    }

    fn descriptor(&self) -> ChannelDescriptor {
        ChannelDescriptor::new(
            ChannelId::Input,
            ChannelPayload::Input(InputChannel {
                supported_keycodes: self.supported.iter().map(|b| b.scan_code()).collect(),
                touch_screen_config: self.touchscreen,
            }),
        )
    }

    fn attach(&mut self, commands: CommandHandle<InputCommand>) {
        self.commands = Some(commands);
    }

    async fn on_message(&mut self, ctx: &ChannelContext, message: InboundMessage) -> Result<()> {
        match message {
            InboundMessage::Input(InputMessage::BindingRequest(request)) => {
                self.on_binding_request(ctx, request).await
            }
            other => Err(ctx.unexpected(&other)),
        }
    }

    async fn on_command(&mut self, ctx: &ChannelContext, command: InputCommand) -> Result<()> {
        match command {
            InputCommand::Button {
                code,
                wheel,
                event_type,
            } => self.on_button(ctx, code, wheel, event_type).await,
            InputCommand::Device(event) => self.on_device_event(ctx, event).await,
            InputCommand::SetDisplayArea(area) => {
                debug!("[{}] display area: {}", Self::NAME, area);
                self.display_area = area;
                Ok(())
            }
        }
    }

    async fn on_stop(&mut self, _ctx: &ChannelContext) {
        if self.bound {
            self.device.stop();
            self.bound = false;
        }
    }
}
