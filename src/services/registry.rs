//! Service Registry implementation
//!
//! The composition root of a head-unit session. `create` builds every service
//! the configuration enables, wires the weak cross-service links, and keeps
//! only non-owning command handles so session-control calls can reach the
//! services' lanes without keeping them alive.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tokio::runtime::Handle;
use tracing::{debug, info, info_span, warn};
use uuid::Uuid;

use super::audio::AudioService;
use super::bluetooth::BluetoothService;
use super::input::{InputCommand, InputService};
use super::media_status::MediaStatusService;
use super::navigation::NavigationStatusService;
use super::sensor::{SensorActivity, SensorCommand, SensorService};
use super::service::{Service, ServiceList};
use super::video::{ActivityCallback, VideoCommand, VideoService};
use crate::channel::{Channel, ChannelEnv, CommandHandle};
use crate::config::Config;
use crate::listener::{ListenerSlot, StatusListener};
use crate::messenger::Messenger;
use crate::platform::{ButtonEventType, DisplayRect, KeyEvent, Platform, WheelDirection};
use crate::protocol::input::ButtonCode;
use crate::protocol::ServiceDiscoveryResponse;

/// Non-owning links into the current session's services
#[derive(Default)]
struct SessionLinks {
    session: Option<Uuid>,
    video: Option<CommandHandle<VideoCommand>>,
    input: Option<CommandHandle<InputCommand>>,
    sensor: Option<CommandHandle<SensorCommand>>,
    sensor_activity: Weak<SensorActivity>,
}

struct SessionState {
    night_mode: bool,
    display_area: DisplayRect,
    links: SessionLinks,
}

/// Builds and steers the services of a head-unit session
pub struct ServiceRegistry {
    runtime: Handle,
    config: Arc<Config>,
    platform: Platform,
    listener: ListenerSlot,
    activity: Option<ActivityCallback>,
    state: Mutex<SessionState>,
}

impl ServiceRegistry {
    /// Create a registry spawning lanes on `runtime`
    pub fn new(runtime: Handle, config: Arc<Config>, platform: Platform) -> Self {
        let state = SessionState {
            night_mode: config.session.night_mode,
            display_area: platform.display.active_area(),
            links: SessionLinks::default(),
        };
        Self {
            runtime,
            config,
            platform,
            listener: ListenerSlot::new(),
            activity: None,
            state: Mutex::new(state),
        }
    }

    /// Call `callback` whenever the projection gains or loses the screen
    pub fn with_activity_callback(mut self, callback: ActivityCallback) -> Self {
        self.activity = Some(callback);
        self
    }

    /// Build the services of a new session over `messenger`
    ///
    /// Services are created idle; start them with [`ServiceList::start_all`].
    pub fn create(&self, messenger: Arc<dyn Messenger>) -> ServiceList {
        let session = Uuid::new_v4();
        let span = info_span!("session", %session);
        let _enter = span.enter();

        let (night_mode, display_area) = {
            let state = self.state.lock();
            (state.night_mode, state.display_area)
        };

        let env = ChannelEnv {
            runtime: self.runtime.clone(),
            messenger,
            listener: self.listener.clone(),
            settings: self.config.channel.settings(),
            session,
        };

        let mut services = ServiceList::new();
        let mut links = SessionLinks {
            session: Some(session),
            ..SessionLinks::default()
        };

        self.create_audio_services(&mut services, &env);

        let sensor = SensorService::new(&self.config.sensor, night_mode);
        links.sensor_activity = Arc::downgrade(&sensor.activity());
        let sensor = Channel::new(sensor, &env);
        links.sensor = Some(sensor.command_handle());
        register(&mut services, Service::Sensor(sensor));

        let video_config = self.config.video.video_config();
        let video = Channel::new(
            VideoService::new(self.platform.video.clone(), video_config, self.activity.clone()),
            &env,
        );
        links.video = Some(video.command_handle());
        register(&mut services, Service::Video(video));

        if let Some(bluetooth) = self.create_bluetooth_service(&env) {
            register(&mut services, Service::Bluetooth(bluetooth));
        }

        let input = Channel::new(
            InputService::new(
                &self.config.input,
                self.platform.input.clone(),
                video_config.resolution.dimensions(),
                display_area,
                links.sensor_activity.clone(),
            ),
            &env,
        );
        links.input = Some(input.command_handle());
        register(&mut services, Service::Input(input));

        if self.config.navigation.enabled {
            let navigation = NavigationStatusService::new(&self.config.navigation);
            register(&mut services, Service::Navigation(Channel::new(navigation, &env)));
        }

        if self.config.media_status.enabled {
            let media = MediaStatusService::new();
            register(&mut services, Service::MediaStatus(Channel::new(media, &env)));
        }

        info!("Created {} services for session {}", services.len(), session);
        self.state.lock().links = links;
        services
    }

    fn create_audio_services(&self, services: &mut ServiceList, env: &ChannelEnv) {
        if self.config.audio.media_channel {
            let media = AudioService::media(self.platform.media_audio.clone());
            register(services, Service::Audio(Channel::new(media, env)));
        }
        if self.config.audio.speech_channel {
            let speech = AudioService::speech(self.platform.speech_audio.clone());
            register(services, Service::Audio(Channel::new(speech, env)));
        }
        let system = AudioService::system(self.platform.system_audio.clone());
        register(services, Service::Audio(Channel::new(system, env)));
    }

    fn create_bluetooth_service(&self, env: &ChannelEnv) -> Option<Channel<BluetoothService>> {
        let address = self.config.bluetooth.adapter_address.as_ref()?;
        let Some(device) = self.platform.bluetooth.clone() else {
            warn!("Bluetooth adapter {} configured but no device present", address);
            return None;
        };
        if !device.is_available() {
            warn!("Bluetooth adapter {} unavailable, channel not advertised", address);
            return None;
        }
        Some(Channel::new(BluetoothService::new(device, address.clone()), env))
    }

    /// Discovery response for `services`
    pub fn discovery_response(&self, services: &ServiceList) -> ServiceDiscoveryResponse {
        let head_unit = &self.config.head_unit;
        let mut response = ServiceDiscoveryResponse {
            head_unit_name: head_unit.name.clone(),
            car_model: head_unit.car_model.clone(),
            car_year: head_unit.car_year.clone(),
            left_hand_drive_vehicle: head_unit.left_hand_drive,
            channels: Vec::new(),
        };
        services.fill_features(&mut response);
        response
    }

    /// Blend the projection with the native UI
    pub fn set_opacity(&self, alpha: u8) {
        match self.video_handle() {
            Some(video) => {
                video.dispatch(VideoCommand::SetOpacity(alpha));
            }
            None => debug!("No video service, ignoring opacity {}", alpha),
        }
    }

    /// Re-read the projection area from the display surface
    pub fn resize(&self) {
        let area = self.platform.display.active_area();
        let (video, input) = {
            let mut state = self.state.lock();
            state.display_area = area;
            (state.links.video.clone(), state.links.input.clone())
        };
        info!("Projection area: {}", area);

        match video {
            Some(video) => {
                video.dispatch(VideoCommand::Resize(area));
            }
            None => debug!("No video service, resize only recorded"),
        }
        if let Some(input) = input {
            input.dispatch(InputCommand::SetDisplayArea(area));
        }
    }

    /// Switch between day and night mode
    pub fn set_night_mode(&self, night_mode: bool) {
        let sensor = {
            let mut state = self.state.lock();
            state.night_mode = night_mode;
            state.links.sensor.clone()
        };
        info!("Night mode: {}", night_mode);
        match sensor {
            Some(sensor) => {
                sensor.dispatch(SensorCommand::SetNightMode(night_mode));
            }
            None => debug!("No sensor service, night mode only recorded"),
        }
    }

    /// Inject a button press from the head-unit UI
    pub fn send_button_press(
        &self,
        code: ButtonCode,
        wheel: WheelDirection,
        event_type: ButtonEventType,
    ) {
        match self.input_handle() {
            Some(input) => {
                input.dispatch(InputCommand::Button {
                    code,
                    wheel,
                    event_type,
                });
            }
            None => debug!("No input service, dropping {:?}", code),
        }
    }

    /// Inject a key event from the head-unit UI
    pub fn send_key_event(&self, event: KeyEvent) {
        let Some((code, wheel)) = event.key.translate() else {
            debug!("Key {:?} has no phone counterpart", event.key);
            return;
        };
        if wheel != WheelDirection::None && !event.pressed {
            return;
        }
        let event_type = if event.pressed {
            ButtonEventType::Press
        } else {
            ButtonEventType::Release
        };
        self.send_button_press(code, wheel, event_type);
    }

    /// Bind, replace or clear the status listener
    ///
    /// Applies to the services of the current session immediately and to every
    /// later session.
    pub fn set_status_listener(&self, listener: Option<Arc<dyn StatusListener>>) {
        let bound = listener.is_some();
        self.listener.bind(listener);
        info!("Status listener {}", if bound { "bound" } else { "cleared" });
    }

    /// Current night mode flag
    pub fn night_mode(&self) -> bool {
        self.state.lock().night_mode
    }

    /// Last known projection area
    pub fn display_area(&self) -> DisplayRect {
        self.state.lock().display_area
    }

    /// Session id of the most recent `create`
    pub fn session_id(&self) -> Option<Uuid> {
        self.state.lock().links.session
    }

    /// Sensor activity of the current session, if the sensor service is alive
    pub fn sensor_activity(&self) -> Option<Arc<SensorActivity>> {
        self.state.lock().links.sensor_activity.upgrade()
    }

    fn video_handle(&self) -> Option<CommandHandle<VideoCommand>> {
        self.state.lock().links.video.clone()
    }

    fn input_handle(&self) -> Option<CommandHandle<InputCommand>> {
        self.state.lock().links.input.clone()
    }
}

fn register(services: &mut ServiceList, service: Service) {
    let name = service.name();
    if let Err(e) = services.push(service) {
        warn!("Not registering {}: {}", name, e);
    }
}
