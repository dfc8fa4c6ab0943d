//! Head-unit services
//!
//! One service per phone-projection capability. Every service is a
//! [`ChannelHandler`](crate::channel::ChannelHandler) driven by its own
//! channel lane; the [`ServiceRegistry`] builds the set for a session.
//!
//! # Architecture
//!
//! ```text
//! Config + Platform ──> ServiceRegistry::create(messenger) ──> ServiceList
//!                              │                                  │
//!                    weak command handles                 Channel<H> lanes
//!                              │                                  │
//!                  set_opacity / resize / ...  ──────────> on_command
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let registry = ServiceRegistry::new(Handle::current(), config, platform);
//! let services = registry.create(messenger);
//! services.start_all()?;
//! services.log_summary();
//!
//! registry.set_night_mode(true);
//! ```

pub mod audio;
pub mod bluetooth;
pub mod input;
pub mod media_status;
pub mod navigation;
mod registry;
pub mod sensor;
mod service;
pub mod video;

pub use audio::AudioService;
pub use bluetooth::BluetoothService;
pub use input::{InputCommand, InputService};
pub use media_status::MediaStatusService;
pub use navigation::NavigationStatusService;
pub use registry::ServiceRegistry;
pub use sensor::{SensorActivity, SensorCommand, SensorService};
pub use service::{Service, ServiceKind, ServiceList, ServiceStats};
pub use video::{ActivityCallback, VideoCommand, VideoService};
