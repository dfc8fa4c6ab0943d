//! headunit-services - phone-projection channel service engine
//!
//! Entry point for the binary. `discovery` prints the service discovery
//! response for the configured service set; `simulate` runs a scripted
//! session over the in-memory loopback transport with headless collaborators.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use headunit_services::config::Config;
use headunit_services::listener::StatusListener;
use headunit_services::messenger::LoopbackMessenger;
use headunit_services::platform::headless::HeadlessPlatform;
use headunit_services::platform::{ButtonEventType, DeviceEvent, Key, KeyEvent, WheelDirection};
use headunit_services::protocol::av::{
    AvChannelSetupRequest, AvChannelStartIndication, AvMediaIndication, VideoFocusMode,
    VideoFocusRequest,
};
use headunit_services::protocol::input::{BindingRequest, ButtonCode, TouchAction};
use headunit_services::protocol::media::{MediaMetadata, MediaPlaybackStatus, PlaybackState};
use headunit_services::protocol::navigation::{
    DistanceUnit, ManeuverDirection, ManeuverType, NavigationDistanceEvent, NavigationState,
    NavigationStatus, NavigationTurnEvent,
};
use headunit_services::protocol::sensor::{SensorStartRequest, SensorType};
use headunit_services::protocol::{ChannelId, ChannelOpenRequest};
use headunit_services::services::ServiceRegistry;
use headunit_services::utils::{format_user_error, log_startup_diagnostics};

/// Command-line arguments for headunit-services
#[derive(Parser, Debug)]
#[command(name = "headunit-services")]
#[command(version, about = "Phone-projection head unit channel services", long_about = None)]
pub struct Args {
    /// Configuration file path (built-in defaults when omitted)
    #[arg(short, long, env = "HEADUNIT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Verbose logging (can be specified multiple times)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Log format (json|pretty|compact), overrides the config file
    #[arg(long)]
    pub log_format: Option<String>,

    /// Write logs to file (in addition to stdout)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Start in night mode
    #[arg(long)]
    pub night_mode: bool,

    /// Bluetooth adapter address, enables the bluetooth channel
    #[arg(long, env = "HEADUNIT_BLUETOOTH_ADAPTER")]
    pub bluetooth_adapter: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// What to run
#[derive(Subcommand, Debug, Clone, Copy)]
pub enum Command {
    /// Print the service discovery response as JSON
    Discovery,
    /// Run a scripted session over the loopback transport
    Simulate {
        /// How long to wait for each scripted exchange, in milliseconds
        #[arg(long, default_value = "1000")]
        step_timeout_ms: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format_user_error(&e));
            return Err(e);
        }
    };

    let _guard = init_logging(&args, &config)?;

    info!("════════════════════════════════════════════════════════");
    info!("  headunit-services v{}", env!("CARGO_PKG_VERSION"));
    info!("  Built: {} {}", env!("BUILD_DATE"), env!("BUILD_TIME"));
    info!("  Commit: {}", env!("GIT_HASH"));
    info!("  Profile: {}", if cfg!(debug_assertions) { "debug" } else { "release" });
    info!("════════════════════════════════════════════════════════");

    log_startup_diagnostics(&config);
    tracing::debug!("Config: {:?}", config);

    let config = Arc::new(config);
    let result = match args.command.unwrap_or(Command::Simulate {
        step_timeout_ms: 1000,
    }) {
        Command::Discovery => print_discovery(config),
        Command::Simulate { step_timeout_ms } => {
            simulate(config, Duration::from_millis(step_timeout_ms)).await
        }
    };

    if let Err(e) = &result {
        eprintln!("{}", format_user_error(e));
    }
    result
}

fn load_config(args: &Args) -> Result<Config> {
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default_config()?,
    };
    let config = config.with_overrides(args.night_mode, args.bluetooth_adapter.clone());
    config.validate()?;
    Ok(config)
}

fn headless_platform(config: &Config) -> HeadlessPlatform {
    HeadlessPlatform::new(
        config.session.display_area,
        config.bluetooth.adapter_address.as_deref(),
    )
}

fn print_discovery(config: Arc<Config>) -> Result<()> {
    let platform = headless_platform(&config);
    let registry = ServiceRegistry::new(Handle::current(), config, platform.platform());
    let services = registry.create(Arc::new(LoopbackMessenger::new()));
    let response = registry.discovery_response(&services);
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Logs every status update the scripted phone produces
struct LoggingListener;

impl StatusListener for LoggingListener {
    fn navigation_status_update(&self, status: &NavigationStatus) {
        info!("[UI] navigation status {}", status.status.name());
    }

    fn navigation_turn_event(&self, event: &NavigationTurnEvent) {
        info!(
            "[UI] {} {} onto {}",
            event.maneuver_type.name(),
            event.maneuver_direction.name(),
            event.street_name
        );
    }

    fn navigation_distance_event(&self, event: &NavigationDistanceEvent) {
        info!(
            "[UI] {:.1} {} in {}s",
            event.display_distance(),
            event.distance_unit.name(),
            event.time_to_step_seconds
        );
    }

    fn media_playback_update(&self, status: &MediaPlaybackStatus) {
        info!("[UI] {} from {}", status.state.name(), status.media_source);
    }

    fn media_metadata_update(&self, metadata: &MediaMetadata) {
        info!("[UI] now playing {} - {}", metadata.artist_name, metadata.track_name);
    }

    fn video_focus_changed(&self, mode: VideoFocusMode) {
        info!("[UI] video focus {:?}", mode);
    }
}

async fn simulate(config: Arc<Config>, step: Duration) -> Result<()> {
    let platform = headless_platform(&config);
    let messenger = Arc::new(LoopbackMessenger::new());
    let registry = ServiceRegistry::new(Handle::current(), config.clone(), platform.platform())
        .with_activity_callback(Arc::new(|active: bool| info!("Projection active: {}", active)));
    registry.set_status_listener(Some(Arc::new(LoggingListener)));

    let services = registry.create(messenger.clone());
    services.start_all()?;
    services.log_summary();

    for channel in services.channel_ids() {
        messenger.deliver(
            channel,
            ChannelOpenRequest {
                priority: 5,
                channel_id: channel.as_u32(),
            },
        );
        if !messenger.wait_for_sent(channel, 1, step).await {
            warn!("{} did not answer the open request", channel);
        }
    }

    if services.get(ChannelId::Navigation).is_some() {
        messenger.deliver(
            ChannelId::Navigation,
            NavigationStatus {
                status: NavigationState::Active,
            },
        );
        messenger.deliver(
            ChannelId::Navigation,
            NavigationTurnEvent::new("Main Street", ManeuverDirection::Left, ManeuverType::Turn),
        );
        messenger.deliver(
            ChannelId::Navigation,
            NavigationDistanceEvent {
                meters: 120,
                time_to_step_seconds: 8,
                distance_to_step_millis: 1500,
                distance_unit: DistanceUnit::Meters,
            },
        );
    }

    if services.get(ChannelId::MediaStatus).is_some() {
        messenger.deliver(
            ChannelId::MediaStatus,
            MediaPlaybackStatus {
                state: PlaybackState::Playing,
                media_source: "Radio".to_string(),
                track_progress_seconds: 42,
                shuffle: false,
                repeat: false,
                repeat_one: false,
            },
        );
    }

    for sensor_type in [SensorType::DrivingStatus, SensorType::NightData] {
        messenger.deliver(
            ChannelId::Sensor,
            SensorStartRequest {
                sensor_type,
                refresh_interval: 0,
            },
        );
    }
    // open response, then a start response and a reading per sensor
    messenger.wait_for_sent(ChannelId::Sensor, 5, step).await;

    messenger.deliver(ChannelId::Video, AvChannelSetupRequest { config_index: 0 });
    messenger.deliver(
        ChannelId::Video,
        AvChannelStartIndication {
            session: 1,
            config: 0,
        },
    );
    messenger.deliver(
        ChannelId::Video,
        AvMediaIndication {
            timestamp: Some(0),
            data: bytes::Bytes::from_static(&[0, 0, 0, 1]),
        },
    );
    messenger.deliver(
        ChannelId::Video,
        VideoFocusRequest {
            disp_index: 0,
            focus_mode: VideoFocusMode::Focused,
        },
    );
    messenger.wait_for_sent(ChannelId::Video, 5, step).await;

    let scan_codes = config.input.buttons.iter().map(|b| b.scan_code()).collect();
    messenger.deliver(ChannelId::Input, BindingRequest { scan_codes });
    messenger.wait_for_sent(ChannelId::Input, 2, step).await;

    registry.set_night_mode(!config.session.night_mode);
    registry.set_opacity(200);
    registry.resize();
    registry.send_button_press(ButtonCode::Enter, WheelDirection::None, ButtonEventType::None);
    registry.send_key_event(KeyEvent::press(Key::RotaryRight));
    platform.input.inject(DeviceEvent::Touch {
        action: TouchAction::Press,
        x: 100,
        y: 100,
        pointer_id: 0,
    });
    messenger.wait_for_sent(ChannelId::Input, 6, step).await;

    println!("{}", serde_json::to_string_pretty(&services.stats())?);

    services.shutdown().await;
    info!("Simulated session finished");
    Ok(())
}

fn init_logging(args: &Args, config: &Config) -> Result<Option<WorkerGuard>> {
    let log_level = match args.verbose {
        0 => config.logging.level.as_str(),
        1 => "debug",
        _ => "trace",
    };
    let log_format = args
        .log_format
        .as_deref()
        .unwrap_or(config.logging.format.as_str());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("headunit_services={},warn", log_level))
    });

    // If log file is specified, write to both stdout and file
    if let Some(log_file_path) = &args.log_file {
        let file = std::fs::File::create(log_file_path)?;
        let (writer, guard) = tracing_appender::non_blocking(file);

        match log_format {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(std::io::stdout),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .json()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(std::io::stdout),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .compact()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(
                        tracing_subscriber::fmt::layer()
                            .pretty()
                            .with_writer(std::io::stdout),
                    )
                    .with(
                        tracing_subscriber::fmt::layer()
                            .with_writer(writer)
                            .with_ansi(false),
                    )
                    .init();
            }
        }
        info!("Logging to file: {}", log_file_path.display());
        Ok(Some(guard))
    } else {
        // Stdout only
        match log_format {
            "json" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().json())
                    .init();
            }
            "compact" => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().compact())
                    .init();
            }
            _ => {
                tracing_subscriber::registry()
                    .with(env_filter)
                    .with(tracing_subscriber::fmt::layer().pretty())
                    .init();
            }
        }
        Ok(None)
    }
}
