//! Sensor Service
//!
//! Advertises the sensors the head unit can report, answers the phone's start
//! requests and pushes readings for every started sensor. Which sensors are
//! currently reporting is published through a [`SensorActivity`] record that
//! other services observe weakly.

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::channel::{ChannelContext, ChannelHandler, Result};
use crate::config::SensorConfig;
use crate::protocol::discovery::SensorChannel;
use crate::protocol::sensor::{
    DrivingStatus, SensorEventIndication, SensorMessage, SensorReading, SensorStartRequest,
    SensorStartResponse, SensorType,
};
use crate::protocol::{ChannelDescriptor, ChannelId, ChannelPayload, InboundMessage, Status};

/// Commands the registry posts to the sensor lane
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorCommand {
    /// Head unit switched between day and night
    SetNightMode(bool),
}

/// Which sensors the phone has started
#[derive(Debug, Default)]
pub struct SensorActivity {
    reporting: RwLock<BTreeSet<SensorType>>,
}

impl SensorActivity {
    /// Whether `sensor` is being reported
    pub fn is_reporting(&self, sensor: SensorType) -> bool {
        self.reporting.read().contains(&sensor)
    }

    /// Every sensor currently reported
    pub fn reporting(&self) -> Vec<SensorType> {
        self.reporting.read().iter().copied().collect()
    }

    fn mark(&self, sensor: SensorType) {
        self.reporting.write().insert(sensor);
    }

    fn clear(&self) {
        self.reporting.write().clear();
    }
}

/// Handler for the sensor channel
#[derive(Debug)]
pub struct SensorService {
    sensors: Vec<SensorType>,
    night_mode: bool,
    night_report_interval: Option<Duration>,
    activity: Arc<SensorActivity>,
}

impl SensorService {
    pub fn new(config: &SensorConfig, night_mode: bool) -> Self {
        let mut sensors = vec![SensorType::DrivingStatus, SensorType::NightData];
        if config.location {
            sensors.push(SensorType::Location);
        }
        Self {
            sensors,
            night_mode,
            night_report_interval: config.night_report_interval(),
            activity: Arc::new(SensorActivity::default()),
        }
    }

    /// Shared record of the sensors being reported
    pub fn activity(&self) -> Arc<SensorActivity> {
        self.activity.clone()
    }

    async fn on_start_request(
        &mut self,
        ctx: &ChannelContext,
        request: SensorStartRequest,
    ) -> Result<()> {
        info!(
            "[{}] Sensor Start Request, Type: {}, Refresh Interval: {}",
            Self::NAME,
            request.sensor_type.name(),
            request.refresh_interval
        );
        ctx.notify(|l| l.sensor_start_requested(&request));

        let status = if self.sensors.contains(&request.sensor_type) {
            Status::Ok
        } else {
            warn!(
                "[{}] {} is not advertised",
                Self::NAME,
                request.sensor_type.name()
            );
            Status::Fail
        };
        info!("[{}] Sensor Start Response, Status: {}", Self::NAME, status);
        ctx.send(SensorStartResponse { status }).await?;

        if status != Status::Ok {
            return Ok(());
        }

        self.activity.mark(request.sensor_type);
        match request.sensor_type {
            SensorType::DrivingStatus => {
                self.report(ctx, SensorReading::DrivingStatus(DrivingStatus::Unrestricted))
                    .await
            }
            SensorType::NightData => self.report(ctx, SensorReading::NightMode(self.night_mode)).await,
            other => {
                debug!("[{}] no source for {}, nothing to report yet", Self::NAME, other.name());
                Ok(())
            }
        }
    }

    async fn report(&self, ctx: &ChannelContext, reading: SensorReading) -> Result<()> {
        debug!("[{}] reporting {:?}", Self::NAME, reading);
        ctx.send(SensorEventIndication::single(reading)).await
    }
}

#[async_trait]
impl ChannelHandler for SensorService {
    type Command = SensorCommand;
    const NAME: &'static str = "SensorService";

    fn channel_id(&self) -> ChannelId {
        ChannelId::Sensor
    }

    fn descriptor(&self) -> ChannelDescriptor {
        ChannelDescriptor::new(
            ChannelId::Sensor,
            ChannelPayload::Sensor(SensorChannel {
                sensors: self.sensors.clone(),
            }),
        )
    }

    fn tick_interval(&self) -> Option<Duration> {
        self.night_report_interval
    }

    async fn on_message(&mut self, ctx: &ChannelContext, message: InboundMessage) -> Result<()> {
        match message {
            InboundMessage::Sensor(SensorMessage::StartRequest(request)) => {
                self.on_start_request(ctx, request).await
            }
            other => Err(ctx.unexpected(&other)),
        }
    }

    async fn on_command(&mut self, ctx: &ChannelContext, command: SensorCommand) -> Result<()> {
        match command {
            SensorCommand::SetNightMode(night_mode) => {
                info!("[{}] Night mode: {}", Self::NAME, night_mode);
                self.night_mode = night_mode;
                if self.activity.is_reporting(SensorType::NightData) {
                    self.report(ctx, SensorReading::NightMode(night_mode)).await?;
                }
                Ok(())
            }
        }
    }

    async fn on_tick(&mut self, ctx: &ChannelContext) -> Result<()> {
        if self.activity.is_reporting(SensorType::NightData) {
            self.report(ctx, SensorReading::NightMode(self.night_mode)).await?;
        }
        Ok(())
    }

    async fn on_stop(&mut self, _ctx: &ChannelContext) {
        self.activity.clear();
    }
}
