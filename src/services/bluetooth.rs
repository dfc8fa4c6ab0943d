//! Bluetooth Service
//!
//! Lets the phone pair with the head unit's adapter for calls and audio.

use async_trait::async_trait;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::info;

use crate::channel::{ChannelContext, ChannelHandler, Result};
use crate::platform::BluetoothDevice;
use crate::protocol::bluetooth::{
    BluetoothMessage, BluetoothPairingMethod, BluetoothPairingRequest, BluetoothPairingResponse,
};
use crate::protocol::discovery::BluetoothChannel;
use crate::protocol::{ChannelDescriptor, ChannelId, ChannelPayload, InboundMessage, Status};

/// Handler for the bluetooth channel
pub struct BluetoothService {
    device: Arc<dyn BluetoothDevice>,
    adapter_address: String,
}

impl BluetoothService {
    pub fn new(device: Arc<dyn BluetoothDevice>, adapter_address: impl Into<String>) -> Self {
        Self {
            device,
            adapter_address: adapter_address.into(),
        }
    }

    async fn on_pairing_request(
        &mut self,
        ctx: &ChannelContext,
        request: BluetoothPairingRequest,
    ) -> Result<()> {
        info!(
            "[{}] Pairing Request, Address: {}, Method: {:?}",
            Self::NAME,
            request.phone_address,
            request.pairing_method
        );
        ctx.notify(|l| l.bluetooth_pairing_requested(&request));

        let already_paired = self.device.is_paired(&request.phone_address);
        info!("[{}] Already Paired: {}", Self::NAME, already_paired);

        ctx.send(BluetoothPairingResponse {
            already_paired,
            status: Status::Ok,
        })
        .await
    }
}

#[async_trait]
impl ChannelHandler for BluetoothService {
    type Command = Infallible;
    const NAME: &'static str = "BluetoothService";

    fn channel_id(&self) -> ChannelId {
        ChannelId::Bluetooth
    }

    fn descriptor(&self) -> ChannelDescriptor {
        ChannelDescriptor::new(
            ChannelId::Bluetooth,
            ChannelPayload::Bluetooth(BluetoothChannel {
                adapter_address: self.adapter_address.clone(),
                supported_pairing_methods: vec![
                    BluetoothPairingMethod::A2dp,
                    BluetoothPairingMethod::Hfp,
                ],
            }),
        )
    }

    async fn on_message(&mut self, ctx: &ChannelContext, message: InboundMessage) -> Result<()> {
        match message {
            InboundMessage::Bluetooth(BluetoothMessage::PairingRequest(request)) => {
                self.on_pairing_request(ctx, request).await
            }
            other => Err(ctx.unexpected(&other)),
        }
    }

    async fn on_command(&mut self, _ctx: &ChannelContext, command: Infallible) -> Result<()> {
        match command {}
    }
}
