//! Registry control surface and collaborator wiring

mod common;

use std::io::Write;
use std::time::Duration;

use common::{Event, RecordingListener, Session, STEP};
use headunit_services::config::Config;
use headunit_services::platform::{DeviceEvent, DisplayRect};
use headunit_services::protocol::av::{
    AvChannelSetupRequest, AvChannelStartIndication, AvChannelStopIndication, AvMediaIndication,
    AvOutbound,
};
use headunit_services::protocol::bluetooth::{
    BluetoothOutbound, BluetoothPairingMethod, BluetoothPairingRequest,
};
use headunit_services::protocol::input::{
    BindingRequest, ButtonCode, InputEvent, InputOutbound, TouchAction,
};
use headunit_services::protocol::{ChannelId, OutboundMessage, Status};
use tempfile::NamedTempFile;

async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    tokio::time::timeout(STEP, async {
        while !check() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .is_ok()
}

#[tokio::test]
async fn test_resize_reaches_video_and_input() {
    let session = Session::started(Config::default()).await;
    session.messenger.deliver(
        ChannelId::Input,
        BindingRequest {
            scan_codes: vec![ButtonCode::Enter.scan_code()],
        },
    );
    assert!(eventually(|| session.platform.input.is_started()).await);

    // projection now occupies the right half of a 1600x480 screen
    let area = DisplayRect::new(800, 0, 800, 480);
    session.platform.display.set_area(area);
    session.registry.resize();

    assert!(eventually(|| session.platform.video.area() == Some(area)).await);
    assert_eq!(session.registry.display_area(), area);

    session.platform.input.inject(DeviceEvent::Touch {
        action: TouchAction::Press,
        x: 1200,
        y: 240,
        pointer_id: 0,
    });
    assert!(session.messenger.wait_for_sent(ChannelId::Input, 2, STEP).await);

    let touch = session
        .sent_on(ChannelId::Input)
        .into_iter()
        .find_map(|m| match m {
            OutboundMessage::Input(InputOutbound::EventIndication(ind)) => match ind.event {
                InputEvent::Touch(touch) => Some(touch),
                _ => None,
            },
            _ => None,
        })
        .expect("touch event");
    assert_eq!(touch.action, TouchAction::Press);
    assert_eq!((touch.locations[0].x, touch.locations[0].y), (400, 240));
}

#[tokio::test]
async fn test_bluetooth_pairing() {
    let mut config = Config::default();
    config.bluetooth.adapter_address = Some("00:11:22:33:44:55".to_string());
    let session = Session::started(config).await;
    let listener = RecordingListener::new();
    session.registry.set_status_listener(Some(listener.clone()));

    if let Some(device) = &session.platform.bluetooth {
        device.pair("AA:BB:CC:DD:EE:FF");
    }
    session.messenger.deliver(
        ChannelId::Bluetooth,
        BluetoothPairingRequest {
            phone_address: "aa:bb:cc:dd:ee:ff".to_string(),
            pairing_method: BluetoothPairingMethod::Hfp,
        },
    );
    assert!(session.messenger.wait_for_sent(ChannelId::Bluetooth, 1, STEP).await);

    match session.sent_on(ChannelId::Bluetooth).as_slice() {
        [OutboundMessage::Bluetooth(BluetoothOutbound::PairingResponse(response))] => {
            assert!(response.already_paired);
            assert_eq!(response.status, Status::Ok);
        }
        other => panic!("unexpected bluetooth traffic: {:?}", other),
    }
    assert_eq!(
        listener.events(),
        vec![Event::Pairing("aa:bb:cc:dd:ee:ff".to_string())]
    );
}

#[tokio::test]
async fn test_audio_stream_lifecycle() {
    let session = Session::started(Config::default()).await;
    let channel = ChannelId::MediaAudio;

    session
        .messenger
        .deliver(channel, AvChannelSetupRequest { config_index: 0 });
    session.messenger.deliver(
        channel,
        AvChannelStartIndication {
            session: 3,
            config: 0,
        },
    );
    for _ in 0..3 {
        session.messenger.deliver(
            channel,
            AvMediaIndication {
                timestamp: Some(0),
                data: bytes::Bytes::from_static(&[0; 64]),
            },
        );
    }
    assert!(session.messenger.wait_for_sent(channel, 4, STEP).await);
    assert!(session.platform.media_audio.is_playing());
    assert_eq!(session.platform.media_audio.frames(), 3);

    let acks = session
        .sent_on(channel)
        .into_iter()
        .filter(|m| matches!(m, OutboundMessage::Av(AvOutbound::MediaAck(ack)) if ack.session == 3))
        .count();
    assert_eq!(acks, 3);

    session.messenger.deliver(channel, AvChannelStopIndication);
    assert!(eventually(|| !session.platform.media_audio.is_playing()).await);
    assert!(!session.platform.speech_audio.is_playing());
}

#[tokio::test]
async fn test_session_from_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[head_unit]
name = "Test Car"

[navigation]
enabled = false

[audio]
speech_channel = false

[session]
night_mode = true
"#
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    let session = Session::started(config).await;

    let response = session.registry.discovery_response(&session.services);
    assert_eq!(response.head_unit_name, "Test Car");
    assert!(response.channel(ChannelId::Navigation).is_none());
    assert!(response.channel(ChannelId::SpeechAudio).is_none());
    assert!(session.registry.night_mode());
}

#[tokio::test]
async fn test_stats_report_every_service() {
    let session = Session::started(Config::default()).await;
    session.open(ChannelId::Sensor, 1).await;
    assert!(
        eventually(|| {
            session
                .services
                .get(ChannelId::Sensor)
                .is_some_and(|s| s.stats().sent == 1)
        })
        .await
    );

    let stats = session.services.stats();
    assert_eq!(stats.len(), session.services.len());

    let json = serde_json::to_value(&stats).unwrap();
    let sensor = json
        .as_array()
        .and_then(|all| all.iter().find(|s| s["service"] == "SensorService"))
        .cloned()
        .unwrap();
    assert_eq!(sensor["sent"], 1);
    assert_eq!(sensor["received"], 1);
}

#[tokio::test]
async fn test_second_session_replaces_links() {
    let first = Session::started(Config::default()).await;
    let first_id = first.registry.session_id();

    let messenger = std::sync::Arc::new(headunit_services::messenger::LoopbackMessenger::new());
    let services = first.registry.create(messenger.clone());
    services.start_all().unwrap();
    assert_ne!(first.registry.session_id(), first_id);

    first.registry.set_night_mode(true);
    messenger.deliver(
        ChannelId::Sensor,
        headunit_services::protocol::sensor::SensorStartRequest {
            sensor_type: headunit_services::protocol::sensor::SensorType::NightData,
            refresh_interval: 0,
        },
    );
    assert!(messenger.wait_for_sent(ChannelId::Sensor, 2, STEP).await);
    assert!(first.sent_on(ChannelId::Sensor).is_empty());
}
