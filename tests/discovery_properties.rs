//! Discovery advertises exactly the registered services

use proptest::prelude::*;
use std::collections::BTreeSet;
use std::sync::{Arc, Weak};

use headunit_services::channel::{Channel, ChannelEnv, ChannelSettings};
use headunit_services::config::Config;
use headunit_services::listener::ListenerSlot;
use headunit_services::messenger::LoopbackMessenger;
use headunit_services::platform::headless::HeadlessPlatform;
use headunit_services::protocol::{ChannelId, ServiceDiscoveryResponse};
use headunit_services::services::{
    AudioService, BluetoothService, InputService, MediaStatusService, NavigationStatusService,
    SensorService, Service, ServiceList, ServiceRegistry, VideoService,
};

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// Every service kind, built idle against a throwaway session
fn all_services(env: &ChannelEnv, platform: &HeadlessPlatform) -> Vec<Service> {
    let config = Config::default();
    let bluetooth = platform
        .bluetooth
        .clone()
        .expect("bluetooth configured for this fixture");
    vec![
        Service::Audio(Channel::new(AudioService::media(platform.media_audio.clone()), env)),
        Service::Audio(Channel::new(AudioService::speech(platform.speech_audio.clone()), env)),
        Service::Audio(Channel::new(AudioService::system(platform.system_audio.clone()), env)),
        Service::Sensor(Channel::new(SensorService::new(&config.sensor, false), env)),
        Service::Video(Channel::new(
            VideoService::new(platform.video.clone(), config.video.video_config(), None),
            env,
        )),
        Service::Bluetooth(Channel::new(
            BluetoothService::new(bluetooth, "00:11:22:33:44:55"),
            env,
        )),
        Service::Input(Channel::new(
            InputService::new(
                &config.input,
                platform.input.clone(),
                (800, 480),
                config.session.display_area,
                Weak::new(),
            ),
            env,
        )),
        Service::Navigation(Channel::new(NavigationStatusService::new(&config.navigation), env)),
        Service::MediaStatus(Channel::new(MediaStatusService::new(), env)),
    ]
}

fn advertised(services: &ServiceList) -> Vec<u32> {
    let mut response = ServiceDiscoveryResponse::default();
    services.fill_features(&mut response);
    response.channel_ids()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_discovery_matches_registration(
        order in Just((0..9usize).collect::<Vec<_>>()).prop_shuffle(),
        keep in proptest::collection::vec(any::<bool>(), 9),
    ) {
        let rt = runtime();
        let env = ChannelEnv {
            runtime: rt.handle().clone(),
            messenger: Arc::new(LoopbackMessenger::new()),
            listener: ListenerSlot::new(),
            settings: ChannelSettings::default(),
            session: uuid::Uuid::new_v4(),
        };
        let platform = HeadlessPlatform::new(Default::default(), Some("00:11:22:33:44:55"));

        let mut pool: Vec<Option<Service>> = all_services(&env, &platform).into_iter().map(Some).collect();
        let mut services = ServiceList::new();
        for index in order {
            if !keep[index] {
                continue;
            }
            if let Some(service) = pool[index].take() {
                services.push(service).unwrap();
            }
        }

        let registered: Vec<u32> = services.channel_ids().iter().map(|c| c.as_u32()).collect();
        let ids = advertised(&services);

        // same ids, same order, no duplicates
        prop_assert_eq!(&ids, &registered);
        let unique: BTreeSet<u32> = ids.iter().copied().collect();
        prop_assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn prop_registry_discovery_follows_config(
        navigation in any::<bool>(),
        media_status in any::<bool>(),
        media_channel in any::<bool>(),
        speech_channel in any::<bool>(),
        bluetooth in any::<bool>(),
    ) {
        let rt = runtime();
        let mut config = Config::default();
        config.navigation.enabled = navigation;
        config.media_status.enabled = media_status;
        config.audio.media_channel = media_channel;
        config.audio.speech_channel = speech_channel;
        if bluetooth {
            config.bluetooth.adapter_address = Some("00:11:22:33:44:55".to_string());
        }

        let platform = HeadlessPlatform::new(
            config.session.display_area,
            config.bluetooth.adapter_address.as_deref(),
        );
        let registry = ServiceRegistry::new(rt.handle().clone(), Arc::new(config), platform.platform());
        let services = registry.create(Arc::new(LoopbackMessenger::new()));
        let response = registry.discovery_response(&services);

        let expected: Vec<u32> = services.channel_ids().iter().map(|c| c.as_u32()).collect();
        prop_assert_eq!(response.channel_ids(), expected);
        prop_assert_eq!(response.channel(ChannelId::Navigation).is_some(), navigation);
        prop_assert_eq!(response.channel(ChannelId::MediaStatus).is_some(), media_status);
        prop_assert_eq!(response.channel(ChannelId::MediaAudio).is_some(), media_channel);
        prop_assert_eq!(response.channel(ChannelId::SpeechAudio).is_some(), speech_channel);
        prop_assert_eq!(response.channel(ChannelId::Bluetooth).is_some(), bluetooth);
        prop_assert!(response.channel(ChannelId::Sensor).is_some());
        prop_assert!(response.channel(ChannelId::Video).is_some());
        prop_assert!(response.channel(ChannelId::Input).is_some());
        prop_assert!(response.channel(ChannelId::SystemAudio).is_some());
    }
}

#[test]
fn test_duplicate_channel_is_rejected() {
    let rt = runtime();
    let env = ChannelEnv {
        runtime: rt.handle().clone(),
        messenger: Arc::new(LoopbackMessenger::new()),
        listener: ListenerSlot::new(),
        settings: ChannelSettings::default(),
        session: uuid::Uuid::new_v4(),
    };
    let config = Config::default();

    let mut services = ServiceList::new();
    services
        .push(Service::Navigation(Channel::new(
            NavigationStatusService::new(&config.navigation),
            &env,
        )))
        .unwrap();
    let duplicate = services.push(Service::Navigation(Channel::new(
        NavigationStatusService::new(&config.navigation),
        &env,
    )));

    assert!(duplicate.is_err());
    assert_eq!(advertised(&services), vec![ChannelId::Navigation.as_u32()]);
}
