use meshcall_client::{CallEvent, LinkState};
use meshcall_core::{MediaStateEvent, RoomId, ServerMessage, UserId};

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{
    MockTransportFactory, join_call, start_bare, wait_connected, wait_for_event, wait_for_peers,
};

#[tokio::test]
async fn test_peer_left_removed() {
    init_tracing();

    let service = create_test_service();
    let mut a = join_call(&service, "1", "r1").await;
    let b = join_call(&service, "2", "r1").await;
    let c = join_call(&service, "3", "r1").await;
    wait_connected(&a.handle, &["2", "3"]).await;
    wait_connected(&b.handle, &["1", "3"]).await;
    wait_connected(&c.handle, &["1", "2"]).await;

    c.handle.leave().await.unwrap();

    wait_for_event(&mut a.handle, |e| {
        *e == CallEvent::PeerLeft {
            user_id: UserId::from("3"),
        }
    })
    .await;

    for (client, other) in [(&a, "2"), (&b, "1")] {
        let peers = wait_for_peers(&client.handle, |peers| {
            !peers.contains_key(&UserId::from("3"))
        })
        .await;
        assert_eq!(peers.len(), 1);
        assert_eq!(peers[&UserId::from(other)].link_state, LinkState::Connected);
        assert!(client.transports.link_to("3").is_closed());
        assert!(!client.transports.link_to(other).is_closed());
    }

    // A rejoin under the same id builds a fresh link.
    let _c = join_call(&service, "3", "r1").await;
    wait_connected(&a.handle, &["2", "3"]).await;
    assert_eq!(a.transports.links_to("3").len(), 2);
}

#[tokio::test]
async fn test_left_drops_media_of_unseen_peer() {
    init_tracing();

    let client = start_bare("1", MockTransportFactory::default()).await;
    client.push(ServerMessage::RosterSnapshot {
        room_id: RoomId::from("r1"),
        participants: Vec::new(),
    });

    // Media state for a peer we never saw join, then its departure.
    client.push(ServerMessage::MediaState(MediaStateEvent {
        user_id: UserId::from("9"),
        audio_enabled: false,
        video_enabled: false,
        screen_sharing: true,
    }));
    client.push(ServerMessage::PresenceLeft {
        user_id: UserId::from("9"),
    });
    client.push(ServerMessage::PresenceJoined {
        user_id: UserId::from("9"),
        display_name: "User 9".to_string(),
    });

    let peers = wait_for_peers(&client.handle, |peers| {
        peers.contains_key(&UserId::from("9"))
    })
    .await;
    let view = &peers[&UserId::from("9")];
    assert!(view.audio_enabled);
    assert!(view.video_enabled);
    assert!(!view.screen_sharing);
}
