use meshcall_client::{CallEvent, EngineError};
use meshcall_core::{ClientMessage, Participant, RoomId, ServerMessage, UserId};

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{
    MockTransportFactory, eventually, join_call, start_bare, wait_connected, wait_for_event,
    wait_for_peers,
};

#[tokio::test]
async fn test_leave_closes_everything() {
    init_tracing();

    let service = create_test_service();
    let a = join_call(&service, "1", "r1").await;
    let b = join_call(&service, "2", "r1").await;
    let c = join_call(&service, "3", "r1").await;
    wait_connected(&a.handle, &["2", "3"]).await;
    wait_connected(&c.handle, &["1", "2"]).await;

    a.handle.share_screen().await.unwrap();

    let transports = a.transports.clone();
    let devices = a.devices.clone();
    let sent = a.sent.clone();
    let peers = a.handle.peers();

    a.handle.leave().await.unwrap();

    // Everything is released by the time leave returns.
    assert_eq!(transports.links().len(), 2);
    assert!(transports.links().iter().all(|l| l.is_closed()));
    assert!(devices.live_tracks().is_empty());
    assert!(peers.borrow().is_empty());

    assert!(
        eventually(
            || matches!(sent.all().last(), Some(ClientMessage::LeaveRoom)),
            1000
        )
        .await
    );

    for other in [&b, &c] {
        wait_for_peers(&other.handle, |peers| {
            !peers.contains_key(&UserId::from("1"))
        })
        .await;
    }
    let room_id = RoomId::from("r1");
    let remaining = service.rooms().participants(&room_id).await.unwrap();
    assert_eq!(remaining.len(), 2);

    b.handle.leave().await.unwrap();
    c.handle.leave().await.unwrap();
    let rooms = service.rooms().clone();
    assert!(eventually(|| !rooms.contains(&room_id), 1000).await);
}

#[tokio::test]
async fn test_lost_signaling_stops_engine() {
    init_tracing();

    let transports = MockTransportFactory::default();
    let mut client = start_bare("1", transports.clone()).await;
    client.push(ServerMessage::RosterSnapshot {
        room_id: "r1".into(),
        participants: vec![Participant::new("2", "User 2")],
    });
    assert!(matches!(client.expect_sent().await, ClientMessage::Offer { .. }));

    client.close_signaling();
    wait_for_event(&mut client.handle, |e| *e == CallEvent::Disconnected).await;

    let devices = client.devices.clone();
    assert!(
        eventually(|| devices.live_tracks().is_empty(), 1000).await,
        "Devices stay open after the engine stopped"
    );
    assert!(transports.link_to("2").is_closed());

    assert_eq!(
        client.handle.set_audio_enabled(false).await,
        Err(EngineError::Stopped)
    );
    assert_eq!(client.handle.leave().await, Err(EngineError::Stopped));
}
