use meshcall_client::LinkState;
use meshcall_core::{ClientMessage, Participant, ServerMessage, UserId};

use crate::integration::init_tracing;
use crate::utils::{MockTransportFactory, TransportCall, start_bare, wait_for_peers};
use meshcall_client::SdpKind;

#[tokio::test]
async fn test_unexpected_signals_ignored() {
    init_tracing();

    let transports = MockTransportFactory::default();
    let mut client = start_bare("2", transports.clone()).await;

    client.push(ServerMessage::RosterSnapshot {
        room_id: "r1".into(),
        participants: vec![
            Participant::new("1", "User 1"),
            Participant::new("3", "User 3"),
        ],
    });

    // We initiate towards "3" only.
    match client.expect_sent().await {
        ClientMessage::Offer { target_user_id, .. } => {
            assert_eq!(target_user_id, UserId::from("3"))
        }
        other => panic!("Expected Offer, got {:?}", other),
    }
    assert!(matches!(
        client.expect_sent().await,
        ClientMessage::IceCandidate { .. }
    ));

    // Answer to a responder that never offered.
    client.push(ServerMessage::Answer {
        sender_user_id: UserId::from("1"),
        sdp: "answer".to_string(),
    });
    // Offer from the side that should be answering.
    client.push(ServerMessage::Offer {
        sender_user_id: UserId::from("3"),
        sdp: "offer".to_string(),
    });
    client.assert_quiet().await;

    // A candidate ahead of the offer waits for it.
    client.push(ServerMessage::IceCandidate {
        sender_user_id: UserId::from("1"),
        candidate: "early".to_string(),
    });
    client.push(ServerMessage::Offer {
        sender_user_id: UserId::from("1"),
        sdp: "offer".to_string(),
    });
    assert!(matches!(
        client.expect_sent().await,
        ClientMessage::Answer { .. }
    ));

    // A duplicate offer is dropped.
    client.push(ServerMessage::Offer {
        sender_user_id: UserId::from("1"),
        sdp: "offer".to_string(),
    });
    client.assert_quiet().await;

    let to_one = transports.link_to("1");
    assert_eq!(
        to_one.calls(),
        vec![
            TransportCall::RemoteDescription(SdpKind::Offer),
            TransportCall::Candidate("early".to_string()),
            TransportCall::CreateAnswer,
        ]
    );

    let to_three = transports.link_to("3");
    assert_eq!(to_three.count(&TransportCall::CreateAnswer), 0);
    assert!(!to_three.is_closed());

    let peers = wait_for_peers(&client.handle, |peers| {
        peers
            .get(&UserId::from("1"))
            .is_some_and(|p| p.link_state == LinkState::Connected)
    })
    .await;
    assert_eq!(peers[&UserId::from("3")].link_state, LinkState::Negotiating);
}
