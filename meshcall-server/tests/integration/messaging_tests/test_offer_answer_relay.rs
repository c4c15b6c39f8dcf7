use meshcall_core::ServerMessage;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{TestConnection, answer, ice, offer};

#[tokio::test]
async fn test_offer_answer_relay() {
    init_tracing();

    let service = create_test_service();
    let mut alice = TestConnection::open(&service, "1").await;
    let mut bob = TestConnection::open(&service, "2").await;

    alice.join("r1").await;
    let roster = bob.join("r1").await;
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].user_id, alice.user_id);
    alice.recv().await; // PresenceJoined(bob)

    alice.send(offer("2", "offer-sdp")).await;
    assert_eq!(
        bob.recv().await,
        ServerMessage::Offer {
            sender_user_id: alice.user_id.clone(),
            sdp: "offer-sdp".to_string(),
        }
    );

    bob.send(answer("1", "answer-sdp")).await;
    assert_eq!(
        alice.recv().await,
        ServerMessage::Answer {
            sender_user_id: bob.user_id.clone(),
            sdp: "answer-sdp".to_string(),
        }
    );

    bob.send(ice("1", "candidate:1 1 udp 2122260223 10.0.0.2 50000 typ host"))
        .await;
    match alice.recv().await {
        ServerMessage::IceCandidate {
            sender_user_id,
            candidate,
        } => {
            assert_eq!(sender_user_id, bob.user_id);
            assert!(candidate.starts_with("candidate:1"));
        }
        other => panic!("Expected IceCandidate, got {:?}", other),
    }

    // Relays go to the target only.
    alice.assert_silent().await;
    bob.assert_silent().await;
}
