use meshcall_core::ServerMessage;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{TestConnection, offer};

#[tokio::test]
async fn test_malformed_frame_keeps_connection() {
    init_tracing();

    let service = create_test_service();
    let mut alice = TestConnection::open(&service, "1").await;
    let mut bob = TestConnection::open(&service, "2").await;
    alice.join("r1").await;
    bob.join("r1").await;
    alice.recv().await; // PresenceJoined(bob)

    alice.send_text("{this is not json").await;
    match alice.recv().await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "undecodable"),
        other => panic!("Expected Error, got {:?}", other),
    }

    alice.send(offer("2", "")).await;
    match alice.recv().await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "empty_payload"),
        other => panic!("Expected Error, got {:?}", other),
    }

    alice.send(offer("1", "v=0")).await;
    match alice.recv().await {
        ServerMessage::Error { code, .. } => assert_eq!(code, "self_target"),
        other => panic!("Expected Error, got {:?}", other),
    }

    // Nothing malformed reached bob.
    bob.assert_silent().await;

    alice
        .send_text(r#"{"op":"Offer","d":{"target_user_id":"2","sdp":"v=0"}}"#)
        .await;
    assert_eq!(
        bob.recv().await,
        ServerMessage::Offer {
            sender_user_id: alice.user_id.clone(),
            sdp: "v=0".to_string(),
        }
    );
}
