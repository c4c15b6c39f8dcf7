use meshcall_core::ServerMessage;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{TestConnection, ice, offer};

#[tokio::test]
async fn test_ice_candidates_keep_order() {
    init_tracing();

    let service = create_test_service();
    let mut alice = TestConnection::open(&service, "1").await;
    let mut bob = TestConnection::open(&service, "2").await;
    alice.join("r1").await;
    bob.join("r1").await;
    alice.recv().await;

    alice.send(offer("2", "v=0")).await;
    for i in 0..50 {
        alice.send(ice("2", &format!("candidate:{}", i))).await;
    }

    assert!(matches!(bob.recv().await, ServerMessage::Offer { .. }));
    for i in 0..50 {
        match bob.recv().await {
            ServerMessage::IceCandidate { candidate, .. } => {
                assert_eq!(candidate, format!("candidate:{}", i));
            }
            other => panic!("Expected IceCandidate #{}, got {:?}", i, other),
        }
    }
}
