use meshcall_core::ServerMessage;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::TestConnection;

#[tokio::test]
async fn test_room_isolation() {
    init_tracing();

    let service = create_test_service();
    let mut a = TestConnection::open(&service, "1").await;
    let mut b = TestConnection::open(&service, "2").await;
    let mut c = TestConnection::open(&service, "3").await;

    a.join("r1").await;
    assert!(c.join("r2").await.is_empty());
    b.join("r1").await;

    assert!(matches!(a.recv().await, ServerMessage::PresenceJoined { .. }));
    c.assert_silent().await;
    assert_eq!(service.rooms().room_count(), 2);

    // Switching rooms leaves the old one first.
    b.join("r2").await;
    assert!(matches!(a.recv().await, ServerMessage::PresenceLeft { .. }));
    assert!(matches!(c.recv().await, ServerMessage::PresenceJoined { .. }));
}
