use meshcall_core::RoomId;

use crate::integration::{create_test_service, init_tracing};
use crate::utils::TestConnection;

#[tokio::test]
async fn test_single_peer_joins_room() {
    init_tracing();

    let service = create_test_service();
    let mut alice = TestConnection::open(&service, "1").await;

    let roster = alice.join("r1").await;
    assert!(roster.is_empty(), "First member sees an empty roster");

    let room_id = RoomId::from("r1");
    assert!(service.rooms().contains(&room_id));

    let participants = service
        .rooms()
        .participants(&room_id)
        .await
        .expect("Room should be live");
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0].user_id, alice.user_id);

    alice.assert_silent().await;
}
