use async_trait::async_trait;
use meshcall_core::RoomId;

/// Hook for the external room directory that owns room validity.
#[async_trait]
pub trait RoomPolicy: Send + Sync + 'static {
    async fn allows(&self, room_id: &RoomId) -> bool;
}

/// Accepts every non-blank room id. Rooms are not persisted here.
pub struct OpenRooms;

#[async_trait]
impl RoomPolicy for OpenRooms {
    async fn allows(&self, room_id: &RoomId) -> bool {
        !room_id.as_str().trim().is_empty()
    }
}
