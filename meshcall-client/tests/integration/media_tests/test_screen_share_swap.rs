use meshcall_client::{CallEvent, LinkState, TrackKind};
use meshcall_core::{CaptureSource, UserId};

use crate::integration::{create_test_service, init_tracing};
use crate::utils::{join_call, wait_connected, wait_for_event, wait_for_peers};

#[tokio::test]
async fn test_screen_share_swap() {
    init_tracing();

    let service = create_test_service();
    let mut a = join_call(&service, "1", "r1").await;
    let b = join_call(&service, "2", "r1").await;
    let c = join_call(&service, "3", "r1").await;
    wait_connected(&a.handle, &["2", "3"]).await;
    wait_connected(&b.handle, &["1", "3"]).await;
    wait_connected(&c.handle, &["1", "2"]).await;

    let offers_before = a.sent.offers() + b.sent.offers() + c.sent.offers();
    let camera = a.handle.local_media().borrow().clone();

    a.handle.share_screen().await.unwrap();
    wait_for_event(&mut a.handle, |e| {
        *e == CallEvent::SourceChanged {
            source: CaptureSource::Screen,
        }
    })
    .await;

    let screen = a.devices.last_screen();
    for remote in ["2", "3"] {
        let link = a.transports.link_to(remote);
        assert_eq!(link.replaced_tracks(), vec![screen.id().to_string()]);
        assert!(!link.is_closed());
    }

    for watcher in [&b, &c] {
        let peers = wait_for_peers(&watcher.handle, |peers| {
            peers
                .get(&UserId::from("1"))
                .is_some_and(|p| p.screen_sharing)
        })
        .await;
        assert_eq!(peers[&UserId::from("1")].link_state, LinkState::Connected);
    }

    // Back to the camera: a fresh camera track replaces the screen.
    a.handle.stop_screen_share().await.unwrap();
    let local = a.handle.local_media().borrow().clone();
    assert_eq!(local.source, CaptureSource::Camera);
    assert_ne!(local.video_track_id, camera.video_track_id);
    assert_eq!(local.audio_track_id, camera.audio_track_id);

    for remote in ["2", "3"] {
        let replaced = a.transports.link_to(remote).replaced_tracks();
        assert_eq!(replaced.len(), 2);
        assert_eq!(replaced[1], local.video_track_id);
    }
    for watcher in [&b, &c] {
        wait_for_peers(&watcher.handle, |peers| {
            peers
                .get(&UserId::from("1"))
                .is_some_and(|p| !p.screen_sharing && p.link_state == LinkState::Connected)
        })
        .await;
    }

    // Exactly one outgoing video source, microphone untouched.
    let live_video = a.devices.live_video_tracks();
    assert_eq!(live_video.len(), 1);
    assert_eq!(live_video[0].id(), local.video_track_id);
    assert!(!screen.is_live());
    let live_audio: Vec<_> = a
        .devices
        .live_tracks()
        .into_iter()
        .filter(|t| t.kind() == TrackKind::Audio)
        .collect();
    assert_eq!(live_audio.len(), 1);

    // No negotiation round and no new transports.
    assert_eq!(
        a.sent.offers() + b.sent.offers() + c.sent.offers(),
        offers_before
    );
    assert_eq!(a.transports.links().len(), 2);
}

#[tokio::test]
async fn test_switch_without_links() {
    init_tracing();

    let service = create_test_service();
    let a = join_call(&service, "1", "r1").await;

    a.handle.share_screen().await.unwrap();
    // Switching to the active source again changes nothing.
    a.handle.share_screen().await.unwrap();

    let local = a.handle.local_media().borrow().clone();
    assert_eq!(local.source, CaptureSource::Screen);
    assert_eq!(local.video_track_id, a.devices.last_screen().id());
    assert_eq!(a.devices.live_video_tracks().len(), 1);

    // A later peer gets the screen as its initial video track.
    let _b = join_call(&service, "2", "r1").await;
    wait_connected(&a.handle, &["2"]).await;
    assert!(
        a.transports
            .link_to("2")
            .initial_tracks
            .contains(&local.video_track_id)
    );
}
