use meshcall_client::{CallConfig, CallEvent, LinkError, LinkState};
use meshcall_core::{ClientMessage, Participant, ServerMessage, UserId};
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{MockTransportFactory, start_bare_with, wait_for_event};

fn short_deadline() -> CallConfig {
    CallConfig {
        negotiation_timeout: Duration::from_secs(1),
        ..Default::default()
    }
}

fn roster(users: &[&str]) -> ServerMessage {
    ServerMessage::RosterSnapshot {
        room_id: "r1".into(),
        participants: users
            .iter()
            .map(|u| Participant::new(*u, format!("User {}", u)))
            .collect(),
    }
}

#[tokio::test(start_paused = true)]
async fn test_unanswered_offer_times_out() {
    init_tracing();

    let transports = MockTransportFactory::default();
    transports.set_manual_connect(true);
    let mut client = start_bare_with("1", transports.clone(), short_deadline()).await;

    client.push(roster(&["2"]));
    assert!(matches!(client.expect_sent().await, ClientMessage::Offer { .. }));

    let event = wait_for_event(&mut client.handle, |e| {
        matches!(e, CallEvent::LinkFailed { .. })
    })
    .await;
    assert_eq!(
        event,
        CallEvent::LinkFailed {
            user_id: UserId::from("2"),
            error: LinkError::NegotiationTimeout,
        }
    );

    assert!(transports.link_to("2").is_closed());
    let peers = client.handle.peers().borrow().clone();
    assert_eq!(peers[&UserId::from("2")].link_state, LinkState::Closed);
}

#[tokio::test(start_paused = true)]
async fn test_responder_without_offer_times_out() {
    init_tracing();

    let transports = MockTransportFactory::default();
    let mut client = start_bare_with("2", transports.clone(), short_deadline()).await;

    client.push(roster(&["1"]));
    let event = wait_for_event(&mut client.handle, |e| {
        matches!(e, CallEvent::LinkFailed { .. })
    })
    .await;

    assert!(matches!(
        event,
        CallEvent::LinkFailed {
            error: LinkError::NegotiationTimeout,
            ..
        }
    ));
    assert!(transports.link_to("1").is_closed());
    client.assert_quiet().await;
}

#[tokio::test(start_paused = true)]
async fn test_connected_link_survives_deadline() {
    init_tracing();

    let transports = MockTransportFactory::default();
    let mut client = start_bare_with("1", transports.clone(), short_deadline()).await;

    client.push(roster(&["2"]));
    assert!(matches!(client.expect_sent().await, ClientMessage::Offer { .. }));
    client.push(ServerMessage::Answer {
        sender_user_id: UserId::from("2"),
        sdp: "answer".to_string(),
    });

    wait_for_event(&mut client.handle, |e| {
        matches!(
            e,
            CallEvent::LinkStateChanged {
                state: LinkState::Connected,
                ..
            }
        )
    })
    .await;

    tokio::time::sleep(Duration::from_secs(5)).await;

    assert!(client.handle.try_next_event().is_none());
    assert!(!transports.link_to("2").is_closed());
    let peers = client.handle.peers().borrow().clone();
    assert_eq!(peers[&UserId::from("2")].link_state, LinkState::Connected);
}
