//! Optional duplicate-suppression profile (§4.4.3, gated by
//! `SIGNAL_DEDUPE_WINDOW_MS`; off unless a window is configured).

mod test_helpers;

use std::time::Duration;

use collab_types::events::{SignalKind, SignalRequest};
use test_helpers::*;

fn ice_candidate(room_id: &str) -> SignalRequest {
    SignalRequest {
        signal_kind: SignalKind::IceCandidate,
        room_id: room_id.to_string(),
        target_user_id: None,
        payload: serde_json::json!({ "candidate": "candidate:1 1 UDP" }),
        metadata: None,
    }
}

#[tokio::test]
async fn identical_signal_within_window_is_suppressed() {
    let engine = new_engine_with_dedupe(Duration::from_millis(200));
    let host = user("u1");
    let guest = user("u2");
    let mut u1 = connect(&engine, "s1", "u1").await;
    let mut u2 = connect(&engine, "s2", "u2").await;

    let room = engine
        .create_room(&host, "s1", "Room".to_string(), None, false)
        .await
        .unwrap();
    engine.join_room(&guest, "s2", Some(&room.id), None).await.unwrap();
    let _ = recv(&mut u1).await; // video:user:joined, sent to the host, not the joiner

    engine.signal(&host, "s1", ice_candidate(&room.id)).await.unwrap();
    let _ = recv(&mut u2).await; // first copy delivered

    engine.signal(&host, "s1", ice_candidate(&room.id)).await.unwrap();
    assert_silent(&mut u2).await; // identical repeat within the window is dropped
}

#[tokio::test]
async fn signal_repeated_after_window_elapses_is_delivered_again() {
    let engine = new_engine_with_dedupe(Duration::from_millis(20));
    let host = user("u1");
    let guest = user("u2");
    let mut u1 = connect(&engine, "s1", "u1").await;
    let mut u2 = connect(&engine, "s2", "u2").await;

    let room = engine
        .create_room(&host, "s1", "Room".to_string(), None, false)
        .await
        .unwrap();
    engine.join_room(&guest, "s2", Some(&room.id), None).await.unwrap();
    let _ = recv(&mut u1).await;

    engine.signal(&host, "s1", ice_candidate(&room.id)).await.unwrap();
    let _ = recv(&mut u2).await;

    tokio::time::sleep(Duration::from_millis(40)).await;

    engine.signal(&host, "s1", ice_candidate(&room.id)).await.unwrap();
    let _ = recv(&mut u2).await; // window elapsed, delivered again
}

#[tokio::test]
async fn dedupe_is_off_by_default() {
    let engine = new_engine();
    let host = user("u1");
    let guest = user("u2");
    let mut u1 = connect(&engine, "s1", "u1").await;
    let mut u2 = connect(&engine, "s2", "u2").await;

    let room = engine
        .create_room(&host, "s1", "Room".to_string(), None, false)
        .await
        .unwrap();
    engine.join_room(&guest, "s2", Some(&room.id), None).await.unwrap();
    let _ = recv(&mut u1).await;

    engine.signal(&host, "s1", ice_candidate(&room.id)).await.unwrap();
    let _ = recv(&mut u2).await;
    engine.signal(&host, "s1", ice_candidate(&room.id)).await.unwrap();
    let _ = recv(&mut u2).await; // no suppression without a configured window
}
