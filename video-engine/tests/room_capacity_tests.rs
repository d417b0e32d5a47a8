//! Boundary behavior for room capacity and target resolution.

mod test_helpers;

use collab_types::model::VideoRoom;
use collab_types::ErrorCode;
use test_helpers::*;

#[tokio::test]
async fn room_full_rejects_the_participant_past_the_limit() {
    let engine = new_engine();
    let host = user("host");
    let _host_rx = connect(&engine, "s-host", "host").await;

    let room = engine
        .create_room(&host, "s-host", "Packed".to_string(), None, false)
        .await
        .unwrap();

    // host already occupies one slot.
    for i in 1..VideoRoom::DEFAULT_MAX_PARTICIPANTS {
        let uid = format!("guest{i}");
        let guest = user(&uid);
        let session = format!("s-{uid}");
        let _rx = connect(&engine, &session, &uid).await;
        engine
            .join_room(&guest, &session, Some(&room.id), None)
            .await
            .unwrap_or_else(|e| panic!("join {uid} should succeed, got {e:?}"));
    }

    let overflow = user("overflow");
    let _overflow_rx = connect(&engine, "s-overflow", "overflow").await;
    let err = engine
        .join_room(&overflow, "s-overflow", Some(&room.id), None)
        .await
        .expect_err("room should be at capacity");
    assert_eq!(err.code, ErrorCode::RoomFull);
}

#[tokio::test]
async fn signal_to_unknown_target_is_rejected() {
    let engine = new_engine();
    let host = user("host");
    let _host_rx = connect(&engine, "s-host", "host").await;

    let room = engine
        .create_room(&host, "s-host", "Room".to_string(), None, false)
        .await
        .unwrap();

    let err = engine
        .signal(
            &host,
            "s-host",
            collab_types::events::SignalRequest {
                signal_kind: collab_types::events::SignalKind::Offer,
                room_id: room.id.clone(),
                target_user_id: Some("ghost".to_string()),
                payload: serde_json::json!({ "sdp": "v=0..." }),
                metadata: None,
            },
        )
        .await
        .expect_err("target is not a participant");
    assert_eq!(err.code, ErrorCode::TargetUserNotFound);
}

#[tokio::test]
async fn malformed_offer_payload_is_rejected() {
    let engine = new_engine();
    let host = user("host");
    let _host_rx = connect(&engine, "s-host", "host").await;
    let guest = user("guest");
    let _guest_rx = connect(&engine, "s-guest", "guest").await;

    let room = engine
        .create_room(&host, "s-host", "Room".to_string(), None, false)
        .await
        .unwrap();
    engine.join_room(&guest, "s-guest", Some(&room.id), None).await.unwrap();

    let err = engine
        .signal(
            &host,
            "s-host",
            collab_types::events::SignalRequest {
                signal_kind: collab_types::events::SignalKind::Offer,
                room_id: room.id.clone(),
                target_user_id: Some("guest".to_string()),
                payload: serde_json::json!({ "sdp": "" }),
                metadata: None,
            },
        )
        .await
        .expect_err("empty sdp is rejected");
    assert_eq!(err.code, ErrorCode::InvalidSignalStructure);
}
