//! Covers spec scenarios S1 (public room, two joiners, one message) and
//! S2 (private room by code), plus the join/leave/join idempotence
//! property.

mod test_helpers;

use collab_types::events::ChatServerEvent;
use collab_types::model::{MessageKind, RoomKind, Visibility};
use collab_types::ErrorCode;
use test_helpers::*;

#[tokio::test]
async fn s1_public_room_two_joiners_one_message() {
    let engine = new_engine();
    let mut u1 = connect(&engine, "s1", "u1").await;

    let room = engine
        .create_room(
            "u1",
            "General".to_string(),
            None,
            RoomKind::Group,
            Visibility::Public,
            vec![],
        )
        .await
        .expect("create_room");
    assert!(!room.id.is_empty());
    assert!(room.code.is_none());

    let mut u2 = connect(&engine, "s2", "u2").await;
    let mut u3 = connect(&engine, "s3", "u3").await;

    engine.join_room("u2", "s2", &room.id, None).await.expect("u2 joins");
    let joined = recv(&mut u1).await;
    assert!(matches!(joined, ChatServerEvent::RoomUserJoined { ref room_id, ref user_id } if room_id == &room.id && user_id == "u2"));

    engine.join_room("u3", "s3", &room.id, None).await.expect("u3 joins");
    let _ = recv(&mut u1).await; // room:user-joined for u3
    let _ = recv(&mut u2).await; // room:user-joined for u3

    let message = engine
        .send_message("u2", None, None, &room.id, "hi".to_string(), MessageKind::Text, None)
        .await
        .expect("send_message");
    assert_eq!(message.sender_id, "u2");
    assert_eq!(message.content, "hi");

    for rx in [&mut u1, &mut u2, &mut u3] {
        let event = recv(rx).await;
        match event {
            ChatServerEvent::MessageNew(m) => {
                assert_eq!(m.sender_id, "u2");
                assert_eq!(m.content, "hi");
            }
            other => panic!("expected message:new, got {other:?}"),
        }
    }

    let stored = engine
        .get_messages("u2", &room.id, 50, None)
        .await
        .expect("get_messages");
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn s2_private_room_by_code() {
    let engine = new_engine();
    let mut u1 = connect(&engine, "s1", "u1").await;
    let mut u2 = connect(&engine, "s2", "u2").await;

    let room = engine
        .create_room(
            "u1",
            "X".to_string(),
            None,
            RoomKind::Group,
            Visibility::Private,
            vec![],
        )
        .await
        .expect("create_room");
    let code = room.code.clone().expect("private room has a code");
    assert_eq!(code.len(), 6);
    assert!(code.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));

    let joined = engine
        .join_room_by_code("u2", "s2", &code)
        .await
        .expect("join by code");
    assert_eq!(joined.id, room.id);

    let user_joined = recv(&mut u1).await;
    assert!(matches!(user_joined, ChatServerEvent::RoomUserJoined { ref user_id, .. } if user_id == "u2"));

    let err = engine
        .join_room_by_code("u3", "s3", "AAAAAA")
        .await
        .expect_err("no room with that code");
    assert_eq!(err.code, ErrorCode::InvalidCode);

    drop(u2);
}

#[tokio::test]
async fn join_then_leave_then_join_is_idempotent() {
    let engine = new_engine();
    let mut u1 = connect(&engine, "s1", "u1").await;
    let mut u2 = connect(&engine, "s2", "u2").await;

    let room = engine
        .create_room("u1", "R".to_string(), None, RoomKind::Group, Visibility::Public, vec![])
        .await
        .unwrap();

    let first_join = engine.join_room("u2", "s2", &room.id, None).await.unwrap();
    assert_eq!(first_join.participants.iter().filter(|p| *p == "u2").count(), 1);
    let _ = recv(&mut u1).await;

    engine.leave_room("u2", "s2", &room.id).await;
    let _ = recv(&mut u1).await; // room:user-left

    let second_join = engine.join_room("u2", "s2", &room.id, None).await.unwrap();
    assert_eq!(second_join.participants.iter().filter(|p| *p == "u2").count(), 1);
    let _ = recv(&mut u1).await; // room:user-joined again
}

#[tokio::test]
async fn rejoin_while_still_subscribed_does_not_duplicate_broadcast() {
    let engine = new_engine();
    let mut u1 = connect(&engine, "s1", "u1").await;
    let mut u2 = connect(&engine, "s2", "u2").await;

    let room = engine
        .create_room("u1", "R".to_string(), None, RoomKind::Group, Visibility::Public, vec![])
        .await
        .unwrap();

    engine.join_room("u2", "s2", &room.id, None).await.unwrap();
    let _ = recv(&mut u1).await; // room:user-joined

    // Same session re-joins the same room without leaving first.
    let rejoined = engine.join_room("u2", "s2", &room.id, None).await.unwrap();
    assert_eq!(rejoined.participants.iter().filter(|p| *p == "u2").count(), 1);
    assert_silent(&mut u1).await; // no duplicate room:user-joined
}

#[tokio::test]
async fn non_participant_sees_redacted_public_room_and_rejected_private_room() {
    let engine = new_engine();
    let mut u1 = connect(&engine, "s1", "u1").await;

    let public_room = engine
        .create_room("u1", "Open".to_string(), None, RoomKind::Group, Visibility::Public, vec![])
        .await
        .unwrap();
    let private_room = engine
        .create_room("u1", "Closed".to_string(), None, RoomKind::Group, Visibility::Private, vec![])
        .await
        .unwrap();
    drop(u1);

    let viewed = engine.get_room("outsider", &public_room.id).await.unwrap();
    assert!(viewed.code.is_none());

    let err = engine
        .get_room("outsider", &private_room.id)
        .await
        .expect_err("outsider cannot view a private room");
    assert_eq!(err.code, ErrorCode::NotParticipant);
}
