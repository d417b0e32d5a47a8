//! Message send/read boundary behaviors and the not-a-participant guard.

mod test_helpers;

use collab_types::model::{MessageKind, RoomKind, Visibility};
use collab_types::ErrorCode;
use test_helpers::*;

#[tokio::test]
async fn messages_get_with_limit_zero_returns_empty_no_error() {
    let engine = new_engine();
    let mut u1 = connect(&engine, "s1", "u1").await;

    let room = engine
        .create_room("u1", "R".to_string(), None, RoomKind::Group, Visibility::Public, vec![])
        .await
        .unwrap();
    engine
        .send_message("u1", None, None, &room.id, "hello".to_string(), MessageKind::Text, None)
        .await
        .unwrap();
    let _ = recv(&mut u1).await; // message:new echoed to sender

    let page = engine.get_messages("u1", &room.id, 0, None).await.unwrap();
    assert!(page.is_empty());
}

#[tokio::test]
async fn non_participant_cannot_send_or_read_messages() {
    let engine = new_engine();
    let _u1 = connect(&engine, "s1", "u1").await;

    let room = engine
        .create_room("u1", "R".to_string(), None, RoomKind::Group, Visibility::Public, vec![])
        .await
        .unwrap();

    let send_err = engine
        .send_message("outsider", None, None, &room.id, "hi".to_string(), MessageKind::Text, None)
        .await
        .expect_err("non-participant cannot send");
    assert_eq!(send_err.code, ErrorCode::NotParticipant);

    let read_err = engine
        .get_messages("outsider", &room.id, 50, None)
        .await
        .expect_err("non-participant cannot read");
    assert_eq!(read_err.code, ErrorCode::NotParticipant);
}

#[tokio::test]
async fn messages_are_returned_in_chronological_order() {
    let engine = new_engine();
    let mut u1 = connect(&engine, "s1", "u1").await;

    let room = engine
        .create_room("u1", "R".to_string(), None, RoomKind::Group, Visibility::Public, vec![])
        .await
        .unwrap();

    for content in ["first", "second", "third"] {
        engine
            .send_message("u1", None, None, &room.id, content.to_string(), MessageKind::Text, None)
            .await
            .unwrap();
        let _ = recv(&mut u1).await;
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let page = engine.get_messages("u1", &room.id, 50, None).await.unwrap();
    let contents: Vec<&str> = page.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["first", "second", "third"]);
}

#[tokio::test]
async fn joining_a_private_room_without_a_code_is_rejected() {
    let engine = new_engine();
    let _u1 = connect(&engine, "s1", "u1").await;

    let room = engine
        .create_room("u1", "Closed".to_string(), None, RoomKind::Group, Visibility::Private, vec![])
        .await
        .unwrap();

    let err = engine
        .join_room("u2", "s2", &room.id, None)
        .await
        .expect_err("private room join requires a code");
    assert_eq!(err.code, ErrorCode::CodeRequired);

    let err = engine
        .join_room("u2", "s2", &room.id, Some("WRONGCODE"))
        .await
        .expect_err("mismatched code is rejected");
    assert_eq!(err.code, ErrorCode::InvalidCode);
}
