//! Exercises the `Store` contract against `MemoryStore`, the parts not
//! already covered by the unit tests alongside the implementation.

use collab_store::memory::MemoryStore;
use collab_store::{codes, NewChatMessage, NewChatRoom, NewVideoRoom, Store, StoreError};
use collab_types::model::{MessageKind, RoomKind, Visibility};

fn new_room(created_by: &str, visibility: Visibility) -> NewChatRoom {
    NewChatRoom {
        name: "General".into(),
        description: None,
        kind: RoomKind::Group,
        visibility,
        code: None,
        participants: vec![],
        created_by: created_by.to_string(),
        video_room_id: None,
    }
}

#[tokio::test]
async fn chat_room_lookup_by_code_round_trips() {
    let store = MemoryStore::new();
    let code = codes::generate_unique_chat_code(&store).await.unwrap();
    let mut room = new_room("u1", Visibility::Private);
    room.code = Some(code.clone());
    let created = store.create_chat_room(room).await.unwrap();

    let found = store.get_chat_room_by_code(&code).await.unwrap().unwrap();
    assert_eq!(found.id, created.id);
    assert!(store.chat_room_code_exists(&code).await.unwrap());
    assert!(!store.chat_room_code_exists("ZZZZZZ").await.unwrap());
}

#[tokio::test]
async fn list_public_rooms_excludes_private_ones() {
    let store = MemoryStore::new();
    let public = store.create_chat_room(new_room("u1", Visibility::Public)).await.unwrap();
    let _private = store.create_chat_room(new_room("u1", Visibility::Private)).await.unwrap();

    let listed = store.list_public_chat_rooms().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, public.id);
}

#[tokio::test]
async fn private_rooms_for_user_only_include_participants() {
    let store = MemoryStore::new();
    let mut room = new_room("u1", Visibility::Private);
    room.participants = vec!["u1".to_string()];
    let room = store.create_chat_room(room).await.unwrap();
    store.add_chat_participant(&room.id, "u2").await.unwrap();

    let for_u2 = store.list_private_chat_rooms_for_user("u2").await.unwrap();
    assert_eq!(for_u2.len(), 1);
    let for_u3 = store.list_private_chat_rooms_for_user("u3").await.unwrap();
    assert!(for_u3.is_empty());
}

#[tokio::test]
async fn messages_are_returned_oldest_first_after_cursor() {
    let store = MemoryStore::new();
    let room = store.create_chat_room(new_room("u1", Visibility::Public)).await.unwrap();

    for i in 0..3 {
        store
            .insert_chat_message(NewChatMessage {
                room_id: room.id.clone(),
                sender_id: "u1".into(),
                sender_name: None,
                sender_avatar: None,
                content: format!("msg {i}"),
                kind: MessageKind::Text,
                metadata: None,
            })
            .await
            .unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let all = store.get_chat_messages(&room.id, 10, None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].content, "msg 2", "store returns newest-first, pre-reversal");
}

#[tokio::test]
async fn video_room_lifecycle_add_remove_delete() {
    let store = MemoryStore::new();
    let room = store
        .create_video_room(NewVideoRoom {
            name: "standup".into(),
            description: None,
            host_id: "host".into(),
            max_participants: 4,
            code: "AAAAAA".into(),
            chat_room_id: None,
            chat_room_code: None,
        })
        .await
        .unwrap();
    assert_eq!(room.participants, vec!["host".to_string()]);

    let room = store.add_video_participant(&room.id, "guest").await.unwrap();
    assert!(room.participants.contains(&"guest".to_string()));

    let room = store.remove_video_participant(&room.id, "guest").await.unwrap();
    assert!(!room.participants.contains(&"guest".to_string()));

    store.delete_video_room(&room.id).await.unwrap();
    assert!(store.get_video_room(&room.id).await.unwrap().is_none());
}

#[tokio::test]
async fn removing_an_absent_video_participant_is_not_found() {
    let store = MemoryStore::new();
    let room = store
        .create_video_room(NewVideoRoom {
            name: "standup".into(),
            description: None,
            host_id: "host".into(),
            max_participants: 4,
            code: "BBBBBB".into(),
            chat_room_id: None,
            chat_room_code: None,
        })
        .await
        .unwrap();

    let err = store.remove_video_participant(&room.id, "ghost").await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound));
}

#[tokio::test]
async fn video_participant_records_are_scoped_per_room() {
    let store = MemoryStore::new();
    let room_a = store
        .create_video_room(NewVideoRoom {
            name: "a".into(),
            description: None,
            host_id: "host".into(),
            max_participants: 4,
            code: "CCCCCC".into(),
            chat_room_id: None,
            chat_room_code: None,
        })
        .await
        .unwrap();
    let room_b = store
        .create_video_room(NewVideoRoom {
            name: "b".into(),
            description: None,
            host_id: "host".into(),
            max_participants: 4,
            code: "DDDDDD".into(),
            chat_room_id: None,
            chat_room_code: None,
        })
        .await
        .unwrap();

    store
        .upsert_video_participant(collab_types::model::VideoParticipant::new(
            room_a.id.clone(),
            "host".into(),
            "s1".into(),
        ))
        .await
        .unwrap();

    assert!(store.get_video_participant(&room_b.id, "host").await.unwrap().is_none());
    assert!(store.get_video_participant(&room_a.id, "host").await.unwrap().is_some());

    store.delete_all_video_participants(&room_a.id).await.unwrap();
    assert!(store.get_video_participant(&room_a.id, "host").await.unwrap().is_none());
}

#[tokio::test]
async fn generated_codes_are_unique_across_many_rooms() {
    let store = MemoryStore::new();
    let mut codes_seen = std::collections::HashSet::new();
    for _ in 0..20 {
        let code = codes::generate_unique_video_code(&store).await.unwrap();
        assert!(codes_seen.insert(code.clone()), "code {code} was generated twice");
        store
            .create_video_room(NewVideoRoom {
                name: "room".into(),
                description: None,
                host_id: "host".into(),
                max_participants: 4,
                code,
                chat_room_id: None,
                chat_room_code: None,
            })
            .await
            .unwrap();
    }
}
