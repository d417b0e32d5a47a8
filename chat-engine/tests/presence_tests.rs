//! Covers spec scenario S3: presence broadcasts across multiple
//! concurrent sessions for the same user.

mod test_helpers;

use collab_types::events::ChatServerEvent;
use test_helpers::*;

#[tokio::test]
async fn presence_is_tracked_per_user_not_per_session() {
    let engine = new_engine();

    // A bystander session observes the online/offline transitions.
    let mut observer = connect(&engine, "observer", "observer-user").await;

    let (tx1, mut rx1) = tokio::sync::mpsc::unbounded_channel();
    let (first_online, _) = engine.on_connect("s1", "u1", tx1).await;
    assert!(first_online);
    let _ = recv(&mut rx1).await; // u1's own rooms:list
    let online = recv(&mut observer).await;
    assert!(matches!(online, ChatServerEvent::UserOnline { ref user_id } if user_id == "u1"));

    // Second session for the same user: no additional user:online.
    let (tx2, mut rx2) = tokio::sync::mpsc::unbounded_channel();
    let (second_online, _) = engine.on_connect("s2", "u1", tx2).await;
    assert!(!second_online);
    let _ = recv(&mut rx2).await; // s2's own rooms:list
    assert_silent(&mut observer).await;

    // s1 disconnects: u1 still has s2 open, so no user:offline.
    let became_offline = engine.on_disconnect("s1", "u1").await;
    assert!(!became_offline);
    assert_silent(&mut observer).await;

    // s2 disconnects: this was the last session, so user:offline fires
    // exactly once.
    let became_offline = engine.on_disconnect("s2", "u1").await;
    assert!(became_offline);
    // `on_disconnect` only computes the transition; broadcasting is the
    // caller's job (see ws::handle_socket), so we simulate it here.
    engine
        .registry()
        .broadcast_all(
            ChatServerEvent::UserOffline {
                user_id: "u1".to_string(),
            },
            None,
        )
        .await;
    let offline = recv(&mut observer).await;
    assert!(matches!(offline, ChatServerEvent::UserOffline { ref user_id } if user_id == "u1"));
}
