//! Streaming replies into a conversation without a live gateway.

use beltsaver_assist::{drain_into, AssistError, ChatMessage, Conversation, Role};
use tokio::sync::mpsc;

#[tokio::test]
async fn streamed_reply_is_committed() {
    let (tx, rx) = mpsc::channel(4);
    let mut convo = Conversation::with_system("sys");
    convo.push_user("My tail pulley belt drifts left under load");

    tokio::spawn(async move {
        for piece in ["Check the ", "chute ", "deflectors."] {
            tx.send(Ok(piece.to_string())).await.unwrap();
        }
    });

    let mut seen = Vec::new();
    let reply = drain_into(rx, &mut convo, |d| seen.push(d.to_string()))
        .await
        .unwrap();

    assert_eq!(reply, "Check the chute deflectors.");
    assert_eq!(seen.len(), 3);
    assert!(!convo.is_pending());
    let last = convo.messages().last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.content, reply);
}

#[tokio::test]
async fn failed_stream_rolls_back_partial_reply() {
    let (tx, rx) = mpsc::channel(4);
    let mut convo = Conversation::new();
    convo.push_user("question");

    tx.send(Ok("half an ans".to_string())).await.unwrap();
    tx.send(Err(AssistError::RateLimited)).await.unwrap();
    drop(tx);

    let err = drain_into(rx, &mut convo, |_| {}).await.unwrap_err();
    assert!(matches!(err, AssistError::RateLimited));
    assert_eq!(convo.messages(), &[ChatMessage::user("question")]);
    assert!(!convo.is_pending());
}

#[tokio::test]
async fn cancelled_stream_rolls_back() {
    let (tx, rx) = mpsc::channel(4);
    let mut convo = Conversation::new();
    convo.push_user("question");
    tx.send(Err(AssistError::Cancelled)).await.unwrap();
    drop(tx);

    assert!(matches!(
        drain_into(rx, &mut convo, |_| {}).await,
        Err(AssistError::Cancelled)
    ));
    assert_eq!(convo.messages().len(), 1);
}

#[tokio::test]
async fn empty_stream_is_an_error_and_leaves_no_message() {
    let (tx, rx) = mpsc::channel::<Result<String, AssistError>>(1);
    drop(tx);
    let mut convo = Conversation::new();
    convo.push_user("question");

    assert!(matches!(
        drain_into(rx, &mut convo, |_| {}).await,
        Err(AssistError::EmptyResponse)
    ));
    assert_eq!(convo.messages().len(), 1);
}

#[tokio::test]
async fn history_grows_across_turns() {
    let mut convo = Conversation::with_system("sys");
    for (q, a) in [("first", "one"), ("second", "two")] {
        convo.push_user(q);
        let (tx, rx) = mpsc::channel(1);
        tx.send(Ok(a.to_string())).await.unwrap();
        drop(tx);
        drain_into(rx, &mut convo, |_| {}).await.unwrap();
    }
    let req = convo.to_request();
    let roles: Vec<Role> = req.iter().map(|m| m.role).collect();
    assert_eq!(
        roles,
        vec![Role::System, Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
    assert_eq!(req[4].content, "two");
}
