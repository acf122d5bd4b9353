pub mod classify;
pub mod conversation;
pub mod engine;
pub mod error;
pub mod prompt;
pub mod sse;

pub use classify::{classify, parse_classification};
pub use conversation::{ChatMessage, Conversation, Role};
pub use engine::{decode_stream, GatewayClient};
pub use error::AssistError;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Send the conversation's pending turn and stream the reply into it.
///
/// `on_delta` sees each piece of text as it arrives. On failure or cancel the
/// optimistic assistant message is rolled back and the error returned.
pub async fn ask(
    client: &GatewayClient,
    conversation: &mut Conversation,
    cancel: CancellationToken,
    on_delta: impl FnMut(&str),
) -> Result<String, AssistError> {
    conversation.begin_reply();
    let request = conversation.to_request();

    tracing::info!(model = client.model(), turns = request.len(), "asking assistant");

    let rx = match client.stream_chat(&request, cancel).await {
        Ok(rx) => rx,
        Err(e) => {
            conversation.abort_reply();
            tracing::error!(error = %e, "assistant request failed");
            return Err(e);
        }
    };
    drain_into(rx, conversation, on_delta).await
}

/// Feed streamed deltas into the conversation until the channel closes.
pub async fn drain_into(
    mut rx: mpsc::Receiver<Result<String, AssistError>>,
    conversation: &mut Conversation,
    mut on_delta: impl FnMut(&str),
) -> Result<String, AssistError> {
    conversation.begin_reply();
    while let Some(item) = rx.recv().await {
        match item {
            Ok(delta) => {
                on_delta(&delta);
                conversation.push_delta(&delta);
            }
            Err(e) => {
                let partial = conversation.abort_reply().unwrap_or_default();
                tracing::error!(error = %e, partial_len = partial.len(), "assistant stream failed");
                return Err(e);
            }
        }
    }
    match conversation.finish_reply() {
        Some(msg) => Ok(msg.content.clone()),
        None => Err(AssistError::EmptyResponse),
    }
}
