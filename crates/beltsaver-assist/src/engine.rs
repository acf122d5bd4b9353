use futures::{Stream, StreamExt};
use reqwest::StatusCode;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use beltsaver_core::Settings;

use crate::conversation::ChatMessage;
use crate::error::AssistError;
use crate::sse::{SseDecoder, SseEvent};

/// Bounded so a slow consumer stalls the network read instead of buffering.
const CHANNEL_CAPACITY: usize = 32;

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
}

/// Client for an OpenAI-compatible streaming chat-completions endpoint.
#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
}

impl GatewayClient {
    pub fn new(settings: &Settings) -> Result<Self, AssistError> {
        if !settings.gateway_configured() {
            return Err(AssistError::NotConfigured);
        }
        Ok(Self {
            http: reqwest::Client::new(),
            url: settings.gateway_url.clone(),
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Start a streaming completion. Text deltas arrive on the returned
    /// channel; the channel closes after `[DONE]`, on error, or on cancel.
    ///
    /// Cancelling `cancel` or dropping the receiver aborts the request.
    pub async fn stream_chat(
        &self,
        messages: &[ChatMessage],
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<Result<String, AssistError>>, AssistError> {
        let body = ChatRequest {
            model: &self.model,
            messages,
            stream: true,
        };

        tracing::debug!(model = %self.model, messages = messages.len(), "opening chat stream");

        let send = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send();

        let resp = tokio::select! {
            _ = cancel.cancelled() => return Err(AssistError::Cancelled),
            resp = send => resp?,
        };

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(map_status(status, body));
        }

        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        tokio::spawn(forward(resp.bytes_stream(), tx, cancel));
        Ok(rx)
    }

    /// Run a completion to the end and return the full text.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        cancel: CancellationToken,
    ) -> Result<String, AssistError> {
        let mut rx = self.stream_chat(messages, cancel).await?;
        let mut out = String::new();
        while let Some(delta) = rx.recv().await {
            out.push_str(&delta?);
        }
        if out.trim().is_empty() {
            return Err(AssistError::EmptyResponse);
        }
        Ok(out)
    }
}

fn map_status(status: StatusCode, body: String) -> AssistError {
    tracing::warn!(status = status.as_u16(), "gateway rejected chat request");
    match status {
        StatusCode::TOO_MANY_REQUESTS => AssistError::RateLimited,
        StatusCode::PAYMENT_REQUIRED => AssistError::CreditsExhausted,
        _ => AssistError::Status {
            status: status.as_u16(),
            body,
        },
    }
}

async fn forward<S, B, E>(
    bytes: S,
    tx: mpsc::Sender<Result<String, AssistError>>,
    cancel: CancellationToken,
) where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<AssistError>,
{
    let mut deltas = std::pin::pin!(decode_stream(bytes));
    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("chat stream cancelled");
                let _ = tx.send(Err(AssistError::Cancelled)).await;
                return;
            }
            _ = tx.closed() => {
                tracing::debug!("chat receiver dropped, aborting stream");
                return;
            }
            next = deltas.next() => next,
        };
        let Some(item) = next else { return };
        if tx.send(item).await.is_err() {
            return;
        }
    }
}

/// Turn a stream of raw body chunks into a stream of text deltas.
///
/// Ends at `[DONE]`, at the end of the body, or after the first transport
/// error (which is yielded).
pub fn decode_stream<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, AssistError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<AssistError>,
{
    struct State<S> {
        bytes: std::pin::Pin<Box<S>>,
        decoder: SseDecoder,
        ready: std::collections::VecDeque<String>,
        finished: bool,
    }

    let state = State {
        bytes: Box::pin(bytes),
        decoder: SseDecoder::new(),
        ready: std::collections::VecDeque::new(),
        finished: false,
    };

    futures::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(text) = st.ready.pop_front() {
                return Some((Ok(text), st));
            }
            if st.finished {
                return None;
            }
            let events = match st.bytes.next().await {
                Some(Ok(chunk)) => st.decoder.feed(chunk.as_ref()),
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e.into()), st));
                }
                None => {
                    st.finished = true;
                    st.decoder.finish()
                }
            };
            for ev in events {
                match ev {
                    SseEvent::Delta(text) => st.ready.push_back(text),
                    SseEvent::Done => st.finished = true,
                }
            }
        }
    })
}
