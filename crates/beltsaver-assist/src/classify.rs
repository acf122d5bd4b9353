use tokio_util::sync::CancellationToken;

use beltsaver_core::{DiagnosticDraft, Direction, Location, SeverityReport, Symptom};

use crate::conversation::ChatMessage;
use crate::engine::GatewayClient;
use crate::error::AssistError;
use crate::prompt;

#[derive(serde::Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct LlmAnswers {
    location: Option<String>,
    direction: Option<String>,
    severity_report: Option<String>,
    symptom: Option<String>,
}

/// Ask the gateway to turn a free-text observation into wizard answers.
///
/// Fields the model could not map stay unanswered in the returned draft.
pub async fn classify(
    client: &GatewayClient,
    observation: &str,
    cancel: CancellationToken,
) -> Result<DiagnosticDraft, AssistError> {
    let messages = vec![
        ChatMessage::system(prompt::classify_system_prompt()),
        ChatMessage::user(observation.trim()),
    ];
    let raw = client.complete(&messages, cancel).await?;
    tracing::debug!(raw = %raw, "classification reply");

    let draft = parse_classification(&raw);
    if draft.answered() == 0 {
        return Err(AssistError::Unclassifiable(raw));
    }
    tracing::info!(answered = draft.answered(), "observation classified");
    Ok(draft)
}

/// Parse the model's reply into a draft. Never fails; unreadable output
/// yields an empty draft.
pub fn parse_classification(raw: &str) -> DiagnosticDraft {
    let Some(json_str) = extract_json_object(raw) else {
        return DiagnosticDraft::default();
    };
    let answers: LlmAnswers = serde_json::from_str(json_str).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "classification reply is not valid JSON");
        LlmAnswers::default()
    });

    DiagnosticDraft {
        location: answers.location.as_deref().and_then(|v| match_token(v, &Location::ALL, Location::as_str)),
        direction: answers.direction.as_deref().and_then(|v| match_token(v, &Direction::ALL, Direction::as_str)),
        severity_report: answers
            .severity_report
            .as_deref()
            .and_then(|v| match_token(v, &SeverityReport::ALL, SeverityReport::as_str)),
        symptom: answers.symptom.as_deref().and_then(|v| match_token(v, &Symptom::ALL, Symptom::as_str)),
    }
}

/// Extract the outermost `{...}` substring from raw LLM output.
fn extract_json_object(raw: &str) -> Option<&str> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&raw[start..=end])
}

/// Match an LLM-supplied value to a known token.
/// Tries exact match first, then case/spacing-insensitive, then substring.
fn match_token<T: Copy>(value: &str, all: &[T], as_str: fn(T) -> &'static str) -> Option<T> {
    if let Some(v) = all.iter().copied().find(|v| as_str(*v) == value) {
        return Some(v);
    }

    let norm = value.trim().to_lowercase().replace([' ', '-'], "_");
    if norm.is_empty() {
        return None;
    }
    if let Some(v) = all.iter().copied().find(|v| as_str(*v) == norm) {
        return Some(v);
    }

    all.iter().copied().find(|v| norm.contains(as_str(*v)))
}
