//! Request parameters, wire shapes, and stream snapshot types.

use std::collections::{BTreeMap, HashMap};
use std::pin::Pin;

use futures::Stream;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;

/// Chat message role.
///
/// The chat endpoint recognizes exactly these three; anything else in a
/// prompt tree is rejected before the request is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl MessageRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A fully rendered chat message as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    /// Participant name, passed through unchanged for user messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Sampling and decoding parameters shared by both request kinds.
#[derive(Debug, Clone)]
pub struct ModelParams {
    /// Model identifier, treated as an opaque string.
    pub model: String,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub stop: Option<Vec<String>>,
    /// Bias map keyed by literal token text; encoded to token ids per
    /// request by [`crate::bias::encode_token_bias`].
    pub logit_bias: Option<BTreeMap<String, f32>>,
}

impl ModelParams {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            max_tokens: None,
            temperature: None,
            stop: None,
            logit_bias: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Request a bias for one literal token string.
    pub fn with_token_bias(mut self, token: impl Into<String>, bias: f32) -> Self {
        self.logit_bias
            .get_or_insert_with(BTreeMap::new)
            .insert(token.into(), bias);
        self
    }
}

/// Wire body for `createCompletion`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, f32>>,
    pub stream: bool,
}

/// Wire body for `createChatCompletion`.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<HashMap<String, f32>>,
    pub stream: bool,
}

/// One decoded `createCompletion` stream event.
#[derive(Debug, Clone, Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub text: Option<String>,
}

/// One decoded `createChatCompletion` stream event.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatChunk {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub delta: ChatDelta,
}

/// Incremental fragment of a chat message.
///
/// The role arrives on the wire as an arbitrary string; one of the three
/// recognized roles is kept and anything else folds to `None` rather than
/// failing the event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatDelta {
    #[serde(default, deserialize_with = "lenient_role")]
    pub role: Option<MessageRole>,
    #[serde(default)]
    pub content: Option<String>,
}

fn lenient_role<'de, D>(deserializer: D) -> Result<Option<MessageRole>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let role = Option::<String>::deserialize(deserializer)?;
    Ok(role.as_deref().and_then(|role| match role {
        "system" => Some(MessageRole::System),
        "user" => Some(MessageRole::User),
        "assistant" => Some(MessageRole::Assistant),
        _ => None,
    }))
}

/// Cumulative chat message reconstructed from deltas.
///
/// The role is set at most once, from the first delta that carries it; the
/// content only grows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChatSnapshot {
    pub role: Option<MessageRole>,
    pub content: String,
}

impl ChatSnapshot {
    /// Final role-tagged message. A stream that never carried a role
    /// defaults to assistant.
    pub fn into_message(self) -> ChatMessage {
        ChatMessage {
            role: self.role.unwrap_or(MessageRole::Assistant),
            content: self.content,
            name: None,
        }
    }
}

/// Stream of cumulative completion text. The first item is always the empty
/// in-flight placeholder; each later item extends the previous one.
pub type TextStream = Pin<Box<dyn Stream<Item = Result<String, ClientError>> + Send>>;

/// Stream of cumulative chat snapshots with the same emission contract.
pub type ChatStream = Pin<Box<dyn Stream<Item = Result<ChatSnapshot, ClientError>> + Send>>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn completion_request_omits_absent_fields() {
        let request = CompletionRequest {
            model: "text-davinci-003".to_string(),
            prompt: "Say hello".to_string(),
            max_tokens: None,
            temperature: None,
            stop: None,
            logit_bias: None,
            stream: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({"model": "text-davinci-003", "prompt": "Say hello", "stream": true})
        );
    }

    #[test]
    fn chat_request_serializes_messages_with_roles() {
        let request = ChatCompletionRequest {
            model: "gpt-4".to_string(),
            messages: vec![
                ChatMessage {
                    role: MessageRole::System,
                    content: "Be terse.".to_string(),
                    name: None,
                },
                ChatMessage {
                    role: MessageRole::User,
                    content: "Hi".to_string(),
                    name: Some("alex".to_string()),
                },
            ],
            max_tokens: Some(16),
            temperature: None,
            stop: None,
            logit_bias: None,
            stream: true,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["name"], "alex");
        assert!(value["messages"][0].get("name").is_none());
        assert_eq!(value["max_tokens"], 16);
    }

    #[test]
    fn chat_chunk_tolerates_sparse_deltas() {
        let chunk: ChatChunk =
            serde_json::from_value(json!({"choices": [{"delta": {}}]})).unwrap();
        let delta = &chunk.choices[0].delta;
        assert!(delta.role.is_none());
        assert!(delta.content.is_none());

        let chunk: ChatChunk = serde_json::from_value(
            json!({"id": "x", "choices": [{"delta": {"role": "assistant", "content": "Hi"}}]}),
        )
        .unwrap();
        let delta = &chunk.choices[0].delta;
        assert_eq!(delta.role, Some(MessageRole::Assistant));
        assert_eq!(delta.content.as_deref(), Some("Hi"));
    }

    #[test]
    fn unrecognized_delta_role_folds_to_none() {
        let chunk: ChatChunk = serde_json::from_value(
            json!({"choices": [{"delta": {"role": "tool", "content": "hi"}}]}),
        )
        .unwrap();
        let delta = &chunk.choices[0].delta;
        assert!(delta.role.is_none());
        assert_eq!(delta.content.as_deref(), Some("hi"));
    }

    #[test]
    fn snapshot_without_role_defaults_to_assistant() {
        let snapshot = ChatSnapshot {
            role: None,
            content: "done".to_string(),
        };
        let message = snapshot.into_message();
        assert_eq!(message.role, MessageRole::Assistant);
        assert_eq!(message.content, "done");
    }
}
