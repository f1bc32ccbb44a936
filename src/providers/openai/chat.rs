//! Chat completion adapter.

use async_stream::try_stream;
use futures_util::StreamExt;

use crate::bias::encode_token_bias;
use crate::context::ClientContext;
use crate::error::ClientError;
use crate::http::{ensure_success, post_json};
use crate::prompt::{PromptNode, PromptRender};
use crate::sse::json_event_stream;
use crate::types::{
    ChatChunk, ChatCompletionRequest, ChatMessage, ChatSnapshot, ChatStream, MessageRole,
    ModelParams,
};

const OPERATION: &str = "createChatCompletion";

/// Tags that delimit chat messages in a prompt tree.
fn is_message_boundary(tag: &str) -> bool {
    matches!(tag, "system" | "user" | "assistant")
}

/// Streaming `createChatCompletion` adapter.
///
/// The prompt subtree is rendered into an ordered message list before
/// anything is sent; each streamed delta then folds into a
/// [`ChatSnapshot`] whose role is set at most once and whose content only
/// grows.
#[derive(Debug, Clone)]
pub struct ChatModel {
    ctx: ClientContext,
    params: ModelParams,
}

impl ChatModel {
    pub fn new(ctx: ClientContext, params: ModelParams) -> Self {
        Self { ctx, params }
    }

    /// Render the prompt subtree into an ordered message list.
    ///
    /// Rendering halts descent at message-boundary nodes; every surviving
    /// node must be one of the three recognized roles. Whitespace-only
    /// loose text between messages is ignored; anything else is
    /// [`ClientError::InvalidPromptStructure`].
    async fn build_messages<R>(
        renderer: &R,
        prompt: &PromptNode,
    ) -> Result<Vec<ChatMessage>, ClientError>
    where
        R: PromptRender,
    {
        let nodes = renderer.render_until(prompt, &is_message_boundary).await?;
        let mut messages = Vec::with_capacity(nodes.len());
        for node in &nodes {
            let message = match node {
                PromptNode::System(_) => ChatMessage {
                    role: MessageRole::System,
                    content: renderer.render_text(node).await?,
                    name: None,
                },
                PromptNode::User { name, .. } => ChatMessage {
                    role: MessageRole::User,
                    content: renderer.render_text(node).await?,
                    name: name.clone(),
                },
                PromptNode::Assistant(_) => ChatMessage {
                    role: MessageRole::Assistant,
                    content: renderer.render_text(node).await?,
                    name: None,
                },
                PromptNode::Text(text) if text.trim().is_empty() => continue,
                other => {
                    return Err(ClientError::InvalidPromptStructure(other.tag().to_string()));
                }
            };
            messages.push(message);
        }
        Ok(messages)
    }

    /// Stream cumulative chat snapshots.
    ///
    /// The message list is built first (structure errors surface before the
    /// placeholder); then the empty snapshot is emitted, the request is
    /// sent, and one snapshot follows per content delta. Role-only deltas
    /// update the snapshot without an emission.
    pub fn stream<R>(self, renderer: R, prompt: PromptNode) -> ChatStream
    where
        R: PromptRender + 'static,
    {
        let Self { ctx, params } = self;
        Box::pin(try_stream! {
            let messages = Self::build_messages(&renderer, &prompt).await?;
            let logit_bias = match &params.logit_bias {
                Some(bias) => Some(encode_token_bias(&params.model, bias)?),
                None => None,
            };
            let request = ChatCompletionRequest {
                model: params.model.clone(),
                messages,
                max_tokens: params.max_tokens,
                temperature: params.temperature,
                stop: params.stop.clone(),
                logit_bias,
                stream: true,
            };

            yield ChatSnapshot::default();

            tracing::debug!(operation = OPERATION, model = %params.model, "sending request");
            let response = post_json(ctx.config(), "/chat/completions", &request).await?;
            let response = ensure_success(response, OPERATION).await?;

            let mut events = Box::pin(json_event_stream(response.bytes_stream().map(
                |chunk| chunk.map_err(|e| ClientError::Http(format!("stream error: {e}"))),
            )));

            let mut snapshot = ChatSnapshot::default();
            while let Some(event) = events.next().await {
                let chunk: ChatChunk = serde_json::from_value(event?).map_err(|e| {
                    ClientError::MalformedStream(format!("unexpected chat event shape: {e}"))
                })?;
                let Some(delta) = chunk.choices.first().map(|c| &c.delta) else {
                    continue;
                };
                // First writer wins; later role deltas are ignored.
                if snapshot.role.is_none() {
                    snapshot.role = delta.role;
                }
                if let Some(content) = delta.content.as_deref() {
                    snapshot.content.push_str(content);
                    yield snapshot.clone();
                }
            }
            tracing::debug!(
                operation = OPERATION,
                chars = snapshot.content.len(),
                "request finished"
            );
        })
    }

    /// Run to completion and return the final cumulative content.
    ///
    /// The role is tracked on the emitted snapshots (use
    /// [`ChatSnapshot::into_message`] on the last one to keep it); the
    /// return value is the content string alone.
    pub async fn run<R>(self, renderer: R, prompt: PromptNode) -> Result<String, ClientError>
    where
        R: PromptRender + 'static,
    {
        let mut stream = self.stream(renderer, prompt);
        let mut last = ChatSnapshot::default();
        while let Some(item) = stream.next().await {
            last = item?;
        }
        Ok(last.content)
    }
}
