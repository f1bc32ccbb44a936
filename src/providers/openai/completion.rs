//! Plain-text completion adapter.

use async_stream::try_stream;
use futures_util::StreamExt;

use crate::bias::encode_token_bias;
use crate::context::ClientContext;
use crate::error::ClientError;
use crate::http::{ensure_success, post_json};
use crate::prompt::{PromptNode, PromptRender};
use crate::sse::json_event_stream;
use crate::types::{CompletionChunk, CompletionRequest, ModelParams, TextStream};

const OPERATION: &str = "createCompletion";

/// Streaming `createCompletion` adapter.
///
/// [`stream`](Self::stream) yields the empty in-flight placeholder and then
/// one cumulative string per upstream text fragment; [`run`](Self::run)
/// drains the stream and returns the final cumulative text.
#[derive(Debug, Clone)]
pub struct CompletionModel {
    ctx: ClientContext,
    params: ModelParams,
}

impl CompletionModel {
    pub fn new(ctx: ClientContext, params: ModelParams) -> Self {
        Self { ctx, params }
    }

    /// Stream cumulative completion text.
    ///
    /// The first item is always `""`, emitted before any render or network
    /// work so observers have a value while the request is constructed and
    /// sent. Each later item is a prefix-extension of the previous one.
    /// Dropping the stream tears down the underlying connection.
    pub fn stream<R>(self, renderer: R, prompt: PromptNode) -> TextStream
    where
        R: PromptRender + 'static,
    {
        let Self { ctx, params } = self;
        Box::pin(try_stream! {
            yield String::new();

            let prompt_text = renderer.render_text(&prompt).await?;
            let logit_bias = match &params.logit_bias {
                Some(bias) => Some(encode_token_bias(&params.model, bias)?),
                None => None,
            };
            let request = CompletionRequest {
                model: params.model.clone(),
                prompt: prompt_text,
                max_tokens: params.max_tokens,
                temperature: params.temperature,
                stop: params.stop.clone(),
                logit_bias,
                stream: true,
            };

            tracing::debug!(operation = OPERATION, model = %params.model, "sending request");
            let response = post_json(ctx.config(), "/completions", &request).await?;
            let response = ensure_success(response, OPERATION).await?;

            let mut events = Box::pin(json_event_stream(response.bytes_stream().map(
                |chunk| chunk.map_err(|e| ClientError::Http(format!("stream error: {e}"))),
            )));

            let mut accumulated = String::new();
            while let Some(event) = events.next().await {
                let chunk: CompletionChunk = serde_json::from_value(event?).map_err(|e| {
                    ClientError::MalformedStream(format!("unexpected completion event shape: {e}"))
                })?;
                if let Some(text) = chunk.choices.first().and_then(|c| c.text.as_deref()) {
                    accumulated.push_str(text);
                    yield accumulated.clone();
                }
            }
            tracing::debug!(operation = OPERATION, chars = accumulated.len(), "request finished");
        })
    }

    /// Run to completion and return the final cumulative text.
    pub async fn run<R>(self, renderer: R, prompt: PromptNode) -> Result<String, ClientError>
    where
        R: PromptRender + 'static,
    {
        let mut stream = self.stream(renderer, prompt);
        let mut last = String::new();
        while let Some(item) = stream.next().await {
            last = item?;
        }
        Ok(last)
    }
}
