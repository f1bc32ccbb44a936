//! # sipstream
//!
//! Streaming-first client for OpenAI-style completion APIs.
//!
//! A model invocation renders a prompt tree into a request payload, issues
//! it with `stream: true`, classifies the response status, decodes the SSE
//! body into JSON events, and folds them into a monotonically growing
//! result that callers observe as it accumulates:
//!
//! ```rust,ignore
//! use futures_util::StreamExt;
//! use sipstream::prelude::*;
//!
//! let ctx = ClientContext::new(ClientConfig::new(api_key));
//! let model = ChatModel::new(ctx, ModelParams::new("gpt-4"));
//! let prompt = PromptNode::user(vec![PromptNode::text("Hello!")]);
//!
//! let mut stream = model.stream(TreeRenderer, prompt);
//! while let Some(snapshot) = stream.next().await {
//!     println!("{}", snapshot?.content);
//! }
//! ```
//!
//! Backpressure is automatic: the producer suspends after each emission
//! until the consumer polls again, and dropping the stream tears down the
//! underlying connection. Nothing is retried internally; every error is
//! fatal to its invocation and surfaces as a [`ClientError`].

pub mod bias;
pub mod context;
pub mod error;
pub mod prompt;
pub mod providers;
pub mod sse;
pub mod types;

mod http;

pub use error::ClientError;

/// Convenient single-import surface.
pub mod prelude {
    pub use crate::context::{ClientConfig, ClientContext};
    pub use crate::error::ClientError;
    pub use crate::prompt::{PromptNode, PromptRender, TreeRenderer};
    pub use crate::providers::openai::{ChatModel, CompletionModel};
    pub use crate::types::{
        ChatMessage, ChatSnapshot, ChatStream, MessageRole, ModelParams, TextStream,
    };
}
