//! OpenAI-style streaming adapters.
//!
//! [`CompletionModel`] drives `createCompletion`; [`ChatModel`] drives
//! `createChatCompletion`. Both render the prompt, issue the request, run
//! the error classifier, and fold the decoded event stream into
//! monotonically growing cumulative results.

mod chat;
mod completion;

pub use chat::ChatModel;
pub use completion::CompletionModel;
