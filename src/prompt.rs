//! Prompt tree and the render capability consumed by the model adapters.
//!
//! The composition framework that produces these trees is external; the
//! adapters only need two operations from it: flatten a subtree to text, and
//! render a subtree while halting descent at message-boundary nodes.

use async_trait::async_trait;

use crate::error::ClientError;

/// A node in the prompt tree.
///
/// The chat path dispatches on exactly three message-role variants;
/// [`PromptNode::Other`] is the distinguished fallback for everything else
/// and is rejected at message position.
#[derive(Debug, Clone, PartialEq)]
pub enum PromptNode {
    /// Literal text.
    Text(String),
    /// A system message subtree.
    System(Vec<PromptNode>),
    /// A user message subtree, optionally tagged with a participant name.
    User {
        name: Option<String>,
        children: Vec<PromptNode>,
    },
    /// An assistant message subtree.
    Assistant(Vec<PromptNode>),
    /// Any other element. Transparent in flat-text rendering.
    Other {
        tag: String,
        children: Vec<PromptNode>,
    },
}

impl PromptNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn system(children: Vec<PromptNode>) -> Self {
        Self::System(children)
    }

    pub fn user(children: Vec<PromptNode>) -> Self {
        Self::User {
            name: None,
            children,
        }
    }

    pub fn named_user(name: impl Into<String>, children: Vec<PromptNode>) -> Self {
        Self::User {
            name: Some(name.into()),
            children,
        }
    }

    pub fn assistant(children: Vec<PromptNode>) -> Self {
        Self::Assistant(children)
    }

    pub fn other(tag: impl Into<String>, children: Vec<PromptNode>) -> Self {
        Self::Other {
            tag: tag.into(),
            children,
        }
    }

    /// Tag name used by stop predicates and error messages.
    pub fn tag(&self) -> &str {
        match self {
            Self::Text(_) => "text",
            Self::System(_) => "system",
            Self::User { .. } => "user",
            Self::Assistant(_) => "assistant",
            Self::Other { tag, .. } => tag,
        }
    }

    fn children(&self) -> &[PromptNode] {
        match self {
            Self::Text(_) => &[],
            Self::System(children)
            | Self::Assistant(children)
            | Self::User { children, .. }
            | Self::Other { children, .. } => children,
        }
    }
}

/// The rendering capability the adapters consume.
#[async_trait]
pub trait PromptRender: Send + Sync {
    /// Flatten a subtree to a single string.
    async fn render_text(&self, node: &PromptNode) -> Result<String, ClientError>;

    /// Render a subtree, halting descent wherever the predicate matches a
    /// node's tag. Returns the surviving top-level nodes in document order:
    /// matched nodes are kept whole, text is kept as-is, and unmatched
    /// containers are replaced by their rendered children.
    async fn render_until(
        &self,
        node: &PromptNode,
        stop: &(dyn for<'s> Fn(&'s str) -> bool + Send + Sync),
    ) -> Result<Vec<PromptNode>, ClientError>;
}

/// Depth-first renderer over an in-memory prompt tree.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeRenderer;

impl TreeRenderer {
    fn flatten(node: &PromptNode, out: &mut String) {
        match node {
            PromptNode::Text(text) => out.push_str(text),
            _ => {
                for child in node.children() {
                    Self::flatten(child, out);
                }
            }
        }
    }

    fn collect(
        node: &PromptNode,
        stop: &(dyn for<'s> Fn(&'s str) -> bool + Send + Sync),
        out: &mut Vec<PromptNode>,
    ) {
        if stop(node.tag()) {
            out.push(node.clone());
            return;
        }
        match node {
            PromptNode::Text(_) => out.push(node.clone()),
            _ => {
                for child in node.children() {
                    Self::collect(child, stop, out);
                }
            }
        }
    }
}

#[async_trait]
impl PromptRender for TreeRenderer {
    async fn render_text(&self, node: &PromptNode) -> Result<String, ClientError> {
        let mut out = String::new();
        Self::flatten(node, &mut out);
        Ok(out)
    }

    async fn render_until(
        &self,
        node: &PromptNode,
        stop: &(dyn for<'s> Fn(&'s str) -> bool + Send + Sync),
    ) -> Result<Vec<PromptNode>, ClientError> {
        let mut out = Vec::new();
        Self::collect(node, stop, &mut out);
        Ok(out)
    }
}
