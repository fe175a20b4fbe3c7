use crate::message::Message;
use crate::tool::ToolSchema;
use std::fmt;

/// Failure from a model backend. Opaque to the runner, which wraps it
/// without interpreting it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelError {
    pub message: String,
}

impl ModelError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "model provider error: {}", self.message)
    }
}

impl std::error::Error for ModelError {}

/// Lazy, pull-based sequence of response fragments. Abandoning it
/// mid-stream is a valid, silent cancellation.
pub type MessageStream<'a> = Box<dyn Iterator<Item = Result<Message, ModelError>> + 'a>;

/// Abstraction over an LLM backend.
///
/// The crate consumes this capability, it never implements a real one;
/// concrete providers are selected at construction time and injected into
/// an [`crate::Agent`].
pub trait ModelProvider: Send + Sync {
    /// Produce the next message for a conversation. When the model elects
    /// to call tools, the returned message carries `tool_calls`; otherwise
    /// it is a final answer.
    fn generate(&self, messages: &[Message], tools: &[ToolSchema]) -> Result<Message, ModelError>;

    /// Stream the response as partial fragments. Concatenating the
    /// fragments must equal the non-streaming [`generate`](Self::generate)
    /// result for the same inputs. The default yields that result once.
    fn stream<'a>(
        &'a self,
        messages: &[Message],
        tools: &[ToolSchema],
    ) -> Result<MessageStream<'a>, ModelError> {
        let message = self.generate(messages, tools)?;
        Ok(Box::new(std::iter::once(Ok(message))))
    }
}
