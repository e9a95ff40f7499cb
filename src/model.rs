//! Model-call collaborator seam.
//!
//! The engine treats a model call as "submit conversation, block until
//! full text or failure". Streaming, provider selection, and transport
//! details live behind this trait in the embedding application.

use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// A single message in a model conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user", or "assistant".
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }

    pub fn assistant(content: &str) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.to_string(),
        }
    }
}

/// Model-call collaborator.
///
/// Implementations submit the conversation to the named model and return
/// the complete response text. Transport failures surface as
/// [`Error::Model`].
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn complete(&self, model: &str, messages: &[ChatMessage]) -> Result<String>;
}

/// Call the model with a wall-clock timeout.
///
/// An elapsed timeout fails the call with [`Error::ModelTimeout`]; the
/// underlying future is dropped, not awaited further.
pub async fn complete_with_timeout(
    client: &dyn ModelClient,
    model: &str,
    messages: &[ChatMessage],
    timeout: Duration,
) -> Result<String> {
    match tokio::time::timeout(timeout, client.complete(model, messages)).await {
        Ok(result) => result,
        Err(_) => Err(Error::ModelTimeout(timeout)),
    }
}
