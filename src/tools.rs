//! Tool-execution collaborator seam.
//!
//! Tools are named external capabilities (file I/O, terminal, browser
//! automation) owned by the embedding application. The engine invokes
//! them by name with JSON parameters and treats the catalogue as opaque.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Description of one available tool, used for the prompt catalogue and
/// defensive existence checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSpec {
    pub name: String,
    pub description: String,
}

impl ToolSpec {
    pub fn new(name: &str, description: &str) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
        }
    }
}

/// Tool-execution collaborator.
///
/// `execute` returns the tool's textual result; failures surface as
/// errors and are fed back into the task conversation by the runner,
/// never raised past it.
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Run a named tool with JSON parameters.
    async fn execute(&self, name: &str, params: &Value) -> Result<String>;

    /// List the available tools.
    fn list_tools(&self) -> Vec<ToolSpec>;

    /// Check whether a tool exists.
    fn has_tool(&self, name: &str) -> bool {
        self.list_tools().iter().any(|t| t.name == name)
    }
}
