//! Test fixtures for integration tests.
//!
//! Provides mock model clients and tool executors so the full pipeline
//! runs without any real model or workspace access.

#![allow(dead_code)]

use async_trait::async_trait;
use ensemble::{
    ChatMessage, Error, InMemorySessionStore, ModelClient, Orchestrator, OrchestratorSettings,
    RegexResultExtractor, Result, SessionId, StaticSettings, ToolExecutor, ToolSpec,
};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// Model that answers by matching substrings of the task prompt against
/// scripted response queues. Unmatched prompts get a plain summary.
pub struct ScriptedModel {
    scripts: Mutex<Vec<(String, Vec<String>)>>,
}

impl ScriptedModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            scripts: Mutex::new(Vec::new()),
        })
    }

    /// Queue responses for prompts containing `needle`. Responses are
    /// consumed in order; the last one repeats.
    pub fn script(self: &Arc<Self>, needle: &str, responses: &[&str]) -> Arc<Self> {
        self.scripts.lock().unwrap().push((
            needle.to_string(),
            responses.iter().map(|s| s.to_string()).collect(),
        ));
        self.clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    async fn complete(&self, _model: &str, messages: &[ChatMessage]) -> Result<String> {
        let prompt = messages
            .iter()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();

        let mut scripts = self.scripts.lock().unwrap();
        for (needle, responses) in scripts.iter_mut() {
            if prompt.contains(needle.as_str()) {
                if responses.is_empty() {
                    break;
                }
                let response = if responses.len() > 1 {
                    responses.remove(0)
                } else {
                    responses[0].clone()
                };
                if response == "__fail__" {
                    return Err(Error::Model("scripted failure".to_string()));
                }
                return Ok(response);
            }
        }
        Ok("Summary: done".to_string())
    }
}

/// Model that tracks how many calls run at once and sleeps briefly so
/// overlap is observable.
pub struct GaugeModel {
    current: AtomicUsize,
    pub peak: AtomicUsize,
    pub calls: AtomicUsize,
    fail_on: Vec<String>,
}

impl GaugeModel {
    pub fn new() -> Arc<Self> {
        Self::failing_on(&[])
    }

    pub fn failing_on(descriptions: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
            fail_on: descriptions.iter().map(|s| s.to_string()).collect(),
        })
    }
}

#[async_trait]
impl ModelClient for GaugeModel {
    async fn complete(&self, _model: &str, messages: &[ChatMessage]) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let running = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(running, Ordering::SeqCst);
        tokio::time::sleep(std::time::Duration::from_millis(25)).await;
        self.current.fetch_sub(1, Ordering::SeqCst);

        let prompt = messages
            .iter()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default()
            .to_string();
        if self.fail_on.iter().any(|d| prompt.contains(d.as_str())) {
            return Err(Error::Model("scripted failure".to_string()));
        }
        Ok("Summary: done".to_string())
    }
}

/// Model that parks on its first call until released, so tests can act
/// while a task is mid-flight.
pub struct BlockingModel {
    pub started: Notify,
    release: Notify,
    blocked_once: AtomicUsize,
}

impl BlockingModel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            started: Notify::new(),
            release: Notify::new(),
            blocked_once: AtomicUsize::new(0),
        })
    }

    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl ModelClient for BlockingModel {
    async fn complete(&self, _model: &str, _messages: &[ChatMessage]) -> Result<String> {
        if self.blocked_once.fetch_add(1, Ordering::SeqCst) == 0 {
            self.started.notify_one();
            self.release.notified().await;
        }
        Ok("Summary: done".to_string())
    }
}

/// Tool executor that records every invocation.
#[derive(Default)]
pub struct RecordingTools {
    pub calls: Mutex<Vec<(String, Value)>>,
}

impl RecordingTools {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn call_names(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }
}

#[async_trait]
impl ToolExecutor for RecordingTools {
    async fn execute(&self, name: &str, params: &Value) -> Result<String> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), params.clone()));
        Ok(format!("{} ok", name))
    }

    fn list_tools(&self) -> Vec<ToolSpec> {
        vec![
            ToolSpec::new("run_command", "Run a shell command"),
            ToolSpec::new("create_file_or_folder", "Create a file or folder"),
            ToolSpec::new("rewrite_file", "Rewrite a file with new content"),
            ToolSpec::new("read_file", "Read a file"),
        ]
    }
}

pub fn sequential_settings() -> OrchestratorSettings {
    OrchestratorSettings {
        executor_models: vec!["strong-model".to_string(), "fast-model".to_string()],
        ..Default::default()
    }
}

pub fn parallel_settings(max_concurrent: usize) -> OrchestratorSettings {
    OrchestratorSettings {
        enable_parallel_execution: true,
        max_concurrent_tasks: max_concurrent,
        ..sequential_settings()
    }
}

pub fn orchestrator(
    model: Arc<dyn ModelClient>,
    tools: Arc<dyn ToolExecutor>,
    settings: OrchestratorSettings,
) -> Orchestrator {
    Orchestrator::new(
        Arc::new(InMemorySessionStore::new()),
        Arc::new(StaticSettings(settings)),
        model,
        tools,
        Arc::new(RegexResultExtractor::new()),
    )
}

pub fn session(name: &str) -> SessionId {
    SessionId::new(name)
}

/// Opt-in engine logs for debugging a test run with `--nocapture`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}
