//! Tool-call parser.
//!
//! Extracts a structured tool invocation from free-form model output.
//! Output format reliability varies by provider and model, so the parser
//! tries several formats in order, falling through on malformed JSON:
//!
//! 1. XML tags: `<tool_call>NAME</tool_call><tool_params>JSON</tool_params>`
//! 2. An inline JSON object containing a `"tool"` key and a `params` object
//! 3. Key=value: `TOOL_CALL: name=X, params={...}`
//!
//! Text that merely mentions intending to use a tool ("I'll use X to...")
//! is not an invocation and yields no tool call.

use regex::Regex;
use serde_json::Value;

/// A structured tool invocation extracted from model output.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub params: Value,
}

/// Layered tool-call parser.
pub struct ToolCallParser {
    xml_re: Regex,
    kv_re: Regex,
    mention_re: Regex,
}

impl Default for ToolCallParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolCallParser {
    pub fn new() -> Self {
        Self {
            // Params tag is optional; a bare tool_call tag means no params.
            xml_re: Regex::new(
                r"(?s)<tool_call>\s*([\w\-]+)\s*</tool_call>(?:\s*<tool_params>(.*?)</tool_params>)?",
            )
            .expect("static regex"),
            kv_re: Regex::new(r"TOOL_CALL:\s*name\s*=\s*([\w\-]+)\s*,\s*params\s*=")
                .expect("static regex"),
            mention_re: Regex::new(
                r"(?i)\b(?:i'?ll|i\s+will|i\s+am\s+going\s+to|going\s+to|let\s+me)\s+use\s+(?:the\s+)?([\w\-]+)(?:\s+tool)?\s+(?:to|for)\b",
            )
            .expect("static regex"),
        }
    }

    /// Parse a tool call out of a model response, if one is present.
    ///
    /// Formats are tried in priority order; malformed JSON in a matched
    /// block falls through to the next format rather than failing the
    /// parse outright.
    pub fn parse(&self, text: &str) -> Option<ToolCall> {
        if let Some(call) = self.parse_xml(text) {
            return Some(call);
        }
        if let Some(call) = self.parse_inline_json(text) {
            return Some(call);
        }
        if let Some(call) = self.parse_key_value(text) {
            return Some(call);
        }

        if self.mention_re.is_match(text) {
            // A description of intent, not an invocation.
            tracing::debug!("response mentions a tool without a structured call");
        }
        None
    }

    fn parse_xml(&self, text: &str) -> Option<ToolCall> {
        let caps = self.xml_re.captures(text)?;
        let name = caps.get(1)?.as_str().to_string();
        let params = match caps.get(2) {
            Some(raw) => match serde_json::from_str::<Value>(raw.as_str().trim()) {
                Ok(value) => value,
                // Malformed params block: this pattern yields nothing.
                Err(_) => return None,
            },
            None => Value::Object(serde_json::Map::new()),
        };
        Some(ToolCall { name, params })
    }

    fn parse_inline_json(&self, text: &str) -> Option<ToolCall> {
        for (start, _) in text.char_indices().filter(|&(_, c)| c == '{') {
            // Cheap pre-check before attempting a full parse.
            let Some(slice) = balanced_json_slice(text, start) else {
                continue;
            };
            if !slice.contains("\"tool\"") {
                continue;
            }
            let Ok(value) = serde_json::from_str::<Value>(slice) else {
                continue;
            };
            let Some(name) = value.get("tool").and_then(|v| v.as_str()) else {
                continue;
            };
            if name.is_empty() {
                continue;
            }
            let params = value
                .get("params")
                .cloned()
                .filter(|p| p.is_object())
                .unwrap_or_else(|| Value::Object(serde_json::Map::new()));
            return Some(ToolCall {
                name: name.to_string(),
                params,
            });
        }
        None
    }

    fn parse_key_value(&self, text: &str) -> Option<ToolCall> {
        let caps = self.kv_re.captures(text)?;
        let name = caps.get(1)?.as_str().to_string();
        let after = &text[caps.get(0)?.end()..];
        let brace = after.find('{')?;
        let slice = balanced_json_slice(after, brace)?;
        let params = serde_json::from_str::<Value>(slice).ok()?;
        Some(ToolCall { name, params })
    }
}

/// Extract a balanced `{...}` slice starting at `start`, honoring JSON
/// string and escape rules. Returns `None` if the braces never balance.
fn balanced_json_slice(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + i + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
