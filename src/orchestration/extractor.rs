//! Structured-result extraction.
//!
//! Pulls a summary plus file/command/browser lists out of a final
//! free-form model response. Regex extraction from prose is inherently
//! brittle, so the strategy sits behind a trait and can be swapped for
//! stricter structured output without touching the runner or scheduler.

use regex::Regex;

/// Structured fields extracted from a final model response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedResult {
    pub summary: String,
    pub files: Vec<String>,
    pub commands: Vec<String>,
    pub browser_actions: Vec<String>,
}

/// Result-extraction strategy.
pub trait ResultExtractor: Send + Sync {
    fn extract(&self, text: &str) -> ExtractedResult;
}

/// Line-oriented regex extractor.
///
/// Recognizes labeled lines in English and Portuguese:
///
/// ```text
/// Summary: rewrote the parser
/// Files: src/parser.rs, src/lib.rs
/// Commands: cargo fmt
/// Browser: opened https://example.com
/// ```
///
/// Without a summary label, the first non-empty line stands in as the
/// summary. List lines split on commas; repeated labels accumulate.
pub struct RegexResultExtractor {
    summary_re: Regex,
    files_re: Regex,
    commands_re: Regex,
    browser_re: Regex,
}

impl Default for RegexResultExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RegexResultExtractor {
    pub fn new() -> Self {
        Self {
            summary_re: Regex::new(r"(?im)^\s*(?:summary|resumo)\s*[:\-]\s*(.+)$")
                .expect("static regex"),
            files_re: Regex::new(
                r"(?im)^\s*(?:files?(?:\s+(?:modified|created|changed))?|arquivos?(?:\s+(?:modificados|criados))?)\s*[:\-]\s*(.+)$",
            )
            .expect("static regex"),
            commands_re: Regex::new(
                r"(?im)^\s*(?:commands?(?:\s+(?:executed|run))?|comandos?(?:\s+executados)?)\s*[:\-]\s*(.+)$",
            )
            .expect("static regex"),
            browser_re: Regex::new(
                r"(?im)^\s*(?:browser(?:\s+actions?)?|navegador)\s*[:\-]\s*(.+)$",
            )
            .expect("static regex"),
        }
    }

    fn collect_list(&self, re: &Regex, text: &str) -> Vec<String> {
        let mut items = Vec::new();
        for caps in re.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                for item in m.as_str().split(',') {
                    let item = item.trim();
                    if !item.is_empty() && !items.iter().any(|existing| existing == item) {
                        items.push(item.to_string());
                    }
                }
            }
        }
        items
    }
}

impl ResultExtractor for RegexResultExtractor {
    fn extract(&self, text: &str) -> ExtractedResult {
        let summary = self
            .summary_re
            .captures(text)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim().to_string())
            .or_else(|| {
                text.lines()
                    .map(str::trim)
                    .find(|line| !line.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_default();

        ExtractedResult {
            summary,
            files: self.collect_list(&self.files_re, text),
            commands: self.collect_list(&self.commands_re, text),
            browser_actions: self.collect_list(&self.browser_re, text),
        }
    }
}
