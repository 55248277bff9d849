//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use carton_domain::{DecisionNode, FloorViolation, Issue, Jurisdiction, NodeKey, Severity};
use carton_gatekeeper::ValidationResult;
use carton_ingest::{IngestReport, RecordOutcome, RecordStatus};
use carton_store::InvariantViolation;
use colored::*;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an ingestion report.
    pub fn report(&self, report: &IngestReport) -> Result<String> {
        if self.format == OutputFormat::Json {
            return json_of(report);
        }
        let mut lines = Vec::new();
        for outcome in report.outcomes().into_iter().filter(|o| !o.issues.is_empty()) {
            lines.push(self.outcome_line(outcome));
            lines.extend(outcome.issues.iter().map(|i| format!("    {}", self.issue_line(i))));
        }
        for notice in &report.drift {
            lines.push(self.warning(&format!("{} changed since last capture ({})", notice.url, notice.node)));
        }
        for jurisdiction in &report.cancelled {
            lines.push(self.warning(&format!("{} cancelled, nothing committed", jurisdiction)));
        }
        if !report.links.linked.is_empty() || !report.links.dangling.is_empty() {
            lines.push(self.info(&report.links.summary()));
        }
        lines.push(if report.rejected.is_empty() && report.conflicts.is_empty() {
            self.success(&report.summary())
        } else {
            self.error(&report.summary())
        });
        Ok(lines.join("\n"))
    }

    /// Format validation results, one per record.
    pub fn validation(&self, results: &[(usize, ValidationResult)]) -> Result<String> {
        if self.format == OutputFormat::Json {
            let entries: Vec<_> = results
                .iter()
                .map(|(index, result)| json!({ "index": index, "ok": result.ok, "errors": result.errors }))
                .collect();
            return json_of(&entries);
        }
        let mut lines = Vec::new();
        for (index, result) in results {
            let head = format!("record {}", index);
            lines.push(if result.ok { self.success(&head) } else { self.error(&head) });
            lines.extend(result.errors.iter().map(|i| format!("    {}", self.issue_line(i))));
        }
        Ok(lines.join("\n"))
    }

    /// Format consistency violations.
    pub fn violations(&self, violations: &[InvariantViolation]) -> Result<String> {
        if self.format == OutputFormat::Json {
            return json_of(&violations);
        }
        if violations.is_empty() {
            return Ok(self.success("Graph is consistent"));
        }
        let mut lines: Vec<String> = violations.iter().map(|v| self.error(&v.to_string())).collect();
        lines.push(self.warning(&format!("{} violation(s)", violations.len())));
        Ok(lines.join("\n"))
    }

    /// Format floor violations of one jurisdiction.
    pub fn floor_diff(&self, jurisdiction: &Jurisdiction, diff: &BTreeMap<NodeKey, Vec<FloorViolation>>) -> Result<String> {
        if self.format == OutputFormat::Json {
            let by_key: BTreeMap<String, _> = diff.iter().map(|(k, v)| (k.to_string(), v)).collect();
            return json_of(&by_key);
        }
        if diff.is_empty() {
            return Ok(self.success(&format!("{} meets the federal floor", jurisdiction)));
        }
        let mut lines = Vec::new();
        for (key, violations) in diff {
            lines.push(self.error(&key.to_string()));
            lines.extend(violations.iter().map(|v| format!("    {}", v)));
        }
        Ok(lines.join("\n"))
    }

    /// Format one node, or every version of it.
    pub fn nodes(&self, nodes: &[DecisionNode]) -> Result<String> {
        match (self.format, nodes) {
            (OutputFormat::Json, [node]) => json_of(node),
            (OutputFormat::Json, _) => json_of(&nodes),
            (OutputFormat::Text, _) => {
                let mut blocks = Vec::new();
                for node in nodes {
                    let head = format!("{} v{}: {}", node.key(), node.version, node.title.as_deref().unwrap_or("untitled"));
                    blocks.push(format!("{}\n{}", self.colorize(&head, "cyan"), json_of(node)?));
                }
                Ok(blocks.join("\n\n"))
            }
        }
    }

    /// Format a traversal, in visiting order.
    pub fn reached(&self, reached: &[(NodeKey, usize)]) -> Result<String> {
        if self.format == OutputFormat::Json {
            let entries: Vec<_> = reached
                .iter()
                .map(|(key, depth)| json!({ "key": key.to_string(), "depth": depth }))
                .collect();
            return json_of(&entries);
        }
        Ok(reached
            .iter()
            .map(|(key, depth)| format!("{}{}", "  ".repeat(*depth), key))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn outcome_line(&self, outcome: &RecordOutcome) -> String {
        let key = outcome.key.as_ref().map(|k| k.to_string()).unwrap_or_else(|| "?".to_string());
        let line = format!("[{}] {} {}", outcome.index, key, outcome.status.as_str());
        match outcome.status {
            RecordStatus::Rejected | RecordStatus::Held => self.error(&line),
            _ => self.warning(&line),
        }
    }

    fn issue_line(&self, issue: &Issue) -> String {
        let color = match issue.severity {
            Severity::Error => "red",
            Severity::Warning => "yellow",
        };
        format!("{} at {}: {}", self.colorize(issue.code.as_str(), color), issue.path, issue.message)
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().to_string(),
            _ => text.to_string(),
        }
    }
}

fn json_of<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}
