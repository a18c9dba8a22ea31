use std::collections::BTreeMap;
use std::fmt;

use anyhow::Context as _;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Status {
    #[serde(rename = "PASS")]
    Pass,
    #[serde(rename = "FAIL")]
    Fail,
}

impl Status {
    pub fn css_class(self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pass => f.write_str("PASS"),
            Status::Fail => f.write_str("FAIL"),
        }
    }
}

/// One command executed on a node while a test was running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandLog {
    pub node: String,
    pub command: String,
    pub exit_code: i32,
    pub output: String,
    pub timestamp: NaiveDateTime,
    /// Seconds.
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TestResult {
    pub module_name: String,
    pub test_name: String,
    pub status: Status,
    /// Seconds.
    pub duration: f64,
    pub timestamp: NaiveDateTime,
    pub error_message: Option<String>,
    pub details: Option<serde_json::Value>,
}

impl TestResult {
    /// Command logs stored under `details.command_logs`, if any parse.
    pub fn command_logs(&self) -> Vec<CommandLog> {
        self.details
            .as_ref()
            .and_then(|d| d.get("command_logs"))
            .and_then(|logs| serde_json::from_value(logs.clone()).ok())
            .unwrap_or_default()
    }
}

/// Entry shape inside `test_report.json`; the module name is the map key.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResultEntry {
    pub test_name: String,
    pub status: Status,
    pub duration: f64,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub details: Option<serde_json::Value>,
}

/// Results of one test module, in the order they were recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleResults {
    pub name: String,
    pub results: Vec<TestResult>,
}

/// `modules` keeps the order modules were first seen in.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReportJson {
    pub execution_timestamp: String,
    pub modules: serde_json::Map<String, serde_json::Value>,
}

impl ReportJson {
    pub fn from_results(execution: &str, modules: &[ModuleResults]) -> anyhow::Result<Self> {
        let mut map = serde_json::Map::new();
        for module in modules {
            let entries: Vec<ResultEntry> = module
                .results
                .iter()
                .map(|r| ResultEntry {
                    test_name: r.test_name.clone(),
                    status: r.status,
                    duration: r.duration,
                    timestamp: r.timestamp,
                    error_message: r.error_message.clone(),
                    details: r.details.clone(),
                })
                .collect();
            map.insert(module.name.clone(), serde_json::to_value(entries)?);
        }
        Ok(Self {
            execution_timestamp: execution.to_string(),
            modules: map,
        })
    }

    pub fn into_results(self) -> anyhow::Result<Vec<TestResult>> {
        let mut out = Vec::new();
        for (module, entries) in self.modules {
            let entries: Vec<ResultEntry> = serde_json::from_value(entries)
                .with_context(|| format!("parse results of module {module}"))?;
            out.extend(entries.into_iter().map(|e| TestResult {
                module_name: module.clone(),
                test_name: e.test_name,
                status: e.status,
                duration: e.duration,
                timestamp: e.timestamp,
                error_message: e.error_message,
                details: e.details,
            }));
        }
        Ok(out)
    }
}

/// Command logs buffered per test name until the test finishes.
#[derive(Debug, Default)]
pub struct CommandLogger {
    logs: BTreeMap<String, Vec<CommandLog>>,
}

impl CommandLogger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_log(&mut self, test_name: &str, log: CommandLog) {
        self.logs.entry(test_name.to_string()).or_default().push(log);
    }

    pub fn get_logs(&self, test_name: &str) -> &[CommandLog] {
        self.logs.get(test_name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn clear_logs(&mut self, test_name: &str) {
        self.logs.remove(test_name);
    }

    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(&self.logs).unwrap_or_default()
    }
}
