use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::builtin;
use crate::cli::Mode;
use crate::html;
use crate::results::{CommandLog, ModuleResults, ReportJson, Status, TestResult};
use crate::strict;

pub const JSON_REPORT: &str = "test_report.json";
pub const HTML_REPORT: &str = "test_report.html";
pub const CSS_ASSET: &str = "report.css";
pub const JS_ASSET: &str = "report.js";

pub struct Summary {
    pub total_tests: usize,
    pub passed_tests: usize,
    pub failed_tests: usize,
    pub success_rate: String,
    pub total_modules: usize,
}

pub struct ModuleStats {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub success_rate: String,
}

pub struct TestRow {
    pub name: String,
    pub status: Status,
    pub duration: String,
    pub timestamp: String,
    pub error_message: Option<String>,
    pub command_logs: Vec<CommandLog>,
}

pub struct ModuleData {
    pub name: String,
    pub stats: ModuleStats,
    pub tests: Vec<TestRow>,
}

/// Everything the HTML page and the console summary show.
pub struct ReportData {
    pub execution_id: String,
    pub timestamp: String,
    pub summary: Summary,
    pub modules: Vec<ModuleData>,
}

/// Owns one execution directory and rewrites its reports as results arrive.
pub struct Reporter {
    execution_dir: PathBuf,
    execution_id: String,
    mode: Mode,
    /// Modules in the order their first result arrived.
    modules: Vec<ModuleResults>,
}

impl Reporter {
    /// Creates `output_dir/execution_<YYYYmmdd_HHMMSS>` for a fresh run.
    pub fn new(output_dir: impl AsRef<Path>, mode: Mode) -> anyhow::Result<Self> {
        let name = chrono::Local::now()
            .format("execution_%Y%m%d_%H%M%S")
            .to_string();
        Self::with_execution_name(output_dir, &name, mode)
    }

    pub fn with_execution_name(
        output_dir: impl AsRef<Path>,
        name: &str,
        mode: Mode,
    ) -> anyhow::Result<Self> {
        let output_dir = output_dir.as_ref();
        let execution_dir = output_dir.join(name);
        std::fs::create_dir_all(&execution_dir)
            .with_context(|| format!("create {}", execution_dir.display()))?;

        let reporter = Self {
            execution_dir,
            execution_id: name.to_string(),
            mode,
            modules: Vec::new(),
        };
        if matches!(mode, Mode::Dir) {
            reporter.write_static_assets()?;
        }
        tracing::info!(dir = %reporter.execution_dir.display(), "execution directory ready");
        Ok(reporter)
    }

    pub fn execution_dir(&self) -> &Path {
        &self.execution_dir
    }

    pub fn html_path(&self) -> PathBuf {
        self.execution_dir.join(HTML_REPORT)
    }

    pub fn json_path(&self) -> PathBuf {
        self.execution_dir.join(JSON_REPORT)
    }

    pub fn modules(&self) -> &[ModuleResults] {
        &self.modules
    }

    /// Results recorded for `name`, in arrival order.
    pub fn module(&self, name: &str) -> Option<&[TestResult]> {
        self.modules
            .iter()
            .find(|m| m.name == name)
            .map(|m| m.results.as_slice())
    }

    /// Records a result and rewrites both reports.
    pub fn add_result(&mut self, result: TestResult) -> anyhow::Result<()> {
        self.push(result);
        self.save()
    }

    /// Records a result without touching the files on disk.
    pub fn push(&mut self, result: TestResult) {
        tracing::debug!(
            module = %result.module_name,
            test = %result.test_name,
            status = %result.status,
            "recorded result"
        );
        match self.modules.iter_mut().find(|m| m.name == result.module_name) {
            Some(module) => module.results.push(result),
            None => self.modules.push(ModuleResults {
                name: result.module_name.clone(),
                results: vec![result],
            }),
        }
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let json = ReportJson::from_results(&self.execution_id, &self.modules)?;
        let json_path = self.json_path();
        let text = serde_json::to_string_pretty(&json).context("serialize test_report.json")?;
        std::fs::write(&json_path, text)
            .with_context(|| format!("write {}", json_path.display()))?;

        let page = html::build_report(&self.report_data(), self.mode);
        strict::assert_offline(&page)?;
        let html_path = self.html_path();
        std::fs::write(&html_path, page)
            .with_context(|| format!("write {}", html_path.display()))?;
        Ok(())
    }

    pub fn report_data(&self) -> ReportData {
        let all: Vec<&TestResult> = self.modules.iter().flat_map(|m| &m.results).collect();
        let total_tests = all.len();
        let passed_tests = all.iter().filter(|r| r.status == Status::Pass).count();

        let modules = self
            .modules
            .iter()
            .map(|ModuleResults { name, results: tests }| {
                let passed = tests.iter().filter(|r| r.status == Status::Pass).count();
                ModuleData {
                    name: name.clone(),
                    stats: ModuleStats {
                        total: tests.len(),
                        passed,
                        failed: tests.len() - passed,
                        success_rate: success_rate(passed, tests.len()),
                    },
                    tests: tests.iter().map(test_row).collect(),
                }
            })
            .collect();

        ReportData {
            execution_id: self.execution_id.clone(),
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            summary: Summary {
                total_tests,
                passed_tests,
                failed_tests: total_tests - passed_tests,
                success_rate: success_rate(passed_tests, total_tests),
                total_modules: self.modules.len(),
            },
            modules,
        }
    }

    /// Console summary of the run.
    pub fn summary(&self) -> String {
        let data = self.report_data();
        let s = &data.summary;
        let mut out = String::new();
        let _ = writeln!(out, "\nTest Execution Summary");
        let _ = writeln!(out, "{}", "=".repeat(50));
        let _ = writeln!(out, "Total Tests: {}", s.total_tests);
        let _ = writeln!(out, "Passed: {}", s.passed_tests);
        let _ = writeln!(out, "Failed: {}", s.failed_tests);
        let _ = writeln!(out, "Success Rate: {}%", s.success_rate);
        let _ = writeln!(out, "Total Modules: {}", s.total_modules);

        let _ = writeln!(out, "\nModule Statistics:");
        for module in &data.modules {
            let _ = writeln!(out, "\n{}:", module.name);
            let _ = writeln!(out, "  Total: {}", module.stats.total);
            let _ = writeln!(out, "  Passed: {}", module.stats.passed);
            let _ = writeln!(out, "  Failed: {}", module.stats.failed);
            let _ = writeln!(out, "  Success Rate: {}%", module.stats.success_rate);
        }

        let _ = writeln!(
            out,
            "\nDetailed report available at: {}",
            self.html_path().display()
        );
        out
    }

    fn write_static_assets(&self) -> anyhow::Result<()> {
        for (name, content) in [(CSS_ASSET, builtin::REPORT_CSS), (JS_ASSET, builtin::REPORT_JS)] {
            let path = self.execution_dir.join(name);
            std::fs::write(&path, content).with_context(|| format!("write {}", path.display()))?;
        }
        Ok(())
    }
}

/// Reads a `test_report.json` written by a previous run.
pub fn load_results(path: &Path) -> anyhow::Result<Vec<TestResult>> {
    let bytes = std::fs::read(path).with_context(|| format!("read {}", path.display()))?;
    let report: ReportJson = serde_json::from_slice(&bytes)
        .with_context(|| format!("parse {}", path.display()))?;
    report
        .into_results()
        .with_context(|| format!("parse {}", path.display()))
}

fn success_rate(passed: usize, total: usize) -> String {
    if total == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", passed as f64 / total as f64 * 100.0)
}

fn test_row(r: &TestResult) -> TestRow {
    TestRow {
        name: r.test_name.clone(),
        status: r.status,
        duration: format!("{:.2}", r.duration),
        timestamp: r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
        error_message: r.error_message.clone(),
        command_logs: r.command_logs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use tempfile::tempdir;

    fn result(module: &str, name: &str, status: Status) -> TestResult {
        TestResult {
            module_name: module.to_string(),
            test_name: name.to_string(),
            status,
            duration: 1.234,
            timestamp: NaiveDateTime::parse_from_str("2024-05-01 10:00:00", "%Y-%m-%d %H:%M:%S")
                .unwrap(),
            error_message: (status == Status::Fail).then(|| "Node1 cannot ping Node2".to_string()),
            details: None,
        }
    }

    #[test]
    fn empty_report_has_zero_rate() {
        let tmp = tempdir().unwrap();
        let reporter = Reporter::with_execution_name(tmp.path(), "execution_x", Mode::Dir).unwrap();
        let data = reporter.report_data();
        assert_eq!(data.summary.total_tests, 0);
        assert_eq!(data.summary.success_rate, "0.0");
        assert!(data.modules.is_empty());
        assert!(tmp.path().join("execution_x/report.css").exists());
        assert!(tmp.path().join("execution_x/report.js").exists());
    }

    #[test]
    fn stats_per_module() {
        let tmp = tempdir().unwrap();
        let mut reporter =
            Reporter::with_execution_name(tmp.path(), "execution_x", Mode::Dir).unwrap();
        reporter.push(result("vlan", "test_vlan_isolation", Status::Pass));
        reporter.push(result("connectivity", "test_ping", Status::Pass));
        reporter.push(result("connectivity", "test_routes", Status::Fail));
        reporter.push(result("connectivity", "test_iface", Status::Pass));

        let data = reporter.report_data();
        assert_eq!(data.summary.total_tests, 4);
        assert_eq!(data.summary.passed_tests, 3);
        assert_eq!(data.summary.failed_tests, 1);
        assert_eq!(data.summary.success_rate, "75.0");
        assert_eq!(data.summary.total_modules, 2);

        assert_eq!(data.modules[0].name, "vlan");
        assert_eq!(data.modules[0].stats.success_rate, "100.0");
        let connectivity = &data.modules[1];
        assert_eq!(connectivity.name, "connectivity");
        assert_eq!(connectivity.stats.failed, 1);
        assert_eq!(connectivity.stats.success_rate, "66.7");
        assert_eq!(connectivity.tests[0].duration, "1.23");
        assert_eq!(connectivity.tests[0].timestamp, "2024-05-01 10:00:00");
    }

    #[test]
    fn add_result_rewrites_reports() {
        let tmp = tempdir().unwrap();
        let mut reporter =
            Reporter::with_execution_name(tmp.path(), "execution_x", Mode::Dir).unwrap();
        reporter
            .add_result(result("connectivity", "test_ping", Status::Fail))
            .unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(reporter.json_path()).unwrap()).unwrap();
        assert_eq!(json["execution_timestamp"], "execution_x");
        assert_eq!(json["modules"]["connectivity"][0]["status"], "FAIL");
        assert_eq!(
            json["modules"]["connectivity"][0]["error_message"],
            "Node1 cannot ping Node2"
        );

        let html = std::fs::read_to_string(reporter.html_path()).unwrap();
        assert!(html.contains("test_ping"));

        let reloaded = load_results(&reporter.json_path()).unwrap();
        assert_eq!(reloaded, vec![result("connectivity", "test_ping", Status::Fail)]);
    }

    #[test]
    fn summary_lists_modules() {
        let tmp = tempdir().unwrap();
        let mut reporter =
            Reporter::with_execution_name(tmp.path(), "execution_x", Mode::Single).unwrap();
        reporter.push(result("vlan", "test_vlan_isolation", Status::Pass));
        let text = reporter.summary();
        assert!(text.contains("Total Tests: 1"));
        assert!(text.contains("Success Rate: 100.0%"));
        assert!(text.contains("\nvlan:\n  Total: 1"));
        assert!(text.contains("test_report.html"));
        assert!(!tmp.path().join("execution_x/report.js").exists());
    }

    #[test]
    fn modules_keep_arrival_order_through_reload() {
        let tmp = tempdir().unwrap();
        let mut reporter =
            Reporter::with_execution_name(tmp.path(), "execution_x", Mode::Dir).unwrap();
        reporter.push(result("vlan", "test_vlan_isolation", Status::Pass));
        reporter.push(result("connectivity", "test_ping", Status::Fail));
        reporter.push(result("vlan", "test_trunk", Status::Pass));
        reporter.save().unwrap();

        let names: Vec<&str> = reporter.modules().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["vlan", "connectivity"]);
        assert_eq!(reporter.module("vlan").unwrap().len(), 2);
        assert!(reporter.module("dns").is_none());

        let reloaded = load_results(&reporter.json_path()).unwrap();
        let order: Vec<&str> = reloaded.iter().map(|r| r.module_name.as_str()).collect();
        assert_eq!(order, ["vlan", "vlan", "connectivity"]);

        let html = std::fs::read_to_string(reporter.html_path()).unwrap();
        assert!(html.find("test_vlan_isolation").unwrap() < html.find("test_ping").unwrap());
    }
}
