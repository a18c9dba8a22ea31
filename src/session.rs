use std::time::{Duration, Instant};

use crate::reporter::Reporter;
use crate::results::{CommandLog, CommandLogger, Status, TestResult};

/// Runs the tests of one module and feeds their results to a [`Reporter`].
pub struct TestSession<'a> {
    module: String,
    reporter: &'a mut Reporter,
    logger: CommandLogger,
}

/// Handed to a running test so it can log the commands it executes.
pub struct CommandRecorder<'a> {
    test_name: &'a str,
    logger: &'a mut CommandLogger,
}

impl CommandRecorder<'_> {
    pub fn record(
        &mut self,
        node: &str,
        command: &str,
        exit_code: i32,
        output: &str,
        duration: Duration,
    ) {
        tracing::debug!(test = self.test_name, node, command, exit_code, "command executed");
        self.logger.add_log(
            self.test_name,
            CommandLog {
                node: node.to_string(),
                command: command.to_string(),
                exit_code,
                output: output.to_string(),
                timestamp: chrono::Local::now().naive_local(),
                duration: duration.as_secs_f64(),
            },
        );
    }
}

impl<'a> TestSession<'a> {
    pub fn new(module: impl Into<String>, reporter: &'a mut Reporter) -> Self {
        Self {
            module: module.into(),
            reporter,
            logger: CommandLogger::new(),
        }
    }

    /// Runs `test`, records its outcome and rewrites the reports.
    ///
    /// A failing test is not an error here; it is recorded as `FAIL` with the
    /// error chain as its message. Only writing the reports can fail.
    pub fn run_test<F>(&mut self, name: &str, test: F) -> anyhow::Result<Status>
    where
        F: FnOnce(&mut CommandRecorder<'_>) -> anyhow::Result<()>,
    {
        let start = Instant::now();
        let outcome = {
            let mut recorder = CommandRecorder {
                test_name: name,
                logger: &mut self.logger,
            };
            test(&mut recorder)
        };
        let duration = start.elapsed().as_secs_f64();

        let (status, error_message) = match outcome {
            Ok(()) => (Status::Pass, None),
            Err(err) => {
                tracing::warn!(module = %self.module, test = name, error = %format!("{err:#}"), "test failed");
                (Status::Fail, Some(format!("{err:#}")))
            }
        };

        let command_logs = serde_json::to_value(self.logger.get_logs(name))?;
        self.logger.clear_logs(name);

        self.reporter.add_result(TestResult {
            module_name: self.module.clone(),
            test_name: name.to_string(),
            status,
            duration,
            timestamp: chrono::Local::now().naive_local(),
            error_message,
            details: Some(serde_json::json!({ "command_logs": command_logs })),
        })?;
        Ok(status)
    }
}
