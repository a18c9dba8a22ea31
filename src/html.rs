use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::builtin;
use crate::cli::Mode;
use crate::reporter::{CSS_ASSET, JS_ASSET, ModuleData, ReportData, TestRow};
use crate::results::CommandLog;

pub fn build_report(data: &ReportData, mode: Mode) -> String {
    let s = &data.summary;
    let markup: Markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { "Network Test Report - " (data.execution_id) }
                @match mode {
                    Mode::Dir => { link rel="stylesheet" href=(CSS_ASSET); }
                    Mode::Single => { style { (PreEscaped(builtin::REPORT_CSS)) } }
                }
            }
            body {
                div class="container" {
                    header class="report-header" {
                        h1 { "Network Test Report" }
                        div class="meta" {
                            "Execution: " (data.execution_id) " | Generated: " (data.timestamp)
                        }
                    }
                    section class="summary" {
                        (summary_card("Total Tests", &s.total_tests.to_string(), None))
                        (summary_card("Passed", &s.passed_tests.to_string(), Some("pass")))
                        (summary_card("Failed", &s.failed_tests.to_string(), Some("fail")))
                        (summary_card("Success Rate", &format!("{}%", s.success_rate), None))
                        (summary_card("Modules", &s.total_modules.to_string(), None))
                    }
                    main class="modules" {
                        @for module in &data.modules {
                            (render_module(module))
                        }
                    }
                    footer class="footer" {
                        "Click a test to show its details."
                    }
                }
                @match mode {
                    Mode::Dir => { script src=(JS_ASSET) {} }
                    Mode::Single => { script { (PreEscaped(builtin::REPORT_JS)) } }
                }
            }
        }
    };
    markup.into_string()
}

fn summary_card(label: &str, value: &str, class: Option<&str>) -> Markup {
    let value_class = match class {
        Some(c) => format!("value {c}"),
        None => "value".to_string(),
    };
    html! {
        div class="card" {
            div class="label" { (label) }
            div class=(value_class) { (value) }
        }
    }
}

fn render_module(module: &ModuleData) -> Markup {
    let st = &module.stats;
    html! {
        section class="module" id=(format!("module-{}", module.name)) {
            div class="module-header" {
                h2 { (module.name) }
                span class="module-stats" {
                    (st.passed) "/" (st.total) " passed, "
                    (st.failed) " failed (" (st.success_rate) "%)"
                }
            }
            @for test in &module.tests {
                (render_test(test))
            }
        }
    }
}

// The details panel must stay the header's next element sibling.
fn render_test(t: &TestRow) -> Markup {
    let class = t.status.css_class();
    html! {
        div class=(format!("test-case {class}")) {
            div class="test-header" {
                i class="fas fa-chevron-right" { "\u{25B6}" }
                span class="test-name" { (t.name) }
                span class=(format!("status-badge {class}")) { (t.status.to_string()) }
                span class="duration" { (t.duration) "s" }
            }
            div class="test-details" {
                p class="timestamp" { "Finished at " (t.timestamp) }
                @if let Some(err) = &t.error_message {
                    pre class="error-message" { (err) }
                }
                @if t.command_logs.is_empty() {
                    p class="no-logs" { "No commands recorded." }
                } @else {
                    (render_command_logs(&t.command_logs))
                }
            }
        }
    }
}

fn render_command_logs(logs: &[CommandLog]) -> Markup {
    html! {
        table class="command-logs" {
            thead {
                tr {
                    th { "Node" }
                    th { "Command" }
                    th { "Exit" }
                    th { "Duration" }
                    th { "Output" }
                }
            }
            tbody {
                @for log in logs {
                    tr {
                        td { (log.node) }
                        td { code { (log.command) } }
                        td class=(if log.exit_code == 0 { "exit-code" } else { "exit-code nonzero" }) {
                            (log.exit_code)
                        }
                        td { (format!("{:.2}s", log.duration)) }
                        td { pre { (log.output) } }
                    }
                }
            }
        }
    }
}
