mod builtin;
mod cli;
mod dom;
mod html;
mod progress;
mod reporter;
mod results;
mod session;
mod strict;
mod structure;
mod toggle;

use std::path::Path;

use anyhow::Context as _;
use cli::{CheckArgs, Command, RenderArgs, ToggleArgs};

pub use builtin::{REPORT_CSS, REPORT_JS};
pub use cli::{Args as CliArgs, Mode, ProgressMode, SelectorArgs};
pub use cli::{CheckArgs as CliCheckArgs, Command as CliCommand};
pub use cli::{RenderArgs as CliRenderArgs, ToggleArgs as CliToggleArgs};
pub use reporter::{ModuleData, ModuleStats, ReportData, Reporter, Summary, TestRow, load_results};
pub use results::{CommandLog, CommandLogger, ModuleResults, Status, TestResult};
pub use session::{CommandRecorder, TestSession};
pub use strict::assert_offline;
pub use structure::{PairingIssue, check_pairing};
pub use toggle::{Page, Rotation, Section, SectionState, Selectors, ToggleController};

pub fn run(args: CliArgs) -> anyhow::Result<()> {
    match args.command {
        Command::Render(a) => render(a).map(|_| ()),
        Command::Toggle(a) => toggle(a),
        Command::Check(a) => check(a),
    }
}

/// Re-renders a results file and returns the new execution directory's reporter.
pub fn render(args: RenderArgs) -> anyhow::Result<Reporter> {
    use std::io::IsTerminal as _;

    let progress_enabled = match args.progress {
        ProgressMode::Always => true,
        ProgressMode::Never => false,
        ProgressMode::Auto => std::io::stderr().is_terminal(),
    };
    let progress = progress::Progress::new(progress_enabled);

    progress.set_stage("reading results");
    let results = load_results(&args.input)?;
    tracing::info!(count = results.len(), input = %args.input.display(), "loaded results");

    let mut reporter = Reporter::new(&args.out, args.mode)?;

    progress.set_stage("collecting modules");
    let mut module_names: Vec<&str> = Vec::new();
    for r in &results {
        if !module_names.contains(&r.module_name.as_str()) {
            module_names.push(&r.module_name);
        }
    }
    progress.set_modules_total(module_names.len());

    let mut results = results.into_iter().peekable();
    while let Some(first) = results.next() {
        let module = first.module_name.clone();
        reporter.push(first);
        let mut count = 1;
        while let Some(next) = results.next_if(|r| r.module_name == module) {
            reporter.push(next);
            count += 1;
        }
        progress.module_done(&module, count);
    }

    progress.set_stage("writing reports");
    let res = reporter.save();
    progress.finish();
    res?;

    print!("{}", reporter.summary());
    Ok(reporter)
}

fn toggle(args: ToggleArgs) -> anyhow::Result<()> {
    let html = read_html(&args.input)?;
    let mut page = Page::parse(&html, args.selectors.into());
    page.content_ready();

    for index in &args.clicks {
        page.click_header(*index)?;
    }

    for state in page.controller().states() {
        let collapsed = match state.collapsed {
            Some(true) => "collapsed",
            Some(false) => "expanded",
            None => "no panel",
        };
        let rotation = state
            .rotation
            .map(|r| r.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("#{:<3} {:<10} {:>5}  {}", state.index, collapsed, rotation, state.title);
    }

    if let Some(out) = &args.out {
        std::fs::write(out, page.to_html()?).with_context(|| format!("write {}", out.display()))?;
        tracing::info!(out = %out.display(), "wrote toggled page");
    }
    Ok(())
}

fn check(args: CheckArgs) -> anyhow::Result<()> {
    let html = read_html(&args.input)?;
    let selectors: Selectors = args.selectors.into();

    let issues = check_pairing(&html, &selectors);
    for issue in &issues {
        println!("{issue}");
    }
    assert_offline(&html)?;
    if !issues.is_empty() {
        anyhow::bail!("{} pairing issue(s) in {}", issues.len(), args.input.display());
    }
    tracing::info!(input = %args.input.display(), "report structure ok");
    Ok(())
}

fn read_html(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}
