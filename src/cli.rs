use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

use crate::toggle::Selectors;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// `test_report.html` next to `report.css` and `report.js`.
    Dir,
    /// One self-contained HTML file with the stylesheet and script inlined.
    Single,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProgressMode {
    /// Enable progress UI when stderr is a TTY.
    Auto,
    /// Always enable progress UI (even when piped).
    Always,
    /// Never show progress UI.
    Never,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Render a `test_report.json` into a new execution directory.
    Render(RenderArgs),
    /// Load a report, deliver content-ready, click headers and print section states.
    Toggle(ToggleArgs),
    /// Check header/panel pairing and that the report is fully offline.
    Check(CheckArgs),
}

#[derive(Debug, ClapArgs)]
pub struct RenderArgs {
    /// Results file written by a previous run (`test_report.json`).
    #[arg(long)]
    pub input: PathBuf,

    /// Base directory; an `execution_<timestamp>` folder is created inside it.
    #[arg(long, default_value = "reports")]
    pub out: PathBuf,

    /// Output mode: `dir` (HTML + report.css + report.js) or `single` (one HTML file).
    #[arg(long, value_enum, default_value = "dir")]
    pub mode: Mode,

    /// Progress display: `auto`, `always`, or `never`.
    #[arg(long, value_enum, default_value = "auto")]
    pub progress: ProgressMode,
}

#[derive(Debug, ClapArgs)]
pub struct ToggleArgs {
    /// Report HTML file.
    #[arg(long)]
    pub input: PathBuf,

    /// Header to click, 0-based in document order. Repeatable; applied in order.
    #[arg(long = "click")]
    pub clicks: Vec<usize>,

    /// Write the resulting HTML here.
    #[arg(long)]
    pub out: Option<PathBuf>,

    #[command(flatten)]
    pub selectors: SelectorArgs,
}

#[derive(Debug, ClapArgs)]
pub struct CheckArgs {
    /// Report HTML file.
    #[arg(long)]
    pub input: PathBuf,

    #[command(flatten)]
    pub selectors: SelectorArgs,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct SelectorArgs {
    /// Class marking clickable headers.
    #[arg(long, default_value = "test-header")]
    pub header_class: String,

    /// Class marking details panels.
    #[arg(long, default_value = "test-details")]
    pub panel_class: String,

    /// Class marking the chevron inside a header.
    #[arg(long, default_value = "fa-chevron-right")]
    pub indicator_class: String,

    /// Class that hides a collapsed panel.
    #[arg(long, default_value = "hidden")]
    pub hidden_class: String,
}

impl From<SelectorArgs> for Selectors {
    fn from(a: SelectorArgs) -> Self {
        Selectors {
            header_class: a.header_class,
            panel_class: a.panel_class,
            indicator_class: a.indicator_class,
            hidden_class: a.hidden_class,
        }
    }
}
