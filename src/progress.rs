use std::cell::Cell;
use std::time::{Duration, Instant};

use indicatif::{HumanDuration, MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};

pub struct Progress {
    enabled: bool,
    start: Instant,

    // UI
    mp: Option<MultiProgress>,
    stage: ProgressBar,
    modules: ProgressBar,

    // Counters
    results_done: Cell<u64>,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        let start = Instant::now();

        if !enabled {
            return Self {
                enabled: false,
                start,
                mp: None,
                stage: ProgressBar::hidden(),
                modules: ProgressBar::hidden(),
                results_done: Cell::new(0),
            };
        }

        let mp = MultiProgress::with_draw_target(ProgressDrawTarget::stderr());

        let stage = mp.add(ProgressBar::new_spinner());
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}  [{elapsed_precise}]") {
            stage.set_style(style);
        }
        stage.enable_steady_tick(Duration::from_millis(80));
        stage.set_message("starting");

        let modules = mp.add(ProgressBar::new(0));
        if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos}/{len} {msg}") {
            modules.set_style(style.progress_chars("##-"));
        }
        modules.set_message("modules");

        Self {
            enabled: true,
            start,
            mp: Some(mp),
            stage,
            modules,
            results_done: Cell::new(0),
        }
    }

    pub fn set_stage(&self, msg: impl Into<String>) {
        if !self.enabled {
            return;
        }
        self.stage.set_message(msg.into());
    }

    pub fn set_modules_total(&self, total: usize) {
        if self.enabled {
            self.modules.set_length(total as u64);
        }
    }

    /// Called once a module's results have all been recorded.
    pub fn module_done(&self, module: &str, results: usize) {
        self.results_done.set(self.results_done.get() + results as u64);
        if self.enabled {
            self.modules.inc(1);
            self.modules.set_message(format!("{module} ({results} tests)"));
        }
    }

    pub fn results_done(&self) -> u64 {
        self.results_done.get()
    }

    pub fn finish(&self) {
        if !self.enabled {
            return;
        }
        self.stage.finish_with_message("done");
        self.modules.finish_and_clear();
        if let Some(mp) = &self.mp {
            let _ = mp.println(format!(
                "Rendered {} results in {}",
                self.results_done(),
                HumanDuration(self.start.elapsed())
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_progress_still_counts() {
        let p = Progress::new(false);
        p.set_stage("ignored");
        p.set_modules_total(2);
        p.module_done("connectivity", 3);
        p.module_done("vlan", 2);
        p.finish();
        assert_eq!(p.results_done(), 5);
    }

    #[test]
    fn module_bar_advances_per_module() {
        let p = Progress::new(true);
        p.set_modules_total(2);
        p.module_done("vlan", 1);
        assert_eq!(p.modules.position(), 1);
        assert_eq!(p.results_done(), 1);
        p.module_done("connectivity", 4);
        assert_eq!(p.modules.position(), 2);
        assert_eq!(p.results_done(), 5);
        p.finish();
    }
}
