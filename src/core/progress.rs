use indicatif::{ProgressBar, ProgressState, ProgressStyle};

const BAR_TEMPLATE: &str = "Progress: |{bar:50}| {percent_1}% Complete";

/// Single-line, carriage-return updated bar for one folder's scan.
pub struct FolderProgress {
    bar: ProgressBar,
}

impl FolderProgress {
    pub fn new(total: usize, enabled: bool) -> Self {
        if !enabled {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total as u64);
        bar.set_style(bar_style());
        Self { bar }
    }

    /// Mark file `index` (1-based) of the folder as in progress.
    pub fn advance(&self, index: usize) {
        self.bar.set_position(index as u64);
    }

    /// Hide the bar while `f` prints, so log lines don't tear it.
    pub fn suspend<F: FnOnce() -> R, R>(&self, f: F) -> R {
        self.bar.suspend(f)
    }

    pub fn finish(self) {
        self.bar.finish();
    }

    #[cfg(test)]
    fn position(&self) -> u64 {
        self.bar.position()
    }
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .with_key(
            "percent_1",
            |state: &ProgressState, w: &mut dyn std::fmt::Write| {
                let _ = w.write_str(&percent_1(state.fraction()));
            },
        )
        .progress_chars("█-")
}

/// Completion percentage with one decimal: `1/3` -> `"33.3"`.
fn percent_1(fraction: f32) -> String {
    format!("{:.1}", fraction * 100.0)
}
